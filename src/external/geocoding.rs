// ABOUTME: Geocoding client resolving place names to coordinates
// ABOUTME: Implements the Nominatim search API behind the Geocoder trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Geocoding Client
//!
//! Prayer-time and qibla tools accept either raw coordinates or a place
//! name. Place names are resolved through a Nominatim-compatible search
//! endpoint. An unreachable geocoder is a step-level `UpstreamUnavailable`;
//! an unknown place is `NoDataFound`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::errors::{AppError, AppResult};

/// A resolved geographic position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

/// Place-name resolution contract
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form place name to coordinates
    ///
    /// Returns `NoDataFound` when the place cannot be located and
    /// `UpstreamUnavailable` when the backend cannot be reached.
    async fn geocode(&self, place: &str) -> AppResult<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Nominatim-compatible geocoding client
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    /// User agent required by the Nominatim usage policy
    const USER_AGENT: &'static str = "minaret-server/0.1";

    /// Create a client against the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, place: &str) -> AppResult<Coordinates> {
        let place = place.trim();
        if place.is_empty() {
            return Err(AppError::invalid_input("Location is required"));
        }

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .header("User-Agent", Self::USER_AGENT)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach geocoding API: {}", e);
                AppError::upstream("geocoding", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                "geocoding",
                format!("API error ({status})"),
            ));
        }

        let results: Vec<NominatimResult> = response.json().await.map_err(|e| {
            error!("Failed to parse geocoding response: {}", e);
            AppError::upstream("geocoding", format!("Failed to parse response: {e}"))
        })?;

        let hit = results
            .into_iter()
            .next()
            .ok_or_else(|| AppError::no_data(format!("Could not find location: {place}")))?;

        let latitude: f64 = hit
            .lat
            .parse()
            .map_err(|_| AppError::upstream("geocoding", "Malformed latitude in response"))?;
        let longitude: f64 = hit
            .lon
            .parse()
            .map_err(|_| AppError::upstream("geocoding", "Malformed longitude in response"))?;

        debug!("Resolved '{}' to ({}, {})", place, latitude, longitude);

        Ok(Coordinates {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_place_is_invalid_input() {
        let client = NominatimClient::new("http://127.0.0.1:1");
        let err = client.geocode("  ").await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_unavailable() {
        let client = NominatimClient::new("http://127.0.0.1:1");
        let err = client.geocode("Mecca").await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::UpstreamUnavailable);
    }
}

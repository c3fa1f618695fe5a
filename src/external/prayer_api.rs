// ABOUTME: Prayer timings client for daily prayer times by coordinates
// ABOUTME: Implements the Aladhan timings API behind the PrayerTimesApi trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Prayer Timings Client
//!
//! Fetches the five daily prayer times for a coordinate pair and date from
//! an Aladhan-compatible `/v1/timings/{date}` endpoint. Calculation methods
//! follow the Aladhan numbering (1-12, default 2 = ISNA).

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::geocoding::Coordinates;
use crate::errors::{AppError, AppResult};

/// Daily prayer times for one location and date
#[derive(Debug, Clone)]
pub struct PrayerTimes {
    /// Dawn prayer
    pub fajr: String,
    /// Noon prayer
    pub dhuhr: String,
    /// Afternoon prayer
    pub asr: String,
    /// Sunset prayer
    pub maghrib: String,
    /// Night prayer
    pub isha: String,
}

/// Prayer timings contract
#[async_trait]
pub trait PrayerTimesApi: Send + Sync {
    /// Fetch prayer times for coordinates on a date with a calculation method
    async fn timings(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        method: u8,
    ) -> AppResult<PrayerTimes>;
}

#[derive(Debug, Deserialize)]
struct AladhanResponse {
    data: AladhanData,
}

#[derive(Debug, Deserialize)]
struct AladhanData {
    timings: AladhanTimings,
}

#[derive(Debug, Deserialize)]
struct AladhanTimings {
    #[serde(rename = "Fajr")]
    fajr: String,
    #[serde(rename = "Dhuhr")]
    dhuhr: String,
    #[serde(rename = "Asr")]
    asr: String,
    #[serde(rename = "Maghrib")]
    maghrib: String,
    #[serde(rename = "Isha")]
    isha: String,
}

/// Aladhan-compatible prayer timings client
pub struct AladhanClient {
    client: Client,
    base_url: String,
}

impl AladhanClient {
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
impl PrayerTimesApi for AladhanClient {
    async fn timings(
        &self,
        coordinates: Coordinates,
        date: NaiveDate,
        method: u8,
    ) -> AppResult<PrayerTimes> {
        if !(1..=12).contains(&method) {
            return Err(AppError::invalid_input(format!(
                "Calculation method must be 1-12, got {method}"
            )));
        }

        let url = format!(
            "{}/v1/timings/{}",
            self.base_url.trim_end_matches('/'),
            date.format("%d-%m-%Y")
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("method", method.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach prayer timings API: {}", e);
                AppError::upstream("prayer timings", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                "prayer timings",
                format!("API error ({status})"),
            ));
        }

        let parsed: AladhanResponse = response.json().await.map_err(|e| {
            error!("Failed to parse prayer timings response: {}", e);
            AppError::upstream("prayer timings", format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Fetched timings for ({}, {}) on {}",
            coordinates.latitude, coordinates.longitude, date
        );

        let t = parsed.data.timings;
        Ok(PrayerTimes {
            fajr: t.fajr,
            dhuhr: t.dhuhr,
            asr: t.asr,
            maghrib: t.maghrib,
            isha: t.isha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_method_out_of_range_is_invalid_input() {
        let client = AladhanClient::new("http://127.0.0.1:1");
        let coords = Coordinates {
            latitude: 40.7,
            longitude: -74.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let err = client.timings(coords, date, 0).await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_unavailable() {
        let client = AladhanClient::new("http://127.0.0.1:1");
        let coords = Coordinates {
            latitude: 40.7,
            longitude: -74.0,
        };
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let err = client.timings(coords, date, 2).await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::UpstreamUnavailable);
    }
}

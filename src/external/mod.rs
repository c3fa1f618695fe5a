// ABOUTME: Outbound API clients consumed by the deterministic domain tools
// ABOUTME: Geocoding, prayer timings, and nearby-place lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! External API clients. Each client maps transport failures to
//! `UpstreamUnavailable` so the executor can isolate the step instead of
//! aborting the run.

pub mod geocoding;
pub mod places;
pub mod prayer_api;

pub use geocoding::{Coordinates, Geocoder, NominatimClient};
pub use places::{Place, PlaceCategory, PlacesClient, StaticPlacesDirectory};
pub use prayer_api::{AladhanClient, PrayerTimes, PrayerTimesApi};

// ABOUTME: Tool returning the five daily prayer times for a location and date
// ABOUTME: Resolves the location, then queries the prayer timings API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::external::{Geocoder, PrayerTimesApi};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

/// Daily prayer times for a location and date
pub struct PrayerTimesTool {
    geocoder: Arc<dyn Geocoder>,
    api: Arc<dyn PrayerTimesApi>,
}

impl PrayerTimesTool {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, api: Arc<dyn PrayerTimesApi>) -> Self {
        Self { geocoder, api }
    }
}

#[async_trait]
impl AgentTool for PrayerTimesTool {
    fn name(&self) -> &'static str {
        "get_prayer_times"
    }

    fn description(&self) -> &'static str {
        "Get the five daily prayer times (Fajr, Dhuhr, Asr, Maghrib, Isha) for a city or coordinates on a given date"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            vec![
                (
                    "location",
                    PropertySchema::string("City or place name; omitted means the user's saved location"),
                ),
                ("latitude", PropertySchema::number("Latitude in degrees")),
                ("longitude", PropertySchema::number("Longitude in degrees")),
                (
                    "date",
                    PropertySchema::string("Date as YYYY-MM-DD; omitted means today"),
                ),
                (
                    "method",
                    PropertySchema::integer("Calculation method 1-12; omitted uses the profile default"),
                ),
            ],
            vec![],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::NETWORK | ToolCapabilities::REQUIRES_LOCATION
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let (coordinates, place) =
            super::resolve_coordinates(&args, context, &self.geocoder).await?;

        let date = match args.get("date").and_then(Value::as_str) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::invalid_input(format!("Date must be YYYY-MM-DD, got '{raw}'"))
            })?,
            None => context.today,
        };

        let method = match args.get("method").and_then(Value::as_u64) {
            Some(m) => u8::try_from(m)
                .map_err(|_| AppError::invalid_input("Calculation method must be 1-12"))?,
            None => context.calculation_method(),
        };

        let times = self.api.timings(coordinates, date, method).await?;

        debug!("Prayer times for {} on {}", place, date);

        let summary = format!(
            "Prayer times for {place} on {date}: Fajr {}, Dhuhr {}, Asr {}, Maghrib {}, Isha {}",
            times.fajr, times.dhuhr, times.asr, times.maghrib, times.isha
        );

        Ok(ToolResult::new(
            json!({
                "location": place,
                "date": date.format("%Y-%m-%d").to_string(),
                "method": method,
                "timings": {
                    "fajr": times.fajr,
                    "dhuhr": times.dhuhr,
                    "asr": times.asr,
                    "maghrib": times.maghrib,
                    "isha": times.isha,
                },
            }),
            summary,
        ))
    }
}

// ABOUTME: Tool computing the qibla direction from a location toward the Kaaba
// ABOUTME: Great-circle initial bearing; only geocoding touches the network
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::AppResult;
use crate::external::{Coordinates, Geocoder};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

/// Kaaba coordinates in Mecca
const KAABA: Coordinates = Coordinates {
    latitude: 21.4225,
    longitude: 39.8262,
};

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Initial great-circle bearing from `from` toward the Kaaba, degrees 0..360
#[must_use]
pub fn qibla_bearing(from: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = KAABA.latitude.to_radians();
    let delta_lng = (KAABA.longitude - from.longitude).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// 16-wind compass point for a bearing
#[must_use]
pub fn compass_point(bearing: f64) -> &'static str {
    let index = ((bearing / 22.5) + 0.5).floor() as usize % 16;
    COMPASS_POINTS[index]
}

/// Qibla direction from a location
pub struct QiblaTool {
    geocoder: Arc<dyn Geocoder>,
}

impl QiblaTool {
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl AgentTool for QiblaTool {
    fn name(&self) -> &'static str {
        "get_qibla_direction"
    }

    fn description(&self) -> &'static str {
        "Get the qibla (direction of prayer toward the Kaaba in Mecca) as a compass bearing from a city or coordinates"
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
            ],
            vec![],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::DETERMINISTIC | ToolCapabilities::REQUIRES_LOCATION
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let (coordinates, place) =
            super::resolve_coordinates(&args, context, &self.geocoder).await?;

        let bearing = qibla_bearing(coordinates);
        let point = compass_point(bearing);

        let summary = format!("Qibla from {place}: {bearing:.1} degrees ({point})");

        Ok(ToolResult::new(
            json!({
                "location": place,
                "bearing_degrees": (bearing * 10.0).round() / 10.0,
                "compass_point": point,
            }),
            summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearing_from_new_york() {
        let bearing = qibla_bearing(Coordinates {
            latitude: 40.7128,
            longitude: -74.0060,
        });
        assert!((bearing - 58.5).abs() < 0.5, "got {bearing}");
    }

    #[test]
    fn test_bearing_from_jakarta() {
        let bearing = qibla_bearing(Coordinates {
            latitude: -6.2088,
            longitude: 106.8456,
        });
        assert!((bearing - 295.1).abs() < 1.0, "got {bearing}");
    }

    #[test]
    fn test_bearing_at_kaaba_is_finite() {
        let bearing = qibla_bearing(KAABA);
        assert!(bearing.is_finite());
        assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn test_compass_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(58.5), "ENE");
        assert_eq!(compass_point(359.9), "N");
        assert_eq!(compass_point(295.0), "WNW");
    }
}

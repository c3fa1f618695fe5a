// ABOUTME: Tool listing halal restaurants, mosques, and Islamic centers near a location
// ABOUTME: Delegates to the configured PlacesClient backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::external::{PlaceCategory, PlacesClient};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

const DEFAULT_RADIUS_KM: u32 = 10;

/// Nearby halal-relevant places
pub struct FindHalalPlacesTool {
    places: Arc<dyn PlacesClient>,
}

impl FindHalalPlacesTool {
    #[must_use]
    pub fn new(places: Arc<dyn PlacesClient>) -> Self {
        Self { places }
    }
}

#[async_trait]
impl AgentTool for FindHalalPlacesTool {
    fn name(&self) -> &'static str {
        "find_halal_places"
    }

    fn description(&self) -> &'static str {
        "Find halal restaurants, mosques, or Islamic centers near a location"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            vec![
                (
                    "location",
                    PropertySchema::string("City or place name; omitted means the user's saved location"),
                ),
                (
                    "category",
                    PropertySchema::string(
                        "'restaurant', 'mosque', 'islamic_center', or 'all' (default)",
                    ),
                ),
                (
                    "radius_km",
                    PropertySchema::integer("Search radius in kilometers, default 10"),
                ),
            ],
            vec![],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::NETWORK | ToolCapabilities::REQUIRES_LOCATION
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let location = args
            .get("location")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| context.default_location())
            .ok_or_else(|| {
                AppError::invalid_input(
                    "A location is required: pass one or set it in your profile",
                )
            })?;

        let category = match args.get("category").and_then(Value::as_str) {
            Some(raw) => PlaceCategory::parse(raw).ok_or_else(|| {
                AppError::invalid_input(format!(
                    "Category must be restaurant, mosque, islamic_center, or all; got '{raw}'"
                ))
            })?,
            None => PlaceCategory::All,
        };

        let radius_km = args
            .get("radius_km")
            .and_then(Value::as_u64)
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or(DEFAULT_RADIUS_KM);

        let places = self.places.find_nearby(location, category, radius_km).await?;

        if places.is_empty() {
            return Err(AppError::no_data(format!(
                "No {} found near {location}",
                category.as_str()
            )));
        }

        let summary = format!(
            "Found {} place(s) near {location}: {}",
            places.len(),
            places
                .iter()
                .take(3)
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        );

        Ok(ToolResult::new(
            json!({
                "location": location,
                "category": category.as_str(),
                "radius_km": radius_km,
                "places": places
                    .iter()
                    .map(|p| json!({"name": p.name, "category": p.category.as_str()}))
                    .collect::<Vec<_>>(),
            }),
            summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::StaticPlacesDirectory;
    use chrono::NaiveDate;

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(
            crate::database::profiles::UserProfileSnapshot {
                user_id: "user-1".to_owned(),
                location: Some("Dearborn".to_owned()),
                timezone: None,
                madhab: None,
                calculation_method: None,
                language: None,
            },
            None,
            None,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_defaults_to_profile_location_and_all_categories() {
        let tool = FindHalalPlacesTool::new(Arc::new(StaticPlacesDirectory));
        let result = tool.execute(json!({}), &context()).await.unwrap();
        assert_eq!(result.content["location"], "Dearborn");
        assert_eq!(result.content["places"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_category_is_invalid_input() {
        let tool = FindHalalPlacesTool::new(Arc::new(StaticPlacesDirectory));
        let err = tool
            .execute(json!({"category": "cinema"}), &context())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }
}

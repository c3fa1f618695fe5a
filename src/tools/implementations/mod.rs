// ABOUTME: Built-in tool implementations available to the planner
// ABOUTME: Includes the registry factory and shared location resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Built-in Tools
//!
//! The six tools the planner can invoke: prayer times, qibla direction,
//! Hijri date conversion, halal place lookup, knowledge search, and
//! madhab-aware guidance. `build_registry` wires them against their
//! dependencies at startup.

pub mod guidance;
pub mod hijri_date;
pub mod knowledge;
pub mod places;
pub mod prayer_times;
pub mod qibla;

use std::sync::Arc;

use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::external::{Coordinates, Geocoder, PlacesClient, PrayerTimesApi};
use crate::llm::LlmProvider;
use crate::retriever::KnowledgeRetriever;

use super::context::ToolExecutionContext;
use super::registry::ToolRegistry;

pub use guidance::IslamicGuidanceTool;
pub use hijri_date::HijriDateTool;
pub use knowledge::KnowledgeSearchTool;
pub use places::FindHalalPlacesTool;
pub use prayer_times::PrayerTimesTool;
pub use qibla::QiblaTool;

/// Build the registry with all built-in tools wired to their dependencies
#[must_use]
pub fn build_registry(
    geocoder: Arc<dyn Geocoder>,
    prayer_api: Arc<dyn PrayerTimesApi>,
    places: Arc<dyn PlacesClient>,
    retriever: Arc<KnowledgeRetriever>,
    llm: Arc<dyn LlmProvider>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(PrayerTimesTool::new(
        Arc::clone(&geocoder),
        prayer_api,
    )));
    registry.register(Arc::new(QiblaTool::new(Arc::clone(&geocoder))));
    registry.register(Arc::new(HijriDateTool));
    registry.register(Arc::new(FindHalalPlacesTool::new(places)));
    registry.register(Arc::new(KnowledgeSearchTool::new(Arc::clone(&retriever))));
    registry.register(Arc::new(IslamicGuidanceTool::new(retriever, llm)));
    registry
}

/// Resolve a coordinate pair for a location-aware tool.
///
/// Resolution order: explicit `latitude`/`longitude` arguments, then a
/// `location` argument geocoded, then the request/profile default location
/// geocoded. No location anywhere is `InvalidInput` so the step fails with
/// a clear message instead of guessing.
pub(super) async fn resolve_coordinates(
    args: &Value,
    context: &ToolExecutionContext,
    geocoder: &Arc<dyn Geocoder>,
) -> AppResult<(Coordinates, String)> {
    if let (Some(latitude), Some(longitude)) = (
        args.get("latitude").and_then(Value::as_f64),
        args.get("longitude").and_then(Value::as_f64),
    ) {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid_input(
                "Coordinates out of range: latitude must be -90..90, longitude -180..180",
            ));
        }
        return Ok((
            Coordinates {
                latitude,
                longitude,
            },
            format!("{latitude:.4}, {longitude:.4}"),
        ));
    }

    let place = args
        .get("location")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| context.default_location());

    let Some(place) = place else {
        return Err(AppError::invalid_input(
            "A location is required: pass one or set it in your profile",
        ));
    };

    let coordinates = geocoder.geocode(place).await?;
    Ok((coordinates, place.to_owned()))
}

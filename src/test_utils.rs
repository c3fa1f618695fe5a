// ABOUTME: Shared test doubles: scripted LLM, fixed embedder, mock index and clients
// ABOUTME: Used by unit tests and the integration suite; not part of the public API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Test Utilities
//!
//! Deterministic stand-ins for every external collaborator. Panics are
//! acceptable here: these types only run under test.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::external::{
    Coordinates, Geocoder, PrayerTimes, PrayerTimesApi, StaticPlacesDirectory,
};
use crate::llm::{
    CompletionRequest, CompletionResponse, Embedder, LlmProvider,
};
use crate::retriever::{KnowledgeChunk, KnowledgeRetriever, ScoredChunk, VectorIndex};
use crate::tools::{build_registry, ToolRegistry};

// ============================================================================
// LLM
// ============================================================================

enum MockMode {
    Scripted(Mutex<VecDeque<String>>),
    Repeating(String),
    Failing,
}

/// Scripted LLM provider returning canned responses
pub struct MockLlmProvider {
    mode: MockMode,
}

impl MockLlmProvider {
    /// Provider that returns the given responses, one per call
    #[must_use]
    pub fn scripted(responses: Vec<&str>) -> Self {
        Self {
            mode: MockMode::Scripted(Mutex::new(
                responses.into_iter().map(str::to_owned).collect(),
            )),
        }
    }

    /// Provider that returns the same response for every call
    #[must_use]
    pub fn repeating(response: &str) -> Self {
        Self {
            mode: MockMode::Repeating(response.to_owned()),
        }
    }

    /// Provider whose every call fails as `UpstreamUnavailable`
    #[must_use]
    pub fn failing() -> Self {
        Self {
            mode: MockMode::Failing,
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock Provider"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: &CompletionRequest) -> AppResult<CompletionResponse> {
        let content = match &self.mode {
            MockMode::Failing => {
                return Err(AppError::upstream("llm provider", "scripted failure"));
            }
            MockMode::Repeating(response) => response.clone(),
            MockMode::Scripted(responses) => responses
                .lock()
                .expect("mock lock poisoned")
                .pop_front()
                .expect("mock LLM called more times than scripted"),
        };

        Ok(CompletionResponse {
            content,
            model: "mock-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}

// ============================================================================
// Retrieval
// ============================================================================

/// Embedder returning the same small vector for every input
#[derive(Default)]
pub struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::invalid_input("Text to embed must not be empty"));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// Vector index returning a fixed match list for every query
pub struct ScriptedIndex {
    matches: Vec<ScoredChunk>,
}

impl ScriptedIndex {
    /// Index returning these matches for every query
    #[must_use]
    pub fn with_matches(matches: Vec<ScoredChunk>) -> Self {
        Self { matches }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _namespace: &str,
    ) -> AppResult<Vec<ScoredChunk>> {
        Ok(self.matches.clone())
    }
}

/// Vector index whose every query fails as `UpstreamUnavailable`
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _namespace: &str,
    ) -> AppResult<Vec<ScoredChunk>> {
        Err(AppError::upstream("vector index", "scripted failure"))
    }
}

// ============================================================================
// External clients
// ============================================================================

/// Geocoder resolving every place to one fixed coordinate pair
pub struct NoopGeocoder {
    coordinates: Coordinates,
}

impl NoopGeocoder {
    /// Geocoder that always resolves to the given coordinates
    #[must_use]
    pub const fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, place: &str) -> AppResult<Coordinates> {
        if place.trim().is_empty() {
            return Err(AppError::invalid_input("Location is required"));
        }
        Ok(self.coordinates)
    }
}

/// Geocoder whose every call fails as `UpstreamUnavailable`
pub struct FailingGeocoder;

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn geocode(&self, _place: &str) -> AppResult<Coordinates> {
        Err(AppError::upstream("geocoding", "connection refused"))
    }
}

/// Prayer timings API returning the same fixed times for every call
#[derive(Default)]
pub struct FixedPrayerTimesApi;

#[async_trait]
impl PrayerTimesApi for FixedPrayerTimesApi {
    async fn timings(
        &self,
        _coordinates: Coordinates,
        _date: NaiveDate,
        method: u8,
    ) -> AppResult<PrayerTimes> {
        if !(1..=12).contains(&method) {
            return Err(AppError::invalid_input("Calculation method must be 1-12"));
        }
        Ok(PrayerTimes {
            fajr: "04:12".to_owned(),
            dhuhr: "12:58".to_owned(),
            asr: "16:45".to_owned(),
            maghrib: "20:21".to_owned(),
            isha: "21:53".to_owned(),
        })
    }
}

// ============================================================================
// Assembled fixtures
// ============================================================================

/// Retriever over the fixed embedder and a scripted index
#[must_use]
pub fn test_retriever(matches: Vec<ScoredChunk>) -> Arc<KnowledgeRetriever> {
    Arc::new(KnowledgeRetriever::new(
        Arc::new(FixedEmbedder),
        Arc::new(ScriptedIndex::with_matches(matches)),
        "sahih_bukhari",
    ))
}

/// One plausible knowledge match for retrieval-backed tests
#[must_use]
pub fn sample_chunk() -> ScoredChunk {
    ScoredChunk {
        chunk: KnowledgeChunk {
            id: "bukhari-8".to_owned(),
            text: "Islam is built upon five pillars.".to_owned(),
            source: "Sahih Bukhari".to_owned(),
            reference: Some("Book 2, Hadith 8".to_owned()),
        },
        score: 0.92,
    }
}

/// Full registry wired to deterministic mocks
#[must_use]
pub fn build_test_registry() -> ToolRegistry {
    build_registry(
        Arc::new(NoopGeocoder::at(40.7128, -74.0060)),
        Arc::new(FixedPrayerTimesApi),
        Arc::new(StaticPlacesDirectory),
        test_retriever(vec![sample_chunk()]),
        Arc::new(MockLlmProvider::repeating(
            "Fasting while traveling may be deferred; consult local scholars.",
        )),
    )
}

/// Registry whose location-dependent tools fail with `UpstreamUnavailable`
#[must_use]
pub fn build_registry_with_failing_geocoder() -> ToolRegistry {
    build_registry(
        Arc::new(FailingGeocoder),
        Arc::new(FixedPrayerTimesApi),
        Arc::new(StaticPlacesDirectory),
        test_retriever(vec![sample_chunk()]),
        Arc::new(MockLlmProvider::repeating(
            "Fasting while traveling may be deferred; consult local scholars.",
        )),
    )
}

/// Fresh in-memory database with migrations applied
///
/// # Panics
///
/// Panics when the in-memory database cannot be created.
pub async fn test_database() -> Database {
    Database::new("sqlite::memory:")
        .await
        .expect("in-memory database")
}

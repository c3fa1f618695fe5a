// ABOUTME: Text embedding client for semantic knowledge retrieval
// ABOUTME: Implements the Gemini embedContent REST API behind the Embedder trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Embedding Client
//!
//! The knowledge retriever embeds each query before searching the vector
//! index. Embedding is consumed as an opaque external call; the `Embedder`
//! trait exists so tests can supply deterministic vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RetrievalConfig;
use crate::errors::{AppError, AppResult};

/// Text embedding contract
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one text into a dense vector
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

// ============================================================================
// Gemini embedContent API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Debug, Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

// ============================================================================
// Gemini Implementation
// ============================================================================

/// Base URL for the Gemini generative language API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini embedding client using the `embedContent` endpoint
pub struct GeminiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiEmbedder {
    /// Create an embedder from retrieval configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the API key is empty.
    pub fn new(config: &RetrievalConfig) -> AppResult<Self> {
        if config.embed_api_key.is_empty() {
            return Err(AppError::config(
                "Missing GEMINI_API_KEY environment variable",
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.embed_api_key.clone(),
            model: config.embed_model.clone(),
            base_url: API_BASE_URL.to_owned(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::invalid_input("Cannot embed empty text"));
        }

        let url = format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_owned(),
                }],
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach Gemini embedding API: {}", e);
                AppError::upstream("Gemini", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "Gemini",
                format!(
                    "Embedding API error ({status}): {}",
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini embedding response: {}", e);
            AppError::upstream("Gemini", format!("Failed to parse response: {e}"))
        })?;

        debug!(
            "Embedded {} chars into a {}-dimensional vector",
            text.len(),
            parsed.embedding.values.len()
        );

        Ok(parsed.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(key: &str) -> RetrievalConfig {
        RetrievalConfig {
            embed_api_key: key.to_owned(),
            embed_model: "text-embedding-004".to_owned(),
            index_host: String::new(),
            index_api_key: String::new(),
            namespace: "sahih_bukhari".to_owned(),
        }
    }

    #[test]
    fn test_missing_key_fails() {
        assert!(GeminiEmbedder::new(&test_config("")).is_err());
    }

    #[tokio::test]
    async fn test_empty_text_is_invalid_input() {
        let embedder = GeminiEmbedder::new(&test_config("test-key"))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = embedder.embed("   ").await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }
}

// ABOUTME: Vector index client for similarity search over stored embeddings
// ABOUTME: Implements the Pinecone query REST API behind the VectorIndex trait

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use super::{KnowledgeChunk, ScoredChunk};
use crate::errors::{AppError, AppResult};

/// Similarity search contract over an embedding index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest chunks to `vector` within `namespace`
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> AppResult<Vec<ScoredChunk>>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Debug, Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    reference: Option<String>,
}

/// Pinecone-compatible vector index client
///
/// Queries `POST {index_host}/query` with the serverless index wire format.
#[derive(Debug)]
pub struct PineconeIndex {
    client: Client,
    index_host: String,
    api_key: String,
}

impl PineconeIndex {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Create a client for one index host
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the API key is empty.
    pub fn new(index_host: impl Into<String>, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AppError::config("Vector index API key is not set"));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Self::REQUEST_TIMEOUT)
                .build()
                .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?,
            index_host: index_host.into(),
            api_key,
        })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> AppResult<Vec<ScoredChunk>> {
        let url = format!("{}/query", self.index_host.trim_end_matches('/'));

        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "namespace": namespace,
        });

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach vector index: {}", e);
                AppError::upstream("vector index", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::upstream(
                "vector index",
                format!("Query failed ({status})"),
            ));
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| {
            error!("Failed to parse vector index response: {}", e);
            AppError::upstream("vector index", format!("Failed to parse response: {e}"))
        })?;

        debug!("Index returned {} matches", parsed.matches.len());

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m.metadata.unwrap_or(MatchMetadata {
                    text: String::new(),
                    source: String::new(),
                    reference: None,
                });
                ScoredChunk {
                    chunk: KnowledgeChunk {
                        id: m.id,
                        text: metadata.text,
                        source: metadata.source,
                        reference: metadata.reference,
                    },
                    score: m.score,
                }
            })
            .collect())
    }
}

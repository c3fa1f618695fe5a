// ABOUTME: Semantic knowledge retrieval over the hadith/Quran embedding index
// ABOUTME: Combines a query embedder with a Pinecone-style vector index client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Knowledge Retriever
//!
//! `search(query, top_k, filter)` embeds the query, queries the vector
//! index, and returns chunks ranked by similarity score descending, at most
//! `top_k` of them, possibly none. An unreachable embedding or index
//! backend surfaces as `UpstreamUnavailable` and is absorbed by the
//! executor as a step-level failure.

mod index;

pub use index::{PineconeIndex, VectorIndex};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::AppResult;
use crate::llm::Embedder;

/// A passage from the knowledge corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Stable identifier of the chunk within the index
    pub id: String,
    /// Source passage text
    pub text: String,
    /// Human-readable source name (collection, book)
    pub source: String,
    /// Reference within the source (e.g., hadith number), when known
    pub reference: Option<String>,
}

/// A chunk together with its per-query similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved passage
    pub chunk: KnowledgeChunk,
    /// Cosine similarity against the query embedding
    pub score: f32,
}

/// Optional filter narrowing a search to one source collection
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Restrict results to this source name
    pub source: Option<String>,
}

/// Semantic search over the knowledge corpus
pub struct KnowledgeRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
}

impl KnowledgeRetriever {
    /// Create a retriever from an embedder and a vector index
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            namespace: namespace.into(),
        }
    }

    /// Search the corpus for passages relevant to `query`
    ///
    /// Results are sorted by score descending and truncated to `top_k`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty query and `UpstreamUnavailable`
    /// when the embedding or index backend cannot be reached.
    #[instrument(skip(self), fields(top_k))]
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> AppResult<Vec<ScoredChunk>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(crate::errors::AppError::invalid_input(
                "Search query is required",
            ));
        }

        let vector = self.embedder.embed(query).await?;
        let mut matches = self
            .index
            .query(&vector, top_k, &self.namespace)
            .await?;

        if let Some(source) = &filter.source {
            matches.retain(|m| m.chunk.source.eq_ignore_ascii_case(source));
        }

        // Index backends generally return ranked results already; enforce
        // the ordering contract regardless.
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);

        debug!("Retrieved {} chunks for query", matches.len());

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FixedEmbedder, ScriptedIndex};

    fn chunk(id: &str, source: &str) -> KnowledgeChunk {
        KnowledgeChunk {
            id: id.to_owned(),
            text: format!("passage {id}"),
            source: source.to_owned(),
            reference: None,
        }
    }

    #[tokio::test]
    async fn test_results_sorted_and_truncated() {
        let index = ScriptedIndex::with_matches(vec![
            ScoredChunk {
                chunk: chunk("a", "Sahih Bukhari"),
                score: 0.41,
            },
            ScoredChunk {
                chunk: chunk("b", "Sahih Bukhari"),
                score: 0.93,
            },
            ScoredChunk {
                chunk: chunk("c", "Sahih Bukhari"),
                score: 0.72,
            },
        ]);
        let retriever = KnowledgeRetriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(index),
            "sahih_bukhari",
        );

        let results = retriever
            .search("fasting", 2, &SearchFilter::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "b");
        assert_eq!(results[1].chunk.id, "c");
    }

    #[tokio::test]
    async fn test_source_filter() {
        let index = ScriptedIndex::with_matches(vec![
            ScoredChunk {
                chunk: chunk("a", "Sahih Bukhari"),
                score: 0.9,
            },
            ScoredChunk {
                chunk: chunk("b", "Sahih Muslim"),
                score: 0.8,
            },
        ]);
        let retriever = KnowledgeRetriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(index),
            "sahih_bukhari",
        );

        let filter = SearchFilter {
            source: Some("sahih muslim".to_owned()),
        };
        let results = retriever.search("charity", 5, &filter).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "b");
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid_input() {
        let retriever = KnowledgeRetriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(ScriptedIndex::with_matches(vec![])),
            "sahih_bukhari",
        );
        let err = retriever
            .search("  ", 3, &SearchFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_empty_result_is_ok() {
        let retriever = KnowledgeRetriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(ScriptedIndex::with_matches(vec![])),
            "sahih_bukhari",
        );
        let results = retriever
            .search("obscure topic", 3, &SearchFilter::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}

// ABOUTME: Tool searching the hadith/Quran knowledge corpus by semantic similarity
// ABOUTME: Thin adapter over KnowledgeRetriever with planner-friendly arguments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::retriever::{KnowledgeRetriever, SearchFilter};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 20;

/// Semantic search over the knowledge corpus
pub struct KnowledgeSearchTool {
    retriever: Arc<KnowledgeRetriever>,
}

impl KnowledgeSearchTool {
    #[must_use]
    pub fn new(retriever: Arc<KnowledgeRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl AgentTool for KnowledgeSearchTool {
    fn name(&self) -> &'static str {
        "search_islamic_knowledge"
    }

    fn description(&self) -> &'static str {
        "Search authentic Islamic sources (hadith collections) for passages relevant to a question"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            vec![
                ("query", PropertySchema::string("The question or topic to search for")),
                (
                    "top_k",
                    PropertySchema::integer("Number of passages to return, default 5, max 20"),
                ),
                (
                    "source",
                    PropertySchema::string("Restrict to one source collection by name"),
                ),
            ],
            vec!["query"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::NETWORK | ToolCapabilities::RETRIEVAL
    }

    async fn execute(&self, args: Value, _context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::invalid_input("A search query is required"))?;

        let top_k = args
            .get("top_k")
            .and_then(Value::as_u64)
            .map_or(DEFAULT_TOP_K, |k| (k as usize).clamp(1, MAX_TOP_K));

        let filter = SearchFilter {
            source: args
                .get("source")
                .and_then(Value::as_str)
                .map(str::to_owned),
        };

        let results = self.retriever.search(query, top_k, &filter).await?;

        let summary = if results.is_empty() {
            "No relevant passages found".to_owned()
        } else {
            format!(
                "Found {} passage(s), best match from {}",
                results.len(),
                results[0].chunk.source
            )
        };

        Ok(ToolResult::new(
            json!({
                "query": query,
                "results": results
                    .iter()
                    .map(|r| json!({
                        "text": r.chunk.text,
                        "source": r.chunk.source,
                        "reference": r.chunk.reference,
                        "score": r.score,
                    }))
                    .collect::<Vec<_>>(),
            }),
            summary,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::{KnowledgeChunk, ScoredChunk};
    use crate::test_utils::{FixedEmbedder, ScriptedIndex};
    use chrono::NaiveDate;

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(
            crate::database::profiles::UserProfileSnapshot {
                user_id: "user-1".to_owned(),
                location: None,
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

    fn tool_with_matches(matches: Vec<ScoredChunk>) -> KnowledgeSearchTool {
        KnowledgeSearchTool::new(Arc::new(KnowledgeRetriever::new(
            Arc::new(FixedEmbedder::default()),
            Arc::new(ScriptedIndex::with_matches(matches)),
            "sahih_bukhari",
        )))
    }

    #[tokio::test]
    async fn test_missing_query_is_invalid_input() {
        let tool = tool_with_matches(vec![]);
        let err = tool.execute(json!({}), &context()).await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_empty_results_are_a_successful_call() {
        let tool = tool_with_matches(vec![]);
        let result = tool
            .execute(json!({"query": "fasting"}), &context())
            .await
            .unwrap();
        assert!(result.content["results"].as_array().unwrap().is_empty());
        assert_eq!(result.summary, "No relevant passages found");
    }

    #[tokio::test]
    async fn test_results_carry_source_and_score() {
        let tool = tool_with_matches(vec![ScoredChunk {
            chunk: KnowledgeChunk {
                id: "c1".to_owned(),
                text: "Fasting is prescribed".to_owned(),
                source: "Sahih Bukhari".to_owned(),
                reference: Some("Book 30".to_owned()),
            },
            score: 0.91,
        }]);
        let result = tool
            .execute(json!({"query": "fasting"}), &context())
            .await
            .unwrap();
        let results = result.content["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["source"], "Sahih Bukhari");
    }
}

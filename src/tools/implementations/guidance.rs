// ABOUTME: Tool producing madhab-aware guidance on religious matters and practices
// ABOUTME: Composes a knowledge search with a guidance-focused model call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::retriever::{KnowledgeRetriever, SearchFilter};
use crate::tools::context::ToolExecutionContext;
use crate::tools::result::ToolResult;
use crate::tools::schema::{JsonSchema, PropertySchema};
use crate::tools::traits::{AgentTool, ToolCapabilities};

const GUIDANCE_TEMPERATURE: f32 = 0.2;
const GUIDANCE_MAX_TOKENS: u32 = 500;
const GUIDANCE_TOP_K: usize = 3;

/// Madhab-aware guidance over the knowledge corpus and the model
///
/// Searches the corpus for passages on the topic, then asks the model for
/// guidance grounded in what was found. The madhab preference comes from
/// the arguments, falling back to the user's profile.
pub struct IslamicGuidanceTool {
    retriever: Arc<KnowledgeRetriever>,
    llm: Arc<dyn LlmProvider>,
}

impl IslamicGuidanceTool {
    #[must_use]
    pub fn new(retriever: Arc<KnowledgeRetriever>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { retriever, llm }
    }
}

#[async_trait]
impl AgentTool for IslamicGuidanceTool {
    fn name(&self) -> &'static str {
        "get_islamic_guidance"
    }

    fn description(&self) -> &'static str {
        "Get specific Islamic guidance on religious matters, ethics, and practices"
    }

    fn input_schema(&self) -> JsonSchema {
        JsonSchema::object(
            vec![
                (
                    "topic",
                    PropertySchema::string(
                        "Topic for guidance (prayer, fasting, marriage, business, etc.)",
                    ),
                ),
                (
                    "situation",
                    PropertySchema::string("Specific situation or context"),
                ),
                (
                    "madhab",
                    PropertySchema::string(
                        "School of thought preference, defaults to the profile or 'general'",
                    ),
                ),
            ],
            vec!["topic"],
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::NETWORK | ToolCapabilities::RETRIEVAL
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult> {
        let topic = args
            .get("topic")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::invalid_input("A guidance topic is required"))?;

        let situation = args
            .get("situation")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();

        let madhab = args
            .get("madhab")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or(context.profile.madhab.as_deref())
            .unwrap_or("general");

        let query = format!("{topic} {situation} Islamic ruling guidance {madhab}");
        let passages = self
            .retriever
            .search(&query, GUIDANCE_TOP_K, &SearchFilter::default())
            .await?;

        let sources_block = if passages.is_empty() {
            "(no passages found)".to_owned()
        } else {
            passages
                .iter()
                .map(|p| {
                    format!(
                        "- {} ({}{})",
                        p.chunk.text,
                        p.chunk.source,
                        p.chunk
                            .reference
                            .as_deref()
                            .map(|r| format!(", {r}"))
                            .unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let prompt = format!(
            r"Provide Islamic guidance on the following:

Topic: {topic}
Situation: {situation}
Madhab preference: {madhab}

Relevant Islamic sources found:
{sources_block}

Please provide clear, authentic Islamic guidance that:
1. Addresses the specific situation
2. Cites relevant Quran verses or authentic hadith
3. Considers different scholarly opinions if applicable
4. Provides practical advice
5. Maintains compassionate tone

Keep response concise but comprehensive."
        );

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(GUIDANCE_TEMPERATURE)
            .with_max_tokens(GUIDANCE_MAX_TOKENS);

        let guidance = self.llm.complete(&request).await?.content.trim().to_owned();
        if guidance.is_empty() {
            return Err(AppError::upstream(
                "llm provider",
                "Guidance call produced an empty response",
            ));
        }

        Ok(ToolResult::new(
            json!({
                "topic": topic,
                "madhab": madhab,
                "guidance": guidance,
                "sources": passages
                    .iter()
                    .map(|p| json!({
                        "source": p.chunk.source,
                        "reference": p.chunk.reference,
                    }))
                    .collect::<Vec<_>>(),
            }),
            format!("Guidance on {topic} ({madhab})"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_chunk, test_retriever, MockLlmProvider};
    use chrono::NaiveDate;

    fn context_with_madhab(madhab: Option<&str>) -> ToolExecutionContext {
        ToolExecutionContext::new(
            crate::database::profiles::UserProfileSnapshot {
                user_id: "user-1".to_owned(),
                location: None,
                timezone: None,
                madhab: madhab.map(str::to_owned),
                calculation_method: None,
                language: None,
            },
            None,
            None,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    fn tool(llm: MockLlmProvider) -> IslamicGuidanceTool {
        IslamicGuidanceTool::new(test_retriever(vec![sample_chunk()]), Arc::new(llm))
    }

    #[tokio::test]
    async fn test_missing_topic_is_invalid_input() {
        let tool = tool(MockLlmProvider::repeating("guidance"));
        let err = tool
            .execute(json!({}), &context_with_madhab(None))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_guidance_carries_sources_and_text() {
        let tool = tool(MockLlmProvider::repeating(
            "Fasting in Ramadan is obligatory for every able adult Muslim.",
        ));
        let result = tool
            .execute(
                json!({"topic": "fasting", "situation": "traveling"}),
                &context_with_madhab(None),
            )
            .await
            .unwrap();
        assert!(result.content["guidance"]
            .as_str()
            .unwrap()
            .contains("obligatory"));
        assert_eq!(result.content["madhab"], "general");
        assert_eq!(
            result.content["sources"][0]["source"],
            "Sahih Bukhari"
        );
    }

    #[tokio::test]
    async fn test_profile_madhab_is_the_fallback() {
        let tool = tool(MockLlmProvider::repeating("guidance text"));
        let result = tool
            .execute(
                json!({"topic": "prayer"}),
                &context_with_madhab(Some("hanafi")),
            )
            .await
            .unwrap();
        assert_eq!(result.content["madhab"], "hanafi");
        assert_eq!(result.summary, "Guidance on prayer (hanafi)");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates_as_upstream() {
        let tool = tool(MockLlmProvider::failing());
        let err = tool
            .execute(json!({"topic": "zakat"}), &context_with_madhab(None))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::UpstreamUnavailable);
    }
}

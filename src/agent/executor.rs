// ABOUTME: Runs execution plans step by step with fail-soft isolation and timeouts
// ABOUTME: Synthesizes the final answer, falling back to a templated enumeration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Executor
//!
//! Walks the plan top to bottom, issuing each step exactly once. Step
//! failures with recoverable codes (`InvalidInput`, `NoDataFound`,
//! `UpstreamUnavailable`) are recorded and skipped, never aborting the
//! run. Each tool invocation carries a timeout; overrunning it counts as
//! `UpstreamUnavailable`.
//!
//! After the steps, a second model call synthesizes the answer from the
//! successful results. If that call fails, a deterministic template
//! enumerates whatever was obtained, so the user always receives an
//! answer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::tools::{ToolExecutionContext, ToolRegistry};

use super::plan::{ExecutionPlan, PlanStep, StepRecord};

const SYNTHESIS_TEMPERATURE: f32 = 0.2;
const SYNTHESIS_MAX_TOKENS: u32 = 1024;
const STEP_RESULT_PREVIEW_CHARS: usize = 200;

/// Result of running one plan to completion
#[derive(Debug)]
pub struct ExecutionOutcome {
    /// Final prose answer, always present
    pub response: String,
    /// Per-step outcomes, in plan order
    pub steps: Vec<StepRecord>,
    /// Distinct tool names that were invoked, sorted
    pub tools_used: Vec<String>,
    /// Whether every step and the synthesis succeeded
    pub success: bool,
    /// Summary of what failed, when `success` is false
    pub error_summary: Option<String>,
}

/// Runs plans against the tool registry and synthesizes answers
pub struct Executor {
    llm: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    tool_timeout: Duration,
}

impl Executor {
    /// Create an executor with a per-step tool timeout
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            registry,
            tool_timeout,
        }
    }

    /// Execute the plan and produce the final response
    #[instrument(skip_all, fields(intent = %plan.intent, steps = plan.steps.len()))]
    pub async fn execute(
        &self,
        message: &str,
        plan: &ExecutionPlan,
        context: &ToolExecutionContext,
    ) -> ExecutionOutcome {
        // Canned plans bypass both step execution and synthesis.
        if let Some(canned) = &plan.canned_response {
            return ExecutionOutcome {
                response: canned.clone(),
                steps: Vec::new(),
                tools_used: Vec::new(),
                success: true,
                error_summary: None,
            };
        }

        let mut steps = Vec::new();
        let mut tools_used = BTreeSet::new();
        let mut failures = Vec::new();

        for (index, step) in plan.steps.iter().enumerate() {
            let PlanStep::UseTool {
                tool,
                reasoning,
                parameters,
            } = step
            else {
                continue;
            };

            let record = self
                .run_step(index + 1, tool, reasoning, parameters.clone(), context)
                .await;

            // Every invoked tool counts, failed or not; the per-step ok
            // flag carries the outcome.
            tools_used.insert(tool.clone());
            if !record.ok {
                failures.push(format!("{tool}: {}", record.result));
            }
            steps.push(record);
        }

        let evidence: Vec<&StepRecord> = steps.iter().filter(|s| s.ok).collect();

        let (response, synthesis_ok) = match self.synthesize(message, &evidence).await {
            Ok(text) => (text, true),
            Err(e) => {
                warn!("Synthesis failed, using templated response: {}", e);
                failures.push(format!("synthesis: {e}"));
                (templated_response(&evidence), false)
            }
        };

        let success = failures.is_empty() && synthesis_ok;

        ExecutionOutcome {
            response,
            steps,
            tools_used: tools_used.into_iter().collect(),
            success,
            error_summary: if failures.is_empty() {
                None
            } else {
                Some(failures.join("; "))
            },
        }
    }

    async fn run_step(
        &self,
        step: usize,
        tool: &str,
        reasoning: &str,
        parameters: serde_json::Value,
        context: &ToolExecutionContext,
    ) -> StepRecord {
        let started = Instant::now();

        let outcome = tokio::time::timeout(
            self.tool_timeout,
            self.registry.execute(tool, parameters.clone(), context),
        )
        .await;

        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

        match outcome {
            Ok(Ok(result)) => {
                debug!("Step {} ({}) succeeded in {}ms", step, tool, duration_ms);
                StepRecord {
                    step,
                    tool: tool.to_owned(),
                    parameters,
                    reasoning: reasoning.to_owned(),
                    ok: true,
                    result: truncate(&result.summary, STEP_RESULT_PREVIEW_CHARS),
                    output: Some(result.content),
                    duration_ms,
                }
            }
            Ok(Err(e)) => {
                warn!("Step {} ({}) failed: {}", step, tool, e);
                StepRecord {
                    step,
                    tool: tool.to_owned(),
                    parameters,
                    reasoning: reasoning.to_owned(),
                    ok: false,
                    result: e.message.clone(),
                    output: None,
                    duration_ms,
                }
            }
            Err(_) => {
                warn!(
                    "Step {} ({}) timed out after {:?}",
                    step, tool, self.tool_timeout
                );
                StepRecord {
                    step,
                    tool: tool.to_owned(),
                    parameters,
                    reasoning: reasoning.to_owned(),
                    ok: false,
                    result: format!("Timed out after {}s", self.tool_timeout.as_secs()),
                    output: None,
                    duration_ms,
                }
            }
        }
    }

    async fn synthesize(
        &self,
        message: &str,
        evidence: &[&StepRecord],
    ) -> crate::errors::AppResult<String> {
        let combined_results = if evidence.is_empty() {
            "(no tool results were available)".to_owned()
        } else {
            evidence
                .iter()
                .map(|s| {
                    format!(
                        "Step {} ({}): {}",
                        s.step,
                        s.tool,
                        s.output
                            .as_ref()
                            .map_or_else(|| s.result.clone(), ToString::to_string)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let prompt = format!(
            r#"You are an Islamic AI agent providing a final response to a Muslim user.

User's original question: "{message}"

Execution results from various tools:
{combined_results}

Please synthesize a comprehensive, helpful, and authentic Islamic response that:
1. Directly addresses the user's question
2. Incorporates relevant information from the tool results
3. Provides Islamic sources/references where appropriate
4. Is compassionate and respectful
5. Offers practical guidance when applicable
6. If some information could not be retrieved, says so briefly instead of guessing
7. Strictly limits the response to not more than 150 words

Keep the response conversational and helpful while being thorough."#
        );

        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(SYNTHESIS_TEMPERATURE)
            .with_max_tokens(SYNTHESIS_MAX_TOKENS);

        let response = self.llm.complete(&request).await.map_err(|e| {
            crate::errors::AppError::synthesis_failed(format!("Synthesis call failed: {e}"))
        })?;

        let text = response.content.trim().to_owned();
        if text.is_empty() {
            return Err(crate::errors::AppError::synthesis_failed(
                "Synthesis produced an empty response",
            ));
        }

        Ok(text)
    }
}

/// Deterministic answer used when synthesis is unavailable
fn templated_response(evidence: &[&StepRecord]) -> String {
    if evidence.is_empty() {
        return "I was unable to gather the information needed to answer right now. Please try again shortly.".to_owned();
    }

    let mut lines =
        vec!["I could not compose a full answer right now, but here is what I found:".to_owned()];
    for step in evidence {
        lines.push(format!("- {}", step.result));
    }
    lines.join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::profiles::UserProfileSnapshot;
    use crate::test_utils::{build_test_registry, MockLlmProvider};
    use chrono::NaiveDate;
    use serde_json::json;

    fn context() -> ToolExecutionContext {
        ToolExecutionContext::new(
            UserProfileSnapshot::empty("user-1"),
            None,
            None,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    fn executor(llm: MockLlmProvider) -> Executor {
        Executor::new(
            Arc::new(llm),
            Arc::new(build_test_registry()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_canned_plan_skips_synthesis() {
        let exec = executor(MockLlmProvider::scripted(vec![]));
        let plan = ExecutionPlan::canned("greeting", "Wa alaikum assalam!");
        let outcome = exec.execute("salam", &plan, &context()).await;
        assert!(outcome.success);
        assert_eq!(outcome.response, "Wa alaikum assalam!");
        assert!(outcome.tools_used.is_empty());
        assert!(outcome.steps.is_empty());
    }

    #[tokio::test]
    async fn test_direct_plan_synthesizes_without_tools() {
        let exec = executor(MockLlmProvider::scripted(vec![
            "The five pillars are the shahada, salah, zakat, sawm, and hajj.",
        ]));
        let plan = ExecutionPlan::respond_directly("pillars_question");
        let outcome = exec
            .execute("What are the 5 pillars of Islam?", &plan, &context())
            .await;
        assert!(outcome.success);
        assert!(outcome.tools_used.is_empty());
        assert!(outcome.response.contains("pillars"));
    }

    #[tokio::test]
    async fn test_tool_step_contributes_to_tools_used() {
        let exec = executor(MockLlmProvider::scripted(vec![
            "Today is 1 Ramadan 1445 in the Hijri calendar.",
        ]));
        let plan = ExecutionPlan {
            intent: "date".to_owned(),
            steps: vec![PlanStep::UseTool {
                tool: "convert_islamic_date".to_owned(),
                reasoning: String::new(),
                parameters: json!({"date": "2024-03-11"}),
            }],
            canned_response: None,
        };
        let outcome = exec.execute("hijri date?", &plan, &context()).await;
        assert!(outcome.success);
        assert_eq!(outcome.tools_used, vec!["convert_islamic_date"]);
        assert_eq!(outcome.steps.len(), 1);
        assert!(outcome.steps[0].ok);
    }

    #[tokio::test]
    async fn test_failed_step_is_isolated_and_flagged() {
        let exec = executor(MockLlmProvider::scripted(vec![
            "I could not retrieve the prayer times, but here is general guidance.",
        ]));
        let plan = ExecutionPlan {
            intent: "prayer".to_owned(),
            // Bad arguments make the step fail as InvalidInput
            steps: vec![
                PlanStep::UseTool {
                    tool: "get_prayer_times".to_owned(),
                    reasoning: String::new(),
                    parameters: json!({"date": "not-a-date"}),
                },
                PlanStep::UseTool {
                    tool: "convert_islamic_date".to_owned(),
                    reasoning: String::new(),
                    parameters: json!({"date": "2024-03-11"}),
                },
            ],
            canned_response: None,
        };
        let outcome = exec.execute("prayer times?", &plan, &context()).await;
        assert!(!outcome.success);
        assert!(!outcome.steps[0].ok);
        assert!(outcome.steps[1].ok);
        assert!(outcome
            .error_summary
            .as_deref()
            .unwrap()
            .contains("get_prayer_times"));
        // Both tools were invoked, so both are listed
        assert_eq!(
            outcome.tools_used,
            vec!["convert_islamic_date", "get_prayer_times"]
        );
        assert!(!outcome.response.is_empty());
    }

    #[tokio::test]
    async fn test_failed_tool_is_still_listed_in_tools_used() {
        let exec = executor(MockLlmProvider::scripted(vec![
            "The prayer times service could not be reached.",
        ]));
        let plan = ExecutionPlan {
            intent: "prayer".to_owned(),
            steps: vec![PlanStep::UseTool {
                tool: "get_prayer_times".to_owned(),
                reasoning: String::new(),
                parameters: json!({"date": "not-a-date"}),
            }],
            canned_response: None,
        };
        let outcome = exec.execute("prayer times?", &plan, &context()).await;
        assert!(!outcome.success);
        assert!(!outcome.steps[0].ok);
        assert_eq!(outcome.tools_used, vec!["get_prayer_times"]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_yields_templated_answer() {
        let exec = executor(MockLlmProvider::failing());
        let plan = ExecutionPlan {
            intent: "date".to_owned(),
            steps: vec![PlanStep::UseTool {
                tool: "convert_islamic_date".to_owned(),
                reasoning: String::new(),
                parameters: json!({"date": "2024-03-11"}),
            }],
            canned_response: None,
        };
        let outcome = exec.execute("hijri date?", &plan, &context()).await;
        assert!(!outcome.success);
        assert!(outcome.response.contains("here is what I found"));
        assert!(outcome
            .error_summary
            .as_deref()
            .unwrap()
            .contains("synthesis"));
    }

    #[test]
    fn test_truncate_preserves_short_text() {
        assert_eq!(truncate("short", 200), "short");
        let long = "x".repeat(300);
        let cut = truncate(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
    }
}

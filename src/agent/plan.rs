// ABOUTME: Plan and step types produced by the planner and consumed by the executor
// ABOUTME: Plans are data: an ordered list of tool invocations or a direct answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Execution Plans
//!
//! A plan is an ordered list of steps. Each step either invokes a named
//! registry tool with structured arguments or marks a direct answer.
//! A plan with no invoke steps answers directly and records an empty
//! `tools_used` set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One planned step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanStep {
    /// Invoke a registry tool
    UseTool {
        /// Registry tool name
        tool: String,
        /// Why the planner chose this tool
        #[serde(default)]
        reasoning: String,
        /// Arguments matching the tool's input schema
        #[serde(default)]
        parameters: Value,
    },
    /// Answer without invoking any tool
    RespondDirectly,
}

/// The full plan for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The planner's classification of the query
    pub intent: String,
    /// Ordered steps; empty means answer directly
    pub steps: Vec<PlanStep>,
    /// Deterministic response that replaces synthesis entirely
    ///
    /// Set for greetings and out-of-scope queries, where calling the
    /// model again would add nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canned_response: Option<String>,
}

impl ExecutionPlan {
    /// Plan that answers directly with the given intent
    #[must_use]
    pub fn respond_directly(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            steps: vec![PlanStep::RespondDirectly],
            canned_response: None,
        }
    }

    /// Plan that returns a fixed response without any model call
    #[must_use]
    pub fn canned(intent: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            steps: vec![PlanStep::RespondDirectly],
            canned_response: Some(response.into()),
        }
    }

    /// Tool-invoking steps, in plan order
    #[must_use]
    pub fn invocations(&self) -> Vec<(&str, &Value)> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PlanStep::UseTool {
                    tool, parameters, ..
                } => Some((tool.as_str(), parameters)),
                PlanStep::RespondDirectly => None,
            })
            .collect()
    }

    /// Whether the plan answers without any tool invocation
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.invocations().is_empty()
    }
}

/// Outcome of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the plan
    pub step: usize,
    /// Tool that was invoked
    pub tool: String,
    /// Arguments the step ran with
    pub parameters: Value,
    /// Why the planner chose this step
    pub reasoning: String,
    /// Whether the step produced a result
    pub ok: bool,
    /// Short result summary, or the failure description
    pub result: String,
    /// Full tool output, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Step wall-clock duration in milliseconds
    pub duration_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_plan_has_no_invocations() {
        let plan = ExecutionPlan::respond_directly("general_question");
        assert!(plan.is_direct());
        assert!(plan.invocations().is_empty());
    }

    #[test]
    fn test_invocations_preserve_order() {
        let plan = ExecutionPlan {
            intent: "prayer_and_qibla".to_owned(),
            steps: vec![
                PlanStep::UseTool {
                    tool: "get_prayer_times".to_owned(),
                    reasoning: String::new(),
                    parameters: json!({"location": "Cairo"}),
                },
                PlanStep::RespondDirectly,
                PlanStep::UseTool {
                    tool: "get_qibla_direction".to_owned(),
                    reasoning: String::new(),
                    parameters: json!({"location": "Cairo"}),
                },
            ],
            canned_response: None,
        };
        let tools: Vec<&str> = plan.invocations().iter().map(|(t, _)| *t).collect();
        assert_eq!(tools, vec!["get_prayer_times", "get_qibla_direction"]);
        assert!(!plan.is_direct());
    }

    #[test]
    fn test_step_serialization_shape() {
        let step = PlanStep::UseTool {
            tool: "convert_islamic_date".to_owned(),
            reasoning: "date question".to_owned(),
            parameters: json!({}),
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["action"], "use_tool");
        assert_eq!(value["tool"], "convert_islamic_date");
    }
}

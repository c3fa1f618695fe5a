// ABOUTME: Turns one user message plus history and profile into an execution plan
// ABOUTME: One LLM call with the tool catalog; degrades to keyword fallback plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Planner
//!
//! The planner makes exactly one model call per run, supplying the tool
//! catalog as the model's available-action vocabulary, and parses the
//! structured choice back into an `ExecutionPlan`. It never fails the run:
//! an unreachable provider or unparsable response degrades to a keyword
//! fallback plan, and plan steps naming unknown tools are dropped.
//!
//! Two query classes skip the model entirely:
//! - bare greetings get a fixed greeting response
//! - queries with no Islamic connection get a fixed scope notice

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::database::profiles::UserProfileSnapshot;
use crate::database::MessageRecord;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::tools::ToolRegistry;

use super::plan::{ExecutionPlan, PlanStep};

const PLANNING_TEMPERATURE: f32 = 0.3;
const PLANNING_MAX_TOKENS: u32 = 800;

const ISLAMIC_KEYWORDS: &[&str] = &[
    "islam", "islamic", "quran", "quranic", "hadith", "sunnah", "prophet", "muhammad", "allah",
    "prayer", "salah", "dua", "mosque", "masjid", "halal", "haram", "ramadan", "hajj", "umrah",
    "zakat", "shahada", "iman", "tawhid", "fiqh", "salam", "assalam", "bismillah",
    "alhamdulillah", "inshallah", "surah", "ayah", "verse", "qibla", "wudu", "ghusl", "tahajjud",
    "fajr", "dhuhr", "asr", "maghrib", "isha", "jummah", "friday", "eid", "mecca", "medina",
    "kaaba", "hijri", "pillars",
];

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "salam",
    "assalam",
    "assalamu alaikum",
    "how are you",
    "good morning",
    "good evening",
];

const SCOPE_NOTICE: &str = "I'm an Islamic AI assistant designed to help with religious guidance, Quranic knowledge, prayer times, and Islamic practices. I can only assist with Islamic-related queries. Please ask me about Islamic topics, and I'll be happy to help!";

/// Produces one `ExecutionPlan` per run via a single model call
pub struct Planner {
    llm: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
}

impl Planner {
    /// Create a planner over a model provider and the tool registry
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self { llm, registry }
    }

    /// Plan the run for one user message
    ///
    /// Infallible by design: every failure mode maps to a usable plan.
    #[instrument(skip(self, history, profile))]
    pub async fn plan(
        &self,
        message: &str,
        history: &[MessageRecord],
        profile: &UserProfileSnapshot,
    ) -> ExecutionPlan {
        let message_lower = message.to_lowercase();

        if is_greeting(&message_lower) {
            debug!("Greeting detected, skipping model call");
            return ExecutionPlan::canned("greeting", greeting_response(&message_lower));
        }

        if !is_in_scope(&message_lower) {
            debug!("Out-of-scope query, skipping model call");
            return ExecutionPlan::canned("out_of_scope", SCOPE_NOTICE);
        }

        let prompt = self.planning_prompt(message, history, profile);
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(PLANNING_TEMPERATURE)
            .with_max_tokens(PLANNING_MAX_TOKENS);

        let raw = match self.llm.complete(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!("Planning model call failed, using fallback plan: {}", e);
                return self.fallback_plan(message, &message_lower);
            }
        };

        match self.parse_plan(&raw) {
            Some(plan) => plan,
            None => {
                warn!("Planning response unparsable, using fallback plan");
                self.fallback_plan(message, &message_lower)
            }
        }
    }

    fn planning_prompt(
        &self,
        message: &str,
        history: &[MessageRecord],
        profile: &UserProfileSnapshot,
    ) -> String {
        let catalog = self.registry.planner_brief();

        let history_block = if history.is_empty() {
            "(none)".to_owned()
        } else {
            history
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let profile_block = format!(
            "location: {}, timezone: {}, madhab: {}",
            profile.location.as_deref().unwrap_or("unknown"),
            profile.timezone.as_deref().unwrap_or("unknown"),
            profile.madhab.as_deref().unwrap_or("unspecified"),
        );

        format!(
            r#"You are an Islamic AI agent that helps Muslims with religious guidance and practical needs.

Available tools:
{catalog}

User profile: {profile_block}

Recent conversation:
{history_block}

User message: "{message}"

Analyze the user's intent and create a step-by-step execution plan. Consider:
1. What information does the user need?
2. What tools should be used and in what order?
3. Are there multiple aspects to address?
4. Does this require location-based information?
5. If the question can be answered from general Islamic knowledge alone, use "respond_directly" with no tool.

Respond with only a JSON plan in this format:
{{
    "intent": "brief description of what the user wants",
    "steps": [
        {{
            "action": "use_tool",
            "tool": "tool_name_to_use",
            "reasoning": "why this step is needed",
            "parameters": {{}}
        }}
    ]
}}

For a direct answer, use a single step with "action": "respond_directly" and no tool.
For simple questions, use 1-2 steps. For complex requests, break into logical steps."#
        )
    }

    /// Parse the model's plan JSON, dropping steps that name unknown tools
    fn parse_plan(&self, raw: &str) -> Option<ExecutionPlan> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        let parsed: Value = serde_json::from_str(raw.get(start..=end)?).ok()?;

        let intent = parsed
            .get("intent")
            .and_then(Value::as_str)
            .unwrap_or("unclassified")
            .to_owned();

        let raw_steps = parsed.get("steps").and_then(Value::as_array)?;

        let mut steps = Vec::with_capacity(raw_steps.len());
        for raw_step in raw_steps {
            let action = raw_step.get("action").and_then(Value::as_str).unwrap_or("");
            let tool = raw_step.get("tool").and_then(Value::as_str);

            match (action, tool) {
                ("respond_directly", _) | (_, None) => steps.push(PlanStep::RespondDirectly),
                (_, Some(tool)) => {
                    if self.registry.contains(tool) {
                        steps.push(PlanStep::UseTool {
                            tool: tool.to_owned(),
                            reasoning: raw_step
                                .get("reasoning")
                                .and_then(Value::as_str)
                                .unwrap_or("")
                                .to_owned(),
                            parameters: raw_step
                                .get("parameters")
                                .cloned()
                                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                        });
                    } else {
                        warn!("Planner chose unknown tool '{}', dropping step", tool);
                    }
                }
            }
        }

        if steps.is_empty() {
            steps.push(PlanStep::RespondDirectly);
        }

        Some(ExecutionPlan {
            intent,
            steps,
            canned_response: None,
        })
    }

    /// Keyword plan used when the model is unreachable or unparsable
    fn fallback_plan(&self, message: &str, message_lower: &str) -> ExecutionPlan {
        let tool_by_keyword = [
            ("prayer time", "get_prayer_times"),
            ("prayer times", "get_prayer_times"),
            ("qibla", "get_qibla_direction"),
            ("hijri", "convert_islamic_date"),
            ("islamic date", "convert_islamic_date"),
            ("islamic calendar", "convert_islamic_date"),
            ("halal restaurant", "find_halal_places"),
            ("mosque near", "find_halal_places"),
            ("islamic center", "find_halal_places"),
        ];

        for (keyword, tool) in tool_by_keyword {
            if message_lower.contains(keyword) && self.registry.contains(tool) {
                return ExecutionPlan {
                    intent: "fallback_keyword_plan".to_owned(),
                    steps: vec![PlanStep::UseTool {
                        tool: tool.to_owned(),
                        reasoning: "Keyword match after planning failure".to_owned(),
                        parameters: Value::Object(serde_json::Map::new()),
                    }],
                    canned_response: None,
                };
            }
        }

        if self.registry.contains("search_islamic_knowledge") {
            return ExecutionPlan {
                intent: "fallback_knowledge_search".to_owned(),
                steps: vec![PlanStep::UseTool {
                    tool: "search_islamic_knowledge".to_owned(),
                    reasoning: "Defaulting to knowledge search after planning failure".to_owned(),
                    parameters: serde_json::json!({ "query": message }),
                }],
                canned_response: None,
            };
        }

        ExecutionPlan::respond_directly("fallback_direct")
    }
}

fn is_greeting(message_lower: &str) -> bool {
    let trimmed = message_lower.trim().trim_end_matches(['!', '.', '?']);
    GREETINGS
        .iter()
        .any(|g| trimmed == *g || trimmed.starts_with(&format!("{g} ")) && trimmed.len() < 40)
}

fn is_in_scope(message_lower: &str) -> bool {
    ISLAMIC_KEYWORDS.iter().any(|k| message_lower.contains(k))
        || GREETINGS.iter().any(|g| message_lower.contains(g))
}

fn greeting_response(message_lower: &str) -> String {
    if ["salam", "assalam"].iter().any(|g| message_lower.contains(g)) {
        "Wa alaikum assalam wa rahmatullahi wa barakatuh! How can I assist you with your Islamic needs today?".to_owned()
    } else if message_lower.contains("how are you") {
        "Alhamdulillah, I'm here and ready to help you with any Islamic guidance or information you need. How can I assist you?".to_owned()
    } else {
        "Hello! I'm your Islamic AI assistant. I can help you with prayer times, Quranic guidance, Islamic knowledge, and more. How can I assist you today?".to_owned()
    }
}

// ABOUTME: The agent facade: one inbound message in, one answered and recorded run out
// ABOUTME: Coordinates conversation store, planner, executor, and recorder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Orchestrator
//!
//! Drives one run through its states:
//!
//! ```text
//! Received -> Planning -> Executing -> Synthesizing -> Recording -> Completed
//! ```
//!
//! `NotAuthorized` aborts before any persistence. Every other failure mode
//! still yields a persisted assistant message and a recorded execution.
//! The per-conversation lock is held for read-history-then-append and for
//! the assistant append, never across model calls.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::config::DEFAULT_CONVERSATION_TITLE;
use crate::database::chat::ChatManager;
use crate::database::profiles::ProfileManager;
use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use crate::tools::ToolExecutionContext;

use super::executor::Executor;
use super::plan::StepRecord;
use super::planner::Planner;
use super::recorder::ExecutionRecorder;

/// Run lifecycle states, used for trace logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Received,
    Planning,
    Executing,
    Synthesizing,
    Recording,
    Completed,
}

impl RunState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Synthesizing => "synthesizing",
            Self::Recording => "recording",
            Self::Completed => "completed",
        }
    }
}

/// One inbound message for the orchestrator
#[derive(Debug, Clone)]
pub struct AgentRunInput {
    /// The user's message text
    pub message: String,
    /// Existing conversation to continue, or none to start one
    pub conversation_id: Option<String>,
    /// Request-level location override
    pub location: Option<String>,
    /// Request-level timezone override
    pub timezone: Option<String>,
}

/// The completed run handed back to the transport layer
#[derive(Debug)]
pub struct AgentRunOutput {
    /// Final prose answer
    pub response: String,
    /// Conversation the run belongs to (possibly newly created)
    pub conversation_id: String,
    /// Persisted user message
    pub user_message_id: String,
    /// Persisted assistant message
    pub assistant_message_id: String,
    /// Per-step trace, in plan order
    pub steps: Vec<StepRecord>,
    /// Distinct tools invoked
    pub tools_used: Vec<String>,
    /// Whether the whole run succeeded
    pub success: bool,
}

/// The agent facade
pub struct Orchestrator {
    chat: ChatManager,
    profiles: ProfileManager,
    planner: Planner,
    executor: Executor,
    recorder: ExecutionRecorder,
    history_limit: i64,
}

impl Orchestrator {
    /// Assemble the orchestrator from its collaborators
    #[must_use]
    pub fn new(
        chat: ChatManager,
        profiles: ProfileManager,
        planner: Planner,
        executor: Executor,
        recorder: ExecutionRecorder,
        history_limit: i64,
    ) -> Self {
        Self {
            chat,
            profiles,
            planner,
            executor,
            recorder,
            history_limit,
        }
    }

    /// Handle one inbound message end to end
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty message, `ResourceNotFound` for
    /// an unknown conversation id, `NotAuthorized` for a conversation
    /// owned by another user, and `DatabaseError` when persistence of the
    /// conversation or messages fails. Planning, tool, and synthesis
    /// failures never surface as errors.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn handle_message(
        &self,
        user_id: &str,
        input: AgentRunInput,
    ) -> AppResult<AgentRunOutput> {
        let started = Instant::now();
        let mut state = RunState::Received;

        let message = input.message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message must not be empty"));
        }

        // Ownership check happens before anything is persisted.
        let conversation = match &input.conversation_id {
            Some(id) => match self.chat.get_conversation(id, user_id).await? {
                Some(conversation) => conversation,
                None => {
                    if self.chat.conversation_exists(id).await? {
                        return Err(AppError::not_authorized(
                            "Conversation belongs to another user",
                        ));
                    }
                    return Err(AppError::not_found(format!("Conversation not found: {id}")));
                }
            },
            None => {
                self.chat
                    .create_conversation(user_id, DEFAULT_CONVERSATION_TITLE)
                    .await?
            }
        };

        let profile = self.profiles.get_snapshot(user_id).await?;
        let context = ToolExecutionContext::new(
            profile,
            input.location.clone(),
            input.timezone.clone(),
            Utc::now().date_naive(),
        );

        // Read-then-append under the conversation lock so concurrent
        // requests to the same conversation serialize.
        let lock = self.chat.conversation_lock(&conversation.id);
        let (history, user_message) = {
            let _guard = lock.lock().await;
            let history = self
                .chat
                .get_recent_messages(&conversation.id, self.history_limit)
                .await?;
            let user_message = self
                .chat
                .append_message(&conversation.id, MessageRole::User, message, None)
                .await?;
            (history, user_message)
        };

        state = transition(state, RunState::Planning);
        let plan = self
            .planner
            .plan(message, &history, &context.profile)
            .await;

        state = transition(state, RunState::Executing);
        let outcome = self.executor.execute(message, &plan, &context).await;
        state = transition(state, RunState::Synthesizing);

        let trace_metadata = serde_json::json!({
            "agent_steps": outcome.steps,
            "tools_used": outcome.tools_used,
        });
        let assistant_message = {
            let _guard = lock.lock().await;
            self.chat
                .append_message(
                    &conversation.id,
                    MessageRole::Assistant,
                    &outcome.response,
                    Some(&trace_metadata),
                )
                .await?
        };

        state = transition(state, RunState::Recording);
        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.recorder
            .record_best_effort(
                user_id,
                &conversation.id,
                &user_message.id,
                Some(&assistant_message.id),
                message,
                &plan,
                &outcome,
                duration_ms,
            )
            .await;

        state = transition(state, RunState::Completed);
        info!(
            "Run {} in {}ms: intent='{}', tools={:?}, success={}",
            state.as_str(),
            duration_ms,
            plan.intent,
            outcome.tools_used,
            outcome.success
        );

        Ok(AgentRunOutput {
            response: outcome.response,
            conversation_id: conversation.id,
            user_message_id: user_message.id,
            assistant_message_id: assistant_message.id,
            steps: outcome.steps,
            tools_used: outcome.tools_used,
            success: outcome.success,
        })
    }
}

fn transition(from: RunState, to: RunState) -> RunState {
    debug!("Run state {} -> {}", from.as_str(), to.as_str());
    to
}

// ABOUTME: Public API request and response types for the chat surface
// ABOUTME: Wire-level shapes; internal agent types are mapped into these
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use serde::{Deserialize, Serialize};

use crate::agent::StepRecord;
use crate::database::{ConversationRecord, ConversationSummary, MessageRecord};
use crate::tools::ToolSchema;

/// Inbound chat message
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message text
    pub message: String,
    /// Existing conversation to continue, or absent to start one
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Location override for this request
    #[serde(default)]
    pub location: Option<String>,
    /// Timezone override for this request
    #[serde(default)]
    pub timezone: Option<String>,
}

/// One executed step in the response trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStep {
    /// 1-based position in the plan
    pub step: usize,
    /// Tool that was invoked
    pub tool_used: String,
    /// Short result preview, or the failure description
    pub result: String,
    /// Why the planner chose this step
    pub reasoning: String,
    /// Whether the step produced a result
    pub success: bool,
    /// Step duration in milliseconds
    pub duration_ms: i64,
}

impl From<&StepRecord> for AgentStep {
    fn from(record: &StepRecord) -> Self {
        Self {
            step: record.step,
            tool_used: record.tool.clone(),
            result: record.result.clone(),
            reasoning: record.reasoning.clone(),
            success: record.ok,
            duration_ms: record.duration_ms,
        }
    }
}

/// Chat response with the execution trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Final prose answer
    pub response: String,
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// Persisted assistant message id
    pub message_id: String,
    /// Per-step trace
    pub agent_steps: Vec<AgentStep>,
    /// Distinct tools invoked
    pub tools_used: Vec<String>,
    /// Whether the whole run succeeded
    pub success: bool,
}

/// Conversation listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
}

/// Single conversation with its messages
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationDetailResponse {
    pub conversation: ConversationRecord,
    pub messages: Vec<MessageRecord>,
}

/// Tool catalogue introspection response
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCatalogResponse {
    pub tools: Vec<ToolSchema>,
}

/// Pagination query for listings
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    50
}

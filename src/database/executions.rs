// ABOUTME: Database operations for agent execution traces
// ABOUTME: Records plan, steps, tools used, timing, and outcome per run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Execution Traces
//!
//! One record per orchestrated run: the plan the LLM produced, the steps
//! actually executed, the distinct tools that ran, duration, and whether
//! the run succeeded. Recording is best-effort from the orchestrator's
//! point of view; a failed insert is logged, never surfaced to the user.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::errors::{AppError, AppResult};

/// Database representation of one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecutionRecord {
    /// Unique execution ID
    pub id: String,
    /// Conversation the run belongs to
    pub conversation_id: String,
    /// The user message that triggered the run
    pub message_id: String,
    /// The assistant message produced, when one was persisted
    pub response_message_id: Option<String>,
    /// The user's query text
    pub user_query: String,
    /// The plan as produced by the planner (JSON)
    pub execution_plan: serde_json::Value,
    /// Per-step outcomes (JSON array)
    pub steps_executed: serde_json::Value,
    /// Distinct tool names that executed
    pub tools_used: Vec<String>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: i64,
    /// Whether every step and synthesis succeeded
    pub success: bool,
    /// Summary of what failed, when `success` is false
    pub error_message: Option<String>,
    /// When the record was written (ISO 8601)
    pub created_at: String,
}

/// Execution trace operations manager
pub struct ExecutionManager {
    pool: SqlitePool,
}

impl ExecutionManager {
    /// Create a new execution manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an execution record
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn record(&self, record: &AgentExecutionRecord) -> AppResult<()> {
        let tools_used = serde_json::to_string(&record.tools_used)
            .map_err(|e| AppError::serialization(format!("Failed to serialize tools_used: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO agent_executions
                (id, conversation_id, message_id, response_message_id, user_query,
                 execution_plan, steps_executed, tools_used, duration_ms, success,
                 error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(&record.id)
        .bind(&record.conversation_id)
        .bind(&record.message_id)
        .bind(&record.response_message_id)
        .bind(&record.user_query)
        .bind(record.execution_plan.to_string())
        .bind(record.steps_executed.to_string())
        .bind(tools_used)
        .bind(record.duration_ms)
        .bind(record.success)
        .bind(&record.error_message)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record execution: {e}")))?;

        Ok(())
    }

    /// List executions for a conversation, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> AppResult<Vec<AgentExecutionRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, message_id, response_message_id, user_query,
                   execution_plan, steps_executed, tools_used, duration_ms, success,
                   error_message, created_at
            FROM agent_executions
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list executions: {e}")))?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    fn row_to_record(r: sqlx::sqlite::SqliteRow) -> AppResult<AgentExecutionRecord> {
        let plan_raw: String = r.get("execution_plan");
        let steps_raw: String = r.get("steps_executed");
        let tools_raw: String = r.get("tools_used");

        Ok(AgentExecutionRecord {
            id: r.get("id"),
            conversation_id: r.get("conversation_id"),
            message_id: r.get("message_id"),
            response_message_id: r.get("response_message_id"),
            user_query: r.get("user_query"),
            execution_plan: serde_json::from_str(&plan_raw)
                .map_err(|e| AppError::serialization(format!("Bad stored plan: {e}")))?,
            steps_executed: serde_json::from_str(&steps_raw)
                .map_err(|e| AppError::serialization(format!("Bad stored steps: {e}")))?,
            tools_used: serde_json::from_str(&tools_raw)
                .map_err(|e| AppError::serialization(format!("Bad stored tools_used: {e}")))?,
            duration_ms: r.get("duration_ms"),
            success: r.get("success"),
            error_message: r.get("error_message"),
            created_at: r.get("created_at"),
        })
    }
}

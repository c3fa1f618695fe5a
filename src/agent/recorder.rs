// ABOUTME: Persists one AgentExecution trace per run and mirrors it to the audit log
// ABOUTME: Advisory by contract: a failed write never blocks the user-visible response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::database::{AgentExecutionRecord, AuditManager, ExecutionManager};

use super::executor::ExecutionOutcome;
use super::plan::ExecutionPlan;

/// Writes execution traces after each run concludes
pub struct ExecutionRecorder {
    executions: ExecutionManager,
    audit: AuditManager,
}

impl ExecutionRecorder {
    /// Create a recorder over the execution and audit managers
    #[must_use]
    pub const fn new(executions: ExecutionManager, audit: AuditManager) -> Self {
        Self { executions, audit }
    }

    /// Record the run, best-effort
    ///
    /// Persistence failures are logged and reported to the audit sink;
    /// they never propagate.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_best_effort(
        &self,
        user_id: &str,
        conversation_id: &str,
        message_id: &str,
        response_message_id: Option<&str>,
        user_query: &str,
        plan: &ExecutionPlan,
        outcome: &ExecutionOutcome,
        duration_ms: i64,
    ) {
        let record = AgentExecutionRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_owned(),
            message_id: message_id.to_owned(),
            response_message_id: response_message_id.map(str::to_owned),
            user_query: user_query.to_owned(),
            execution_plan: serde_json::to_value(plan).unwrap_or(serde_json::Value::Null),
            steps_executed: serde_json::to_value(&outcome.steps)
                .unwrap_or_else(|_| serde_json::Value::Array(Vec::new())),
            tools_used: outcome.tools_used.clone(),
            duration_ms,
            success: outcome.success,
            error_message: outcome.error_summary.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.executions.record(&record).await {
            warn!("Failed to record execution {}: {}", record.id, e);
            self.audit
                .log_best_effort(
                    user_id,
                    "agent_execution_record_failed",
                    false,
                    Some(&json!({ "execution_id": record.id, "error": e.message })),
                )
                .await;
            return;
        }

        self.audit
            .log_best_effort(
                user_id,
                "agent_execution",
                outcome.success,
                Some(&json!({
                    "execution_id": record.id,
                    "conversation_id": conversation_id,
                    "tools_used": outcome.tools_used,
                    "duration_ms": duration_ms,
                })),
            )
            .await;
    }
}

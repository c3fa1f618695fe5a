// ABOUTME: Append-only audit log of user-visible actions
// ABOUTME: Best-effort writes; a failed audit insert never fails the request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Audit log operations manager
pub struct AuditManager {
    pool: SqlitePool,
}

impl AuditManager {
    /// Create a new audit manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append an audit entry
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn log(
        &self,
        user_id: &str,
        action: &str,
        success: bool,
        details: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO audit_logs (id, user_id, action, success, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(action)
        .bind(success)
        .bind(details.map(ToString::to_string))
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to write audit log: {e}")))?;

        Ok(())
    }

    /// Append an audit entry, swallowing failures with a warning
    pub async fn log_best_effort(
        &self,
        user_id: &str,
        action: &str,
        success: bool,
        details: Option<&serde_json::Value>,
    ) {
        if let Err(e) = self.log(user_id, action, success, details).await {
            warn!("Audit log write failed for action '{}': {}", action, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use crate::test_utils::test_database;

    #[tokio::test]
    async fn test_entry_carries_success_flag() {
        let db = test_database().await;
        db.audit()
            .log("user-1", "agent_execution", false, None)
            .await
            .unwrap();

        let row = sqlx::query("SELECT action, success FROM audit_logs WHERE user_id = $1")
            .bind("user-1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let action: String = row.get("action");
        let success: bool = row.get("success");
        assert_eq!(action, "agent_execution");
        assert!(!success);
    }
}

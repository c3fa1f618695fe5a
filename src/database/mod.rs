// ABOUTME: SQLite persistence layer: connection management, migrations, and managers
// ABOUTME: Conversations, messages, execution traces, user profiles, and audit log
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Database Management
//!
//! One `Database` owns the SQLite pool and runs migrations at startup.
//! Domain-specific operations live in manager types created from it:
//! - `ChatManager` - conversations and messages
//! - `ExecutionManager` - agent execution traces
//! - `ProfileManager` - user profile snapshots
//! - `AuditManager` - append-only audit log
//!
//! Per-conversation append locks are shared across all `ChatManager`
//! instances cloned from the same `Database`.

pub mod audit;
pub mod chat;
pub mod executions;
pub mod profiles;

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::info;

use crate::errors::{AppError, AppResult};

pub use audit::AuditManager;
pub use chat::{ChatManager, ConversationRecord, ConversationSummary, MessageRecord};
pub use executions::{AgentExecutionRecord, ExecutionManager};
pub use profiles::{ProfileManager, UserProfileSnapshot};

/// Database connection and migration manager
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    conversation_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Database {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` when the connection or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // In-memory SQLite gets a fresh database per connection, so the
        // pool must be pinned to a single connection for tests.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(database_url)
                .await
        } else {
            let connection_options = if database_url.starts_with("sqlite:") {
                format!("{database_url}?mode=rwc")
            } else {
                database_url.to_owned()
            };
            SqlitePool::connect(&connection_options).await
        }
        .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self {
            pool,
            conversation_locks: Arc::new(DashMap::new()),
        };

        db.migrate().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chat_conversations: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_user ON chat_conversations(user_id, updated_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES chat_conversations (id) ON DELETE CASCADE,
                UNIQUE (conversation_id, seq)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chat_messages: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON chat_messages(conversation_id, seq)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create message index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS agent_executions (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                message_id TEXT NOT NULL,
                response_message_id TEXT,
                user_query TEXT NOT NULL,
                execution_plan TEXT NOT NULL,
                steps_executed TEXT NOT NULL,
                tools_used TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                success BOOLEAN NOT NULL,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create agent_executions: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_executions_conversation ON agent_executions(conversation_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create execution index: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY,
                location TEXT,
                timezone TEXT,
                madhab TEXT,
                calculation_method INTEGER,
                language TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user_profiles: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS audit_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                action TEXT NOT NULL,
                success BOOLEAN NOT NULL,
                details TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create audit_logs: {e}")))?;

        info!("Database migrations complete");

        Ok(())
    }

    /// Chat conversation and message operations
    #[must_use]
    pub fn chat(&self) -> ChatManager {
        ChatManager::new(self.pool.clone(), Arc::clone(&self.conversation_locks))
    }

    /// Agent execution trace operations
    #[must_use]
    pub fn executions(&self) -> ExecutionManager {
        ExecutionManager::new(self.pool.clone())
    }

    /// User profile operations
    #[must_use]
    pub fn profiles(&self) -> ProfileManager {
        ProfileManager::new(self.pool.clone())
    }

    /// Audit log operations
    #[must_use]
    pub fn audit(&self) -> AuditManager {
        AuditManager::new(self.pool.clone())
    }

    /// Access the raw pool (tests and health checks)
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ABOUTME: Database operations for conversations and messages
// ABOUTME: Ownership-scoped CRUD with transactional append and per-conversation locks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Chat Persistence
//!
//! Conversations and their messages. Two invariants live here:
//! - Message order is a per-conversation `seq` counter assigned inside the
//!   append transaction, so history reads are stable even when wall-clock
//!   timestamps collide.
//! - Appending a message and bumping the conversation's `updated_at`
//!   happen in one transaction.
//!
//! Every read and write is scoped by `user_id`, so one user can never see
//! or touch another user's conversations.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique conversation ID
    pub id: String,
    /// User who owns the conversation
    pub user_id: String,
    /// Conversation title
    pub title: String,
    /// When the conversation was created (ISO 8601)
    pub created_at: String,
    /// When the conversation last received a message (ISO 8601)
    pub updated_at: String,
}

/// Database representation of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// Position within the conversation, starting at 1
    pub seq: i64,
    /// Role of the sender (user, assistant, system)
    pub role: String,
    /// Message content
    pub content: String,
    /// Structured metadata, e.g. `{agent_steps, tools_used}` on assistant messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: String,
    /// Conversation title
    pub title: String,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// When the conversation was created
    pub created_at: String,
    /// When the conversation was last updated
    pub updated_at: String,
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Chat database operations manager
pub struct ChatManager {
    pool: SqlitePool,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub fn new(pool: SqlitePool, locks: Arc<DashMap<String, Arc<Mutex<()>>>>) -> Self {
        Self { pool, locks }
    }

    /// Get the append lock for a conversation
    ///
    /// Callers hold this across read-history-then-append sequences so
    /// concurrent requests to the same conversation serialize. It must not
    /// be held across LLM calls.
    #[must_use]
    pub fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(conversation_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ========================================================================
    // Conversation Operations
    // ========================================================================

    /// Create a new conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_conversation(
        &self,
        user_id: &str,
        title: &str,
    ) -> AppResult<ConversationRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO chat_conversations (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(ConversationRecord {
            id,
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a conversation by ID, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ConversationRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, created_at, updated_at
            FROM chat_conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        Ok(row.map(|r| ConversationRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            title: r.get("title"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Check whether a conversation exists under any owner
    ///
    /// Distinguishes "not found" from "owned by someone else" for the
    /// orchestrator's authorization decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn conversation_exists(&self, conversation_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM chat_conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check conversation: {e}")))?;

        Ok(row.is_some())
    }

    /// List conversations for a user, most recently updated first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_conversations(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.created_at, c.updated_at,
                   COUNT(m.id) as message_count
            FROM chat_conversations c
            LEFT JOIN chat_messages m ON m.conversation_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|r| ConversationSummary {
                id: r.get("id"),
                title: r.get("title"),
                message_count: r.get("message_count"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })
            .collect())
    }

    /// Delete a conversation and its messages, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<bool> {
        // Messages first: SQLite only honors ON DELETE CASCADE with
        // foreign_keys pragma enabled, which pooled connections may not set.
        sqlx::query(
            r"
            DELETE FROM chat_messages
            WHERE conversation_id IN (
                SELECT id FROM chat_conversations WHERE id = $1 AND user_id = $2
            )
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete messages: {e}")))?;

        let result = sqlx::query(
            r"
            DELETE FROM chat_conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        self.locks.remove(conversation_id);

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append a message and bump the conversation's `updated_at` atomically
    ///
    /// `metadata` carries the per-answer trace on assistant messages
    /// (`{agent_steps, tools_used}`); user messages pass `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<&serde_json::Value>,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let role_str = role.as_str();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let seq: i64 = sqlx::query(
            r"
            SELECT COALESCE(MAX(seq), 0) + 1 AS next_seq
            FROM chat_messages
            WHERE conversation_id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to allocate message seq: {e}")))?
        .get("next_seq");

        sqlx::query(
            r"
            INSERT INTO chat_messages (id, conversation_id, seq, role, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(seq)
        .bind(role_str)
        .bind(content)
        .bind(metadata.map(ToString::to_string))
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to append message: {e}")))?;

        sqlx::query(
            r"
            UPDATE chat_conversations
            SET updated_at = $1
            WHERE id = $2
            ",
        )
        .bind(&now)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation timestamp: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit message append: {e}")))?;

        Ok(MessageRecord {
            id,
            conversation_id: conversation_id.to_owned(),
            seq,
            role: role_str.to_owned(),
            content: content.to_owned(),
            metadata: metadata.cloned(),
            created_at: now,
        })
    }

    /// Get all messages for a conversation in order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, seq, role, content, metadata, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        Ok(rows.into_iter().map(Self::row_to_message).collect())
    }

    /// Get the last N messages in chronological order (for context window)
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, seq, role, content, metadata, created_at
            FROM chat_messages
            WHERE conversation_id = $1
            ORDER BY seq DESC
            LIMIT $2
            ",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent messages: {e}")))?;

        let mut messages: Vec<MessageRecord> =
            rows.into_iter().map(Self::row_to_message).collect();
        messages.reverse();

        Ok(messages)
    }

    /// Get message count for a conversation
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_message_count(&self, conversation_id: &str) -> AppResult<i64> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as count
            FROM chat_messages
            WHERE conversation_id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get message count: {e}")))?;

        Ok(row.get("count"))
    }

    fn row_to_message(r: sqlx::sqlite::SqliteRow) -> MessageRecord {
        let metadata: Option<String> = r.get("metadata");
        MessageRecord {
            id: r.get("id"),
            conversation_id: r.get("conversation_id"),
            seq: r.get("seq"),
            role: r.get("role"),
            content: r.get("content"),
            metadata: metadata.and_then(|raw| serde_json::from_str(&raw).ok()),
            created_at: r.get("created_at"),
        }
    }
}

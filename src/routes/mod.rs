// ABOUTME: HTTP surface: router assembly, identity extraction, and health check
// ABOUTME: Identity arrives resolved from an upstream gateway; no credential checks here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # HTTP Routes
//!
//! The public surface over the agent engine:
//! - `POST /chat/agent` - send a message, receive the answer and trace
//! - `GET /chat/agent/tools` - tool catalogue introspection
//! - `GET /chat/conversations` - list the caller's conversations
//! - `GET /chat/conversations/:id` - one conversation with messages
//! - `DELETE /chat/conversations/:id` - delete a conversation
//! - `GET /health` - liveness and database reachability
//!
//! Authentication is out of scope: an upstream gateway resolves the user
//! and forwards the identity in the `x-user-id` header. `AuthedUser`
//! rejects requests where it is missing.

pub mod chat;

use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::resources::ServerResources;

/// The resolved, already-authenticated caller
#[derive(Debug, Clone)]
pub struct AuthedUser {
    /// User identity forwarded by the gateway
    pub user_id: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::not_authorized("Missing resolved user identity"))?;

        Ok(Self {
            user_id: user_id.to_owned(),
        })
    }
}

/// Build the application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/chat/agent", post(chat::send_message))
        .route("/chat/agent/tools", get(chat::list_tools))
        .route("/chat/conversations", get(chat::list_conversations))
        .route(
            "/chat/conversations/:conversation_id",
            get(chat::get_conversation).delete(chat::delete_conversation),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(resources)
}

/// Liveness check including database reachability
async fn health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
    let database_ok = sqlx::query("SELECT 1")
        .fetch_one(resources.database.pool())
        .await
        .is_ok();

    Json(json!({
        "status": if database_ok { "ok" } else { "degraded" },
        "database": database_ok,
        "tools": resources.registry.len(),
    }))
}

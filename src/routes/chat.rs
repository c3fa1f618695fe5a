// ABOUTME: Handlers for the agent chat endpoint and conversation CRUD
// ABOUTME: Maps orchestrator output into the public wire types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;

use crate::agent::AgentRunInput;
use crate::errors::{AppError, AppResult};
use crate::models::{
    AgentStep, ChatRequest, ChatResponse, ConversationDetailResponse, ConversationListResponse,
    PaginationQuery, ToolCatalogResponse,
};
use crate::resources::ServerResources;

use super::AuthedUser;

/// `POST /chat/agent` - run the agent over one message
#[instrument(skip(resources, request), fields(user_id = %user.user_id))]
pub async fn send_message(
    State(resources): State<Arc<ServerResources>>,
    user: AuthedUser,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let output = resources
        .orchestrator
        .handle_message(
            &user.user_id,
            AgentRunInput {
                message: request.message,
                conversation_id: request.conversation_id,
                location: request.location,
                timezone: request.timezone,
            },
        )
        .await?;

    Ok(Json(ChatResponse {
        response: output.response,
        conversation_id: output.conversation_id,
        message_id: output.assistant_message_id,
        agent_steps: output.steps.iter().map(AgentStep::from).collect(),
        tools_used: output.tools_used,
        success: output.success,
    }))
}

/// `GET /chat/agent/tools` - tool catalogue introspection
pub async fn list_tools(
    State(resources): State<Arc<ServerResources>>,
    _user: AuthedUser,
) -> Json<ToolCatalogResponse> {
    Json(ToolCatalogResponse {
        tools: resources.registry.all_schemas(),
    })
}

/// `GET /chat/conversations` - list the caller's conversations
pub async fn list_conversations(
    State(resources): State<Arc<ServerResources>>,
    user: AuthedUser,
    Query(page): Query<PaginationQuery>,
) -> AppResult<Json<ConversationListResponse>> {
    let conversations = resources
        .database
        .chat()
        .list_conversations(&user.user_id, page.limit, page.offset)
        .await?;

    Ok(Json(ConversationListResponse { conversations }))
}

/// `GET /chat/conversations/:id` - one conversation with its messages
pub async fn get_conversation(
    State(resources): State<Arc<ServerResources>>,
    user: AuthedUser,
    Path(conversation_id): Path<String>,
) -> AppResult<Json<ConversationDetailResponse>> {
    let chat = resources.database.chat();

    let conversation = chat
        .get_conversation(&conversation_id, &user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Conversation {conversation_id}")))?;

    let messages = chat.get_messages(&conversation_id).await?;

    Ok(Json(ConversationDetailResponse {
        conversation,
        messages,
    }))
}

/// `DELETE /chat/conversations/:id` - delete a conversation and its messages
pub async fn delete_conversation(
    State(resources): State<Arc<ServerResources>>,
    user: AuthedUser,
    Path(conversation_id): Path<String>,
) -> AppResult<StatusCode> {
    let deleted = resources
        .database
        .chat()
        .delete_conversation(&conversation_id, &user.user_id)
        .await?;

    if deleted {
        resources
            .database
            .audit()
            .log_best_effort(
                &user.user_id,
                "conversation_deleted",
                true,
                Some(&serde_json::json!({ "conversation_id": conversation_id })),
            )
            .await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!(
            "Conversation {conversation_id}"
        )))
    }
}

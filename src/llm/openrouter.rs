// ABOUTME: OpenRouter LLM provider implementation over the OpenAI-compatible API
// ABOUTME: Handles request conversion, error mapping, and per-call timeouts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # OpenRouter Provider
//!
//! Implementation of the `LlmProvider` trait against OpenRouter's
//! OpenAI-compatible `chat/completions` endpoint. Any other
//! OpenAI-compatible backend works by pointing `base_url` at it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};
use crate::config::LlmConfig;
use crate::errors::{AppError, AppResult};

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&ChatMessage> for ApiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Configuration for the OpenRouter provider
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// Default model identifier
    pub default_model: String,
    /// Per-call request timeout
    pub timeout: Duration,
}

impl From<&LlmConfig> for OpenRouterConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            default_model: config.model.clone(),
            timeout: config.timeout,
        }
    }
}

/// OpenRouter LLM provider
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the API key is empty or the HTTP
    /// client cannot be constructed.
    pub fn new(config: OpenRouterConfig) -> AppResult<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::config(
                "Missing OPENROUTER_API_KEY environment variable",
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages.iter().map(ApiMessage::from).collect()
    }

    /// Map an error response body to a typed failure
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|r| r.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        match status.as_u16() {
            400 => AppError::invalid_input(format!("OpenRouter rejected the request: {detail}")),
            _ => AppError::upstream("OpenRouter", format!("API error ({status}): {detail}")),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn display_name(&self) -> &'static str {
        "OpenRouter"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &CompletionRequest) -> AppResult<CompletionResponse> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        debug!("Sending chat completion request to OpenRouter");

        let api_request = ApiRequest {
            model: model.to_owned(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to OpenRouter: {}", e);
                AppError::upstream("OpenRouter", format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read OpenRouter response: {}", e);
            AppError::upstream("OpenRouter", format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: ApiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse OpenRouter response: {}", e);
            AppError::upstream("OpenRouter", format!("Failed to parse response: {e}"))
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::upstream("OpenRouter", "API returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();

        debug!(
            "Received response from OpenRouter: {} chars, finish_reason: {:?}",
            content.len(),
            choice.finish_reason
        );

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            usage: api_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_fails() {
        let config = OpenRouterConfig {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_owned(),
            default_model: "openai/gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(30),
        };
        assert!(OpenRouterProvider::new(config).is_err());
    }

    #[test]
    fn test_error_response_mapping() {
        let body = r#"{"error":{"message":"model overloaded"}}"#;
        let err =
            OpenRouterProvider::parse_error_response(reqwest::StatusCode::SERVICE_UNAVAILABLE, body);
        assert_eq!(err.code, crate::errors::ErrorCode::UpstreamUnavailable);
        assert!(err.message.contains("model overloaded"));
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let provider = OpenRouterProvider::new(OpenRouterConfig {
            api_key: "test-key".to_owned(),
            base_url: "https://openrouter.ai/api/v1/".to_owned(),
            default_model: "openai/gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(30),
        })
        .unwrap();
        assert_eq!(
            provider.api_url("chat/completions"),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}

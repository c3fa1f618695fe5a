// ABOUTME: Environment-based server configuration for runtime settings
// ABOUTME: Covers HTTP, database, LLM provider, embedding, vector index, and tool API endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Server Configuration
//!
//! Environment-only configuration. Every setting has a sensible default
//! except the upstream API keys, which are required when the corresponding
//! backend is actually used.
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `MINARET_HTTP_PORT` | `8080` | HTTP listen port |
//! | `DATABASE_URL` | `sqlite:./data/minaret.db` | SQLite database |
//! | `OPENROUTER_API_KEY` | - | LLM provider key |
//! | `OPENROUTER_BASE_URL` | `https://openrouter.ai/api/v1` | LLM endpoint |
//! | `OPENROUTER_MODEL` | `openai/gpt-4o-mini` | Planning/synthesis model |
//! | `GEMINI_API_KEY` | - | Embedding provider key |
//! | `GEMINI_EMBED_MODEL` | `text-embedding-004` | Embedding model |
//! | `PINECONE_INDEX_HOST` | - | Vector index host URL |
//! | `PINECONE_API_KEY` | - | Vector index key |
//! | `PINECONE_NAMESPACE` | `sahih_bukhari` | Index namespace |
//! | `ALADHAN_BASE_URL` | `https://api.aladhan.com` | Prayer timings API |
//! | `NOMINATIM_BASE_URL` | `https://nominatim.openstreetmap.org` | Geocoding API |
//! | `MINARET_HISTORY_LIMIT` | `10` | Planner context window (messages) |
//! | `MINARET_TOOL_TIMEOUT_SECS` | `10` | Per-step tool timeout |
//! | `MINARET_LLM_TIMEOUT_SECS` | `30` | Planning/synthesis call timeout |

use std::env;
use std::time::Duration;

use crate::errors::{AppError, AppResult};

/// Default conversation title for newly created conversations
pub const DEFAULT_CONVERSATION_TITLE: &str = "Islamic Guidance Chat";

/// Top-level server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// LLM provider settings
    pub llm: LlmConfig,
    /// Embedding + vector index settings
    pub retrieval: RetrievalConfig,
    /// Deterministic-tool upstream endpoints
    pub tool_apis: ToolApiConfig,
    /// Number of recent messages supplied to the planner as context
    pub history_limit: i64,
    /// Per-step tool invocation timeout
    pub tool_timeout: Duration,
}

/// LLM provider configuration (OpenRouter, OpenAI-compatible)
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key for the provider
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// Model used for both planning and synthesis calls
    pub model: String,
    /// Timeout applied to each completion call
    pub timeout: Duration,
}

/// Embedding and vector index configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Gemini API key for embeddings
    pub embed_api_key: String,
    /// Embedding model name
    pub embed_model: String,
    /// Vector index host URL
    pub index_host: String,
    /// Vector index API key
    pub index_api_key: String,
    /// Namespace queried within the index
    pub namespace: String,
}

/// Endpoints for the deterministic domain tools
#[derive(Debug, Clone)]
pub struct ToolApiConfig {
    /// Aladhan-compatible prayer timings API base URL
    pub prayer_base_url: String,
    /// Nominatim-compatible geocoding API base URL
    pub geocoding_base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if a numeric variable cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            http_port: parse_var("MINARET_HTTP_PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./data/minaret.db".to_owned()),
            llm: LlmConfig::from_env()?,
            retrieval: RetrievalConfig::from_env(),
            tool_apis: ToolApiConfig::from_env(),
            history_limit: parse_var("MINARET_HISTORY_LIMIT", 10)?,
            tool_timeout: Duration::from_secs(parse_var("MINARET_TOOL_TIMEOUT_SECS", 10)?),
        })
    }
}

impl LlmConfig {
    /// Load LLM provider settings from the environment
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the timeout cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_owned()),
            model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "openai/gpt-4o-mini".to_owned()),
            timeout: Duration::from_secs(parse_var("MINARET_LLM_TIMEOUT_SECS", 30)?),
        })
    }
}

impl RetrievalConfig {
    /// Load retrieval settings from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            embed_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            embed_model: env::var("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".to_owned()),
            index_host: env::var("PINECONE_INDEX_HOST").unwrap_or_default(),
            index_api_key: env::var("PINECONE_API_KEY").unwrap_or_default(),
            namespace: env::var("PINECONE_NAMESPACE")
                .unwrap_or_else(|_| "sahih_bukhari".to_owned()),
        }
    }
}

impl ToolApiConfig {
    /// Load tool API endpoints from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            prayer_base_url: env::var("ALADHAN_BASE_URL")
                .unwrap_or_else(|_| "https://api.aladhan.com".to_owned()),
            geocoding_base_url: env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_owned()),
        }
    }
}

/// Parse an environment variable with a default, failing on malformed values
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("Invalid value for {name}: {raw}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = ToolApiConfig::from_env();
        assert!(config.prayer_base_url.starts_with("https://"));
        assert!(config.geocoding_base_url.starts_with("https://"));
    }

    #[test]
    fn test_parse_var_default() {
        let port: u16 = parse_var("MINARET_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }
}

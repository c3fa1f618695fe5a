// ABOUTME: Main library entry point for the Minaret guidance agent backend
// ABOUTME: Exposes the agent orchestration engine, domain tools, and chat persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

#![deny(unsafe_code)]

//! # Minaret Server
//!
//! Backend for an Islamic guidance assistant. One inbound chat message is
//! turned into an ordered execution plan of domain-tool invocations and/or
//! knowledge-retrieval calls, the plan is executed with per-step failure
//! isolation, and a synthesized answer plus a full execution trace are
//! persisted alongside the conversation.
//!
//! ## Architecture
//!
//! - **Agent**: planner (LLM call #1), executor (tool walk + LLM call #2),
//!   orchestrator state machine, and execution recorder
//! - **Tools**: closed registry of schema-validated domain capabilities
//!   (prayer times, qibla bearing, Hijri conversion, halal places,
//!   knowledge search)
//! - **Retriever**: embedding + vector-index search over the hadith corpus
//! - **Database**: SQLite persistence for conversations, messages,
//!   executions, profiles, and audit events
//! - **LLM**: pluggable chat-completion provider (OpenRouter by default)
//!
//! ## Example
//!
//! ```rust,no_run
//! use minaret_server::config::ServerConfig;
//! use minaret_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Minaret server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Agent orchestration: plan, execute, synthesize, record
pub mod agent;

/// Environment-based server configuration
pub mod config;

/// SQLite persistence for conversations, executions, profiles, and audit
pub mod database;

/// Unified error handling with standard error codes and HTTP responses
pub mod errors;

/// Outbound clients for geocoding, prayer timings, and place lookup
pub mod external;

/// LLM provider abstraction and the OpenRouter implementation
pub mod llm;

/// Logging configuration and structured logging setup
pub mod logging;

/// Public API request/response types
pub mod models;

/// Shared server resources handed to routes and the orchestrator
pub mod resources;

/// Semantic knowledge retrieval over the hadith embedding index
pub mod retriever;

/// HTTP routes for the chat surface
pub mod routes;

/// Test support: scripted mock collaborators and in-memory databases
pub mod test_utils;

/// Tool registry, tool trait, and the built-in domain tools
pub mod tools;

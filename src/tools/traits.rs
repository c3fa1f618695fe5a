// ABOUTME: Defines the AgentTool trait and ToolCapabilities for the pluggable tools architecture
// ABOUTME: Tools implement this trait to be registered and executed via the ToolRegistry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Agent Tool Trait and Capabilities
//!
//! The core abstraction for planner-invocable tools. All tools implement
//! `AgentTool`, which provides:
//! - Tool metadata (name, description, input schema)
//! - Capability flags for filtering and diagnostics
//! - Async execution with context
//!
//! Capability flags let the executor reason about a tool without knowing
//! it: a `NETWORK` tool failing with `UpstreamUnavailable` is expected
//! weather, a `DETERMINISTIC` one failing the same way is a bug.

use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;

use crate::errors::AppResult;

use super::context::ToolExecutionContext;
use super::result::ToolResult;
use super::schema::JsonSchema;

bitflags! {
    /// Capabilities that tools declare for filtering and diagnostics.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool calls an external network service
        const NETWORK = 0b0000_0001;
        /// Tool is pure computation with no I/O
        const DETERMINISTIC = 0b0000_0010;
        /// Tool searches the knowledge corpus
        const RETRIEVAL = 0b0000_0100;
        /// Tool needs a location from arguments or the user profile
        const REQUIRES_LOCATION = 0b0000_1000;
    }
}

impl ToolCapabilities {
    /// Check if the tool reaches out over the network
    #[must_use]
    pub const fn is_network(self) -> bool {
        self.contains(Self::NETWORK)
    }

    /// Check if the tool needs a resolvable location
    #[must_use]
    pub const fn requires_location(self) -> bool {
        self.contains(Self::REQUIRES_LOCATION)
    }

    /// Get a description of all enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        if self.contains(Self::NETWORK) {
            parts.push("network");
        }
        if self.contains(Self::DETERMINISTIC) {
            parts.push("deterministic");
        }
        if self.contains(Self::RETRIEVAL) {
            parts.push("retrieval");
        }
        if self.contains(Self::REQUIRES_LOCATION) {
            parts.push("requires_location");
        }

        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// The trait all planner-invocable tools implement.
///
/// # Design Notes
///
/// - Tools are `Send + Sync` for safe sharing across async tasks
/// - `name()` returns `&'static str` for zero-allocation tool lookup
/// - `execute()` is async for I/O-bound operations; pure tools simply
///   never await
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Unique identifier for the tool (e.g., `get_prayer_times`)
    fn name(&self) -> &'static str;

    /// Human-readable description for LLM consumption
    ///
    /// The planner sees this verbatim, so it should say when the tool
    /// applies, not how it works.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> JsonSchema;

    /// Capability flags for filtering and diagnostics
    fn capabilities(&self) -> ToolCapabilities;

    /// Execute the tool with planned arguments and request context
    ///
    /// # Errors
    ///
    /// Returns `AppError` for validation failures or execution errors.
    /// Step-recoverable codes (`InvalidInput`, `NoDataFound`,
    /// `UpstreamUnavailable`) are absorbed by the executor as failed
    /// steps rather than aborting the run.
    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_describe() {
        let caps = ToolCapabilities::NETWORK | ToolCapabilities::REQUIRES_LOCATION;
        let described = caps.describe();
        assert!(described.contains("network"));
        assert!(described.contains("requires_location"));
    }

    #[test]
    fn test_empty_capabilities() {
        assert_eq!(ToolCapabilities::empty().describe(), "none");
    }
}

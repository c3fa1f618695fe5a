// ABOUTME: Defines ToolResult, the structured value a tool returns to the executor
// ABOUTME: Carries full JSON content plus a short summary for traces and synthesis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Tool Result Types
//!
//! Tools return a `ToolResult`: the full JSON content handed to the
//! synthesizer, plus a one-line summary used in the recorded execution
//! trace and the per-step view returned to clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result returned by tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The full result value, fed into synthesis
    pub content: Value,
    /// One-line human-readable summary for traces
    pub summary: String,
}

impl ToolResult {
    /// Create a result with content and a summary line
    #[must_use]
    pub fn new(content: Value, summary: impl Into<String>) -> Self {
        Self {
            content,
            summary: summary.into(),
        }
    }

    /// Create a result where the summary is the content itself
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            content: Value::String(message.clone()),
            summary: message,
        }
    }

    /// Create a result from a serializable value
    ///
    /// # Errors
    ///
    /// Returns the serialization error if the value cannot be converted to JSON
    pub fn from_serializable<T: Serialize>(
        value: &T,
        summary: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::to_value(value)?, summary))
    }
}

impl Default for ToolResult {
    fn default() -> Self {
        Self::new(Value::Null, "")
    }
}

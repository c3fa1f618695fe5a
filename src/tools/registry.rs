// ABOUTME: Central registry for agent tools with schema validation and execution
// ABOUTME: Fail-closed lookup keeps planner hallucinations from reaching execution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Tool Registry
//!
//! Central registry for agent tools, providing:
//! - Tool registration and lookup
//! - Schema generation for discovery and the planner brief
//! - Validated execution
//!
//! Lookup is fail-closed: a tool name the planner invented resolves to
//! `InvalidInput`, never to arbitrary behavior. Arguments are validated
//! against the tool's schema before execution.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

use super::context::ToolExecutionContext;
use super::result::ToolResult;
use super::schema::ToolSchema;
use super::traits::AgentTool;

/// Central registry for agent tools.
///
/// Built once at startup and then used immutably for lookups. Registered
/// tools are `Arc`-wrapped for sharing across concurrent runs.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool in the registry
    ///
    /// # Returns
    ///
    /// `true` if the tool was registered, `false` if a tool with the same name exists
    pub fn register(&mut self, tool: Arc<dyn AgentTool>) -> bool {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!("Tool '{}' is already registered, skipping", name);
            return false;
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.tools.insert(name, tool);
        true
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AgentTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all tool names
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// List schemas for all registered tools
    #[must_use]
    pub fn all_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                input_schema: tool.input_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Render the tool catalog as text for the planner prompt
    ///
    /// One line per tool: name, description, and the required argument
    /// names so the planner fills them in.
    #[must_use]
    pub fn planner_brief(&self) -> String {
        let mut lines: Vec<String> = self
            .tools
            .values()
            .map(|tool| {
                let schema = tool.input_schema();
                let required = schema
                    .required
                    .as_deref()
                    .unwrap_or(&[])
                    .join(", ");
                if required.is_empty() {
                    format!("- {}: {}", tool.name(), tool.description())
                } else {
                    format!(
                        "- {}: {} (required: {})",
                        tool.name(),
                        tool.description(),
                        required
                    )
                }
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Execute a tool by name
    ///
    /// Looks up the tool, validates `args` against its schema, and runs it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown tool or arguments that fail
    /// schema validation, or whatever error the tool itself produces.
    pub async fn execute(
        &self,
        name: &str,
        args: serde_json::Value,
        context: &ToolExecutionContext,
    ) -> AppResult<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown tool: {name}")))?;

        tool.input_schema().validate_args(&args)?;

        tool.execute(args, context).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("tools", &self.tool_names())
            .finish()
    }
}

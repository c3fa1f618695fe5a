// ABOUTME: Pluggable tools architecture for the agent pipeline
// ABOUTME: Trait, registry, schemas, execution context, and built-in implementations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Tools
//!
//! Everything the planner can invoke lives here:
//! - `traits` - the `AgentTool` trait and capability flags
//! - `registry` - fail-closed lookup and validated execution
//! - `schema` - JSON Schema types for discovery and argument validation
//! - `context` - per-request context handed to every tool
//! - `result` - structured tool output
//! - `implementations` - the built-in tools and registry factory

pub mod context;
pub mod implementations;
pub mod registry;
pub mod result;
pub mod schema;
pub mod traits;

pub use context::ToolExecutionContext;
pub use implementations::build_registry;
pub use registry::ToolRegistry;
pub use result::ToolResult;
pub use schema::{JsonSchema, PropertySchema, ToolSchema};
pub use traits::{AgentTool, ToolCapabilities};

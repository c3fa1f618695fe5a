// ABOUTME: The agent pipeline: plan, execute, synthesize, record
// ABOUTME: Orchestrator facade plus its planner, executor, and recorder parts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Agent Pipeline
//!
//! One user message becomes an ordered plan of tool invocations, an
//! executed step trace, a synthesized answer, and a recorded execution:
//!
//! - `plan` - the plan and step types
//! - `planner` - model call #1: message + history + catalog to plan
//! - `executor` - fail-soft step execution and model call #2 (synthesis)
//! - `recorder` - best-effort execution trace persistence
//! - `orchestrator` - the facade tying it all together

pub mod executor;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod recorder;

pub use executor::{ExecutionOutcome, Executor};
pub use orchestrator::{AgentRunInput, AgentRunOutput, Orchestrator};
pub use plan::{ExecutionPlan, PlanStep, StepRecord};
pub use planner::Planner;
pub use recorder::ExecutionRecorder;

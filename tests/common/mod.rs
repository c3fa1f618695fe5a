// ABOUTME: Shared setup helpers for the integration tests
// ABOUTME: Builds server resources over an in-memory database and scripted mocks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use minaret_server::resources::ServerResources;
use minaret_server::test_utils::{build_test_registry, test_database, MockLlmProvider};
use minaret_server::tools::ToolRegistry;

pub const HISTORY_LIMIT: i64 = 10;

/// Resources over an in-memory database and the default mock registry
pub async fn test_resources(llm: MockLlmProvider) -> Arc<ServerResources> {
    test_resources_with_registry(llm, build_test_registry()).await
}

/// Resources over an in-memory database and a caller-provided registry
pub async fn test_resources_with_registry(
    llm: MockLlmProvider,
    registry: ToolRegistry,
) -> Arc<ServerResources> {
    let database = test_database().await;
    Arc::new(ServerResources::assemble(
        database,
        Arc::new(llm),
        Arc::new(registry),
        HISTORY_LIMIT,
        Duration::from_secs(5),
    ))
}

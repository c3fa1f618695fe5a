// ABOUTME: Shared server resource container constructed once at startup
// ABOUTME: Wires database, LLM provider, tool registry, and the orchestrator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Server Resources
//!
//! Everything request handlers need, assembled once and shared as
//! `Arc<ServerResources>`. The tool registry is built at startup and
//! immutable thereafter; it carries no per-request state.

use std::sync::Arc;

use crate::agent::{ExecutionRecorder, Executor, Orchestrator, Planner};
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::external::{AladhanClient, NominatimClient, StaticPlacesDirectory};
use crate::llm::{GeminiEmbedder, LlmProvider, OpenRouterConfig, OpenRouterProvider};
use crate::retriever::{KnowledgeRetriever, PineconeIndex};
use crate::tools::{build_registry, ToolRegistry};

/// Shared resources for the server
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Immutable tool registry
    pub registry: Arc<ToolRegistry>,
    /// The agent facade
    pub orchestrator: Orchestrator,
}

impl ServerResources {
    /// Assemble resources from pre-built collaborators
    ///
    /// Tests use this with mock providers and an in-memory database.
    #[must_use]
    pub fn assemble(
        database: Database,
        llm: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        history_limit: i64,
        tool_timeout: std::time::Duration,
    ) -> Self {
        let planner = Planner::new(Arc::clone(&llm), Arc::clone(&registry));
        let executor = Executor::new(llm, Arc::clone(&registry), tool_timeout);
        let recorder = ExecutionRecorder::new(database.executions(), database.audit());
        let orchestrator = Orchestrator::new(
            database.chat(),
            database.profiles(),
            planner,
            executor,
            recorder,
            history_limit,
        );

        Self {
            database,
            registry,
            orchestrator,
        }
    }

    /// Build production resources from configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the database connection or a client
    /// constructor fails.
    pub async fn from_config(config: &ServerConfig) -> AppResult<Self> {
        let database = Database::new(&config.database_url).await?;

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OpenRouterProvider::new(OpenRouterConfig::from(&config.llm))?);

        let embedder = Arc::new(GeminiEmbedder::new(&config.retrieval)?);
        let index = Arc::new(PineconeIndex::new(
            config.retrieval.index_host.clone(),
            config.retrieval.index_api_key.clone(),
        )?);
        let retriever = Arc::new(KnowledgeRetriever::new(
            embedder,
            index,
            config.retrieval.namespace.clone(),
        ));

        let geocoder = Arc::new(NominatimClient::new(
            config.tool_apis.geocoding_base_url.clone(),
        ));
        let prayer_api = Arc::new(AladhanClient::new(config.tool_apis.prayer_base_url.clone()));

        let registry = Arc::new(build_registry(
            geocoder,
            prayer_api,
            Arc::new(StaticPlacesDirectory),
            retriever,
            Arc::clone(&llm),
        ));

        Ok(Self::assemble(
            database,
            llm,
            registry,
            config.history_limit,
            config.tool_timeout,
        ))
    }
}

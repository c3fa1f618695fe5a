// ABOUTME: Unified error handling with standard error codes and HTTP response mapping
// ABOUTME: Defines the step-level and run-level failure taxonomy for agent execution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

//! # Unified Error Handling System
//!
//! Central error types for the Minaret server. The code taxonomy follows the
//! agent execution model: step-level failures (`InvalidInput`,
//! `UpstreamUnavailable`, `NoDataFound`) are caught and recorded by the
//! executor without aborting a run, while `NotAuthorized` rejects a run
//! before any planning or persistence. `PlanningFailed` and
//! `SynthesisFailed` mark the two degradation paths that still produce a
//! user-visible answer.

use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Conversation or resource belongs to another user
    #[serde(rename = "NOT_AUTHORIZED")]
    NotAuthorized,
    /// Caller input does not match the expected schema
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// Valid call, empty result; absence of evidence, not a fault
    #[serde(rename = "NO_DATA_FOUND")]
    NoDataFound,
    /// Tool, retrieval, or provider backend unreachable or erroring
    #[serde(rename = "UPSTREAM_UNAVAILABLE")]
    UpstreamUnavailable,
    /// Model produced an unparsable execution plan
    #[serde(rename = "PLANNING_FAILED")]
    PlanningFailed,
    /// Final answer composition failed
    #[serde(rename = "SYNTHESIS_FAILED")]
    SynthesisFailed,
    /// Requested resource does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
    /// Configuration missing or invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Unclassified internal error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotAuthorized => 403,
            Self::NoDataFound | Self::ResourceNotFound => 404,
            Self::PlanningFailed | Self::SynthesisFailed => 502,
            Self::UpstreamUnavailable => 503,
            Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigError
            | Self::InternalError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::NotAuthorized => "You do not have access to this resource",
            Self::InvalidInput => "The provided input is invalid",
            Self::NoDataFound => "No data was found for this request",
            Self::UpstreamUnavailable => "An upstream service is currently unavailable",
            Self::PlanningFailed => "The execution plan could not be generated",
            Self::SynthesisFailed => "The final response could not be composed",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
        }
    }

    /// Whether the executor treats this failure as step-local and continues
    /// the run instead of aborting it
    #[must_use]
    pub const fn is_step_recoverable(self) -> bool {
        matches!(
            self,
            Self::InvalidInput | Self::UpstreamUnavailable | Self::NoDataFound
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional key-value context
    pub details: serde_json::Value,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
            source: None,
        }
    }

    /// Add details to the error
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience constructors for common errors
impl AppError {
    /// Ownership mismatch on a conversation or resource
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAuthorized, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Valid call with an empty result
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NoDataFound, message)
    }

    /// Named upstream service unreachable or erroring
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::UpstreamUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Model plan output unparsable
    pub fn planning_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PlanningFailed, message)
    }

    /// Final composition failed
    pub fn synthesis_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SynthesisFailed, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Conversion from `anyhow::Error` for binary edges
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::NotAuthorized.http_status(), 403);
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::UpstreamUnavailable.http_status(), 503);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_step_recoverable_taxonomy() {
        assert!(ErrorCode::InvalidInput.is_step_recoverable());
        assert!(ErrorCode::UpstreamUnavailable.is_step_recoverable());
        assert!(ErrorCode::NoDataFound.is_step_recoverable());
        assert!(!ErrorCode::NotAuthorized.is_step_recoverable());
        assert!(!ErrorCode::PlanningFailed.is_step_recoverable());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = AppError::upstream("geocoding", "connection refused");
        let response = ErrorResponse::from(error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("UPSTREAM_UNAVAILABLE"));
        assert!(json.contains("geocoding"));
    }
}

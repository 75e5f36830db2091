// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Maestro
//!
//! This module defines all error types used throughout the runtime.

use thiserror::Error;

/// Main error type for Maestro operations
#[derive(Error, Debug)]
pub enum MaestroError {
    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration is present but invalid
    #[error("Configuration error:\n{0}")]
    Configuration(String),

    /// An agent name is already registered
    #[error("Agent '{0}' is already registered")]
    DuplicateAgent(String),

    /// An agent exceeded its tool-loop step budget
    #[error("Agent '{agent}' exceeded the recursion limit of {limit} steps")]
    RecursionExceeded { agent: String, limit: u32 },

    /// The top-level supervisor exceeded its time budget
    #[error("Supervisor timed out after {0:.1}s")]
    SupervisorTimeout(f64),

    /// The formatter exceeded its time budget
    #[error("Formatter timed out after {0:.1}s")]
    FormatterTimeout(f64),

    /// Tool execution errors
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// A knowledge read escaped its category root
    #[error("Path '{0}' escapes the knowledge directory")]
    PathTraversal(String),

    /// A remote access was denied by the URL security policy
    #[error("URL blocked by security policy: {0}")]
    UrlBlocked(String),

    /// Knowledge document errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,

    /// The provider returned a 5xx error
    #[error("API server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The provider rejected the request (4xx other than auth/rate)
    #[error("API client error ({status}): {message}")]
    ClientError { status: u16, message: String },

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for Maestro operations
pub type Result<T> = std::result::Result<T, MaestroError>;

impl From<serde_yaml::Error> for MaestroError {
    fn from(err: serde_yaml::Error) -> Self {
        MaestroError::Yaml(err.to_string())
    }
}

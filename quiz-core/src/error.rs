// SPDX-License-Identifier: MIT
//
// VaultGuard Quiz Acquisition
// Copyright (c) 2025 VaultGuard Contributors
//
// https://github.com/vaultguard/quiz-acquisition

//! Error types for quiz acquisition
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error handling.
//! Every variant except [`Error::NoQuizAvailable`] is absorbed by the service into a
//! locally sourced quiz.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a provider payload could not be turned into a quiz
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Outer provider envelope absent, empty or malformed
    #[error("malformed provider envelope: {0}")]
    Envelope(String),

    /// Embedded text carries no `{ ... }` span
    #[error("no JSON object found in model output")]
    NoJsonBraces,

    /// Extracted span is not delimited like a JSON document
    #[error("extracted text is not shaped like JSON")]
    Shape,

    /// Quiz record missing or carrying invalid fields
    #[error("quiz record failed validation: {0}")]
    Schema(String),
}

impl ParseError {
    /// Short stable code for this failure
    pub fn reason(&self) -> &'static str {
        match self {
            ParseError::Envelope(_) => "envelope",
            ParseError::NoJsonBraces => "no-json-braces",
            ParseError::Shape => "shape",
            ParseError::Schema(_) => "schema",
        }
    }
}

/// Core error type for quiz acquisition
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bundled or configured dataset could not be loaded
    #[error("Dataset load error: {0}")]
    DatasetLoad(String),

    /// Network communication failed
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A single attempt exceeded its time budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key, request never sent
    #[error("API key is missing")]
    MissingApiKey,

    /// Host reports no connectivity
    #[error("No network connection")]
    NoNetwork,

    /// Endpoint or key not configured
    #[error("API not configured")]
    NotConfigured,

    /// Concurrency budget exhausted
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider output unusable
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Every attempt failed
    #[error("Failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<Error> },

    /// Local dataset empty, nothing to fall back on
    #[error("No quiz available: local dataset is empty")]
    NoQuizAvailable,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if error is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::Timeout(_)
                | Error::HttpStatus { .. }
                | Error::RateLimited
                | Error::Parse(_)
        )
    }

    /// Short stable code handed to failure callbacks
    pub fn reason(&self) -> &'static str {
        match self {
            Error::DatasetLoad(_) => "dataset-load",
            Error::Network(_) => "network",
            Error::Timeout(_) => "timeout",
            Error::HttpStatus { .. } => "http-status",
            Error::Config(_) => "config",
            Error::MissingApiKey => "missing-api-key",
            Error::NoNetwork => "no-network",
            Error::NotConfigured => "not-configured",
            Error::RateLimited => "rate-limited",
            Error::Parse(e) => e.reason(),
            Error::Exhausted { .. } => "exhausted",
            Error::NoQuizAvailable => "no-quiz-available",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// SPDX-License-Identifier: MIT
//
// VaultGuard Quiz Acquisition
// Copyright (c) 2025 VaultGuard Contributors
//
// https://github.com/vaultguard/quiz-acquisition

//! Quiz Acquisition Core Library
//!
//! Obtains a multiple-choice cybersecurity quiz from a generative AI provider and
//! guarantees that a usable quiz is always produced: when the network, the API or
//! the model's output format fails, a quiz from the bundled local dataset is
//! delivered instead.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `quiz`: Validated quiz item and its wire record
//! - `store`: Read-only local dataset used as the fallback source
//! - `protocol`: Provider request and response envelope types
//! - `parser`: Defensive extraction of a quiz from model output
//! - `executor`: Single HTTPS request to the provider
//! - `retry`: Exponential backoff over repeated attempts
//! - `admission`: In-flight request limit and loading signal
//! - `connectivity`: Host-reported network reachability
//! - `service`: The façade the game layer calls
//! - `config`: Configuration management with validation
//! - `metrics`: Acquisition counters
//! - `error`: Unified error types
//!
//! # Example
//!
//! ```no_run
//! use quiz_core::{config::QuizConfig, service::QuizService};
//!
//! # async fn run() -> quiz_core::Result<()> {
//! let service = QuizService::new(QuizConfig::from_env()?)?;
//! let delivery = service.acquire_with_retry("Phishing").await?;
//! println!("{}", delivery.quiz.question());
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod parser;
pub mod protocol;
pub mod quiz;
pub mod retry;
pub mod service;
pub mod store;

pub use error::{Error, ParseError, Result};
pub use quiz::{OptionLabel, QuizItem};
pub use service::{Delivery, QuizOrigin, QuizService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default limit of provider requests in flight at once
pub const MAX_CONCURRENT_REQUESTS: usize = 3;

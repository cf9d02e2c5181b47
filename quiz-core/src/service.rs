// SPDX-License-Identifier: MIT
//
// VaultGuard Quiz Acquisition
// Copyright (c) 2025 VaultGuard Contributors
//
// https://github.com/vaultguard/quiz-acquisition

//! Quiz acquisition service
//!
//! The entry point the game layer talks to. A request passes the pre-flight
//! gates (offline mode, connectivity, configuration, concurrency budget), may go
//! to the provider through a [`Transport`], and on any failure is answered from
//! the [`LocalQuizStore`].
//!
//! ```text
//! request ──> gates ──> transport ──> parser ──> quiz (AI)
//!               │           │            │
//!               └───────────┴────────────┴──> local store ──> quiz (Local)
//! ```
//!
//! Two surfaces are offered: [`QuizService::acquire`] returns a [`Delivery`]
//! directly, and [`QuizService::request_quiz`] runs the same flow on a spawned
//! task and reports through a success/failure callback pair.

use crate::admission::{InFlightGauge, InFlightSlot};
use crate::config::QuizConfig;
use crate::connectivity::{Connectivity, ReachabilityFlag};
use crate::executor::{ExecutorConfig, HttpExecutor, Transport};
use crate::metrics::Metrics;
use crate::parser;
use crate::quiz::QuizItem;
use crate::retry::RetryPolicy;
use crate::store::LocalQuizStore;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Where a delivered quiz came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOrigin {
    Ai,
    Local,
}

/// A quiz ready to show
#[derive(Debug)]
pub struct Delivery {
    pub quiz: QuizItem,
    pub origin: QuizOrigin,
    /// Failure that sent the request to the local store, if any
    pub notice: Option<Error>,
}

enum Admission {
    Offline,
    Rejected(Error),
    Admitted(InFlightSlot),
}

/// Quiz acquisition façade
pub struct QuizService<T = HttpExecutor> {
    config: QuizConfig,
    store: LocalQuizStore,
    transport: T,
    connectivity: Arc<dyn Connectivity>,
    gauge: InFlightGauge,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl QuizService<HttpExecutor> {
    /// Build the service with the HTTP executor and the configured dataset
    pub fn new(config: QuizConfig) -> Result<Self> {
        config.validate()?;
        let store = LocalQuizStore::initialize(config.dataset_path.as_deref());
        let transport = HttpExecutor::new(ExecutorConfig::from(&config))?;
        Ok(Self::with_transport(config, store, transport))
    }
}

impl<T: Transport> QuizService<T> {
    pub fn with_transport(config: QuizConfig, store: LocalQuizStore, transport: T) -> Self {
        let gauge = InFlightGauge::new(config.max_concurrent_requests);
        let retry = RetryPolicy::from(&config);

        info!(
            "Quiz service ready: {} local quizzes, API {}, offline mode {}",
            store.len(),
            if config.is_configured() { "configured" } else { "not configured" },
            config.offline_mode
        );

        Self {
            config,
            store,
            transport,
            connectivity: Arc::new(ReachabilityFlag::default()),
            gauge,
            retry,
            metrics: Metrics::new(),
        }
    }

    /// Replace the reachability source
    pub fn with_connectivity(mut self, connectivity: impl Connectivity + 'static) -> Self {
        self.connectivity = Arc::new(connectivity);
        self
    }

    /// Replace the retry policy derived from configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Obtain a quiz with a single provider attempt
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn acquire(&self, topic: &str) -> Result<Delivery> {
        self.acquire_inner(topic, None).await
    }

    /// Obtain a quiz, retrying the provider with exponential backoff
    ///
    /// The attempt limit is the configured one (`QUIZ_MAX_ATTEMPTS` or
    /// [`QuizService::with_retry_policy`]); use
    /// [`QuizService::acquire_with_attempts`] to set it per call.
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn acquire_with_retry(&self, topic: &str) -> Result<Delivery> {
        self.acquire_inner(topic, Some(self.retry.clone())).await
    }

    /// Retrying variant with a per-call attempt limit, at least one
    #[instrument(skip(self), fields(request_id = %Uuid::new_v4()))]
    pub async fn acquire_with_attempts(&self, topic: &str, max_attempts: u32) -> Result<Delivery> {
        let policy = RetryPolicy {
            max_attempts: max_attempts.max(1),
            ..self.retry.clone()
        };
        self.acquire_inner(topic, Some(policy)).await
    }

    async fn acquire_inner(&self, topic: &str, retry: Option<RetryPolicy>) -> Result<Delivery> {
        self.metrics.record_request();

        let topic = topic.trim();
        if topic.is_empty() {
            info!("No topic given: serving local quiz");
            return self.fallback(topic, None);
        }

        let slot = match self.admit() {
            Admission::Offline => {
                info!("Offline mode: serving local quiz");
                return self.fallback(topic, None);
            }
            Admission::Rejected(reason) => {
                warn!("Skipping AI request: {}", reason);
                return self.fallback(topic, Some(reason));
            }
            Admission::Admitted(slot) => slot,
        };

        let outcome = match retry {
            Some(policy) => self.attempt_with_retry(topic, slot, &policy).await,
            None => self.attempt(topic, slot).await,
        };

        match outcome {
            Ok(quiz) => {
                info!("AI quiz delivered for topic '{}'", quiz.topic());
                Ok(Delivery {
                    quiz,
                    origin: QuizOrigin::Ai,
                    notice: None,
                })
            }
            Err(e) => {
                warn!("AI quiz unavailable ({}), using local dataset", e);
                self.fallback(topic, Some(e))
            }
        }
    }

    /// Pre-flight gates, in order
    fn admit(&self) -> Admission {
        if self.config.offline_mode {
            return Admission::Offline;
        }
        if !self.is_network_available() {
            return Admission::Rejected(Error::NoNetwork);
        }
        if !self.is_configured() {
            return Admission::Rejected(Error::NotConfigured);
        }
        match self.gauge.try_acquire() {
            Some(slot) => Admission::Admitted(slot),
            None => {
                self.metrics.record_rate_limited();
                Admission::Rejected(Error::RateLimited)
            }
        }
    }

    /// One provider round trip while holding `slot`
    async fn attempt(&self, topic: &str, slot: InFlightSlot) -> Result<QuizItem> {
        let _slot = slot;
        let budget = self.config.request_timeout();
        let started = Instant::now();

        self.metrics.record_attempt();

        let result = match timeout(budget, self.transport.execute(topic)).await {
            Ok(Ok(raw)) => parser::parse(&raw, topic).map_err(Error::from),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout(budget)),
        };

        match result {
            Ok(quiz) => {
                self.metrics
                    .record_served_ai(started.elapsed().as_millis() as u64);
                Ok(quiz)
            }
            Err(e) => {
                self.metrics
                    .record_attempt_failure(matches!(e, Error::Parse(_)));
                Err(e)
            }
        }
    }

    /// Retry loop; every attempt after the first needs a fresh slot
    async fn attempt_with_retry(
        &self,
        topic: &str,
        first: InFlightSlot,
        policy: &RetryPolicy,
    ) -> Result<QuizItem> {
        let mut first = Some(first);
        let max_attempts = policy.max_attempts;

        policy
            .execute(|attempt| {
                let slot = first.take().or_else(|| self.gauge.try_acquire());
                async move {
                    debug!("Attempt {}/{} for topic '{}'", attempt, max_attempts, topic);
                    match slot {
                        Some(slot) => self.attempt(topic, slot).await,
                        None => {
                            self.metrics.record_rate_limited();
                            Err(Error::RateLimited)
                        }
                    }
                }
            })
            .await
    }

    fn fallback(&self, topic: &str, notice: Option<Error>) -> Result<Delivery> {
        match self.store.find_by_topic(topic) {
            Ok(quiz) => {
                self.metrics.record_served_local();
                debug!("Local quiz delivered for topic '{}'", topic);
                Ok(Delivery {
                    quiz,
                    origin: QuizOrigin::Local,
                    notice,
                })
            }
            Err(e) => {
                self.metrics.record_no_quiz();
                match notice {
                    Some(cause) => error!(
                        "No quiz available for topic '{}' after AI failure ({}): local dataset is empty",
                        topic, cause
                    ),
                    None => error!(
                        "No quiz available for topic '{}': local dataset is empty",
                        topic
                    ),
                }
                Err(e)
            }
        }
    }

    /// Local quiz for `topic`, random one if the topic is unknown
    pub fn load_local_quiz(&self, topic: &str) -> Result<QuizItem> {
        self.store.find_by_topic(topic)
    }

    pub fn random_local_quiz(&self) -> Result<QuizItem> {
        self.store.random_item()
    }

    /// Check a player's answer, case-insensitively
    pub fn validate_answer(&self, quiz: &QuizItem, chosen: &str) -> bool {
        if chosen.trim().is_empty() {
            warn!("Empty answer submitted");
            return false;
        }

        let correct = quiz.is_correct(chosen);
        debug!(
            "Answer {} (chosen: {}, correct: {})",
            if correct { "correct" } else { "wrong" },
            chosen.trim(),
            quiz.correct_label()
        );
        correct
    }

    pub fn is_network_available(&self) -> bool {
        self.connectivity.is_available()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Network requests currently in flight
    pub fn in_flight(&self) -> usize {
        self.gauge.in_flight()
    }

    /// True while any provider request is in flight
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.gauge.loading()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn store(&self) -> &LocalQuizStore {
        &self.store
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Human-readable diagnostic report
    pub fn system_status(&self) -> String {
        let mut status = String::new();
        let on_off = |flag: bool| if flag { "Enabled" } else { "Disabled" };

        let _ = writeln!(status, "=== Quiz Acquisition Status ===");
        let _ = writeln!(
            status,
            "Network: {}",
            if self.is_network_available() { "Connected" } else { "Offline" }
        );
        let _ = writeln!(
            status,
            "API Config: {}",
            if self.is_configured() { "Configured" } else { "Not Configured" }
        );
        match self.store.loaded_at() {
            Some(at) => {
                let _ = writeln!(
                    status,
                    "Local Database: Loaded ({} quiz, {} topics, at {})",
                    self.store.len(),
                    self.store.topics().len(),
                    at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            None => {
                let _ = writeln!(status, "Local Database: Not Loaded");
            }
        }
        let _ = writeln!(
            status,
            "Active Requests: {}/{}",
            self.gauge.in_flight(),
            self.gauge.limit()
        );
        let _ = writeln!(status, "Timeout: {}s", self.config.request_timeout_secs);
        let _ = writeln!(status, "Max Attempts: {}", self.retry.max_attempts);
        match self.retry.max_backoff {
            Some(cap) => {
                let _ = writeln!(status, "Backoff: {:?} x 2^n, capped at {:?}", self.retry.backoff_unit, cap);
            }
            None => {
                let _ = writeln!(status, "Backoff: {:?} x 2^n, uncapped", self.retry.backoff_unit);
            }
        }
        let _ = writeln!(status, "Offline Mode: {}", on_off(self.config.offline_mode));
        status.push_str(&self.metrics.summary());
        status
    }
}

impl<T: Transport + 'static> QuizService<T> {
    /// Callback form of [`QuizService::acquire`]
    ///
    /// `on_success` runs exactly once with the delivered quiz. `on_failure` runs
    /// first if the AI path failed. When no quiz exists at all, `on_failure`
    /// receives [`Error::NoQuizAvailable`] and `on_success` never runs.
    /// Must be called within a Tokio runtime.
    pub fn request_quiz<S, F>(
        self: &Arc<Self>,
        topic: impl Into<String>,
        on_success: S,
        on_failure: F,
    ) -> JoinHandle<()>
    where
        S: FnOnce(QuizItem) + Send + 'static,
        F: FnMut(&Error) + Send + 'static,
    {
        self.spawn_request(topic.into(), false, on_success, on_failure)
    }

    /// Callback form of [`QuizService::acquire_with_retry`]
    pub fn request_quiz_with_retry<S, F>(
        self: &Arc<Self>,
        topic: impl Into<String>,
        on_success: S,
        on_failure: F,
    ) -> JoinHandle<()>
    where
        S: FnOnce(QuizItem) + Send + 'static,
        F: FnMut(&Error) + Send + 'static,
    {
        self.spawn_request(topic.into(), true, on_success, on_failure)
    }

    fn spawn_request<S, F>(
        self: &Arc<Self>,
        topic: String,
        retrying: bool,
        on_success: S,
        mut on_failure: F,
    ) -> JoinHandle<()>
    where
        S: FnOnce(QuizItem) + Send + 'static,
        F: FnMut(&Error) + Send + 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let result = if retrying {
                service.acquire_with_retry(&topic).await
            } else {
                service.acquire(&topic).await
            };

            match result {
                Ok(Delivery { quiz, notice, .. }) => {
                    if let Some(notice) = notice {
                        on_failure(&notice);
                    }
                    on_success(quiz);
                }
                Err(e) => on_failure(&e),
            }
        })
    }
}

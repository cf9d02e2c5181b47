// SPDX-License-Identifier: MIT
//
// VaultGuard Quiz Acquisition
// Copyright (c) 2025 VaultGuard Contributors
//
// https://github.com/vaultguard/quiz-acquisition

//! Acquisition counters and AI latency tracking

use parking_lot::RwLock;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Latency samples kept before the oldest half is discarded
const LATENCY_WINDOW: usize = 1000;

/// Shared metrics handle
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    start_time: Instant,

    // Delivery
    requests_total: AtomicU64,
    served_ai: AtomicU64,
    served_local: AtomicU64,
    no_quiz: AtomicU64,

    // Network attempts
    attempts_total: AtomicU64,
    attempts_failed: AtomicU64,
    parse_failures: AtomicU64,
    rate_limited: AtomicU64,

    // Successful AI latency (milliseconds)
    ai_latencies: RwLock<Vec<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                start_time: Instant::now(),
                requests_total: AtomicU64::new(0),
                served_ai: AtomicU64::new(0),
                served_local: AtomicU64::new(0),
                no_quiz: AtomicU64::new(0),
                attempts_total: AtomicU64::new(0),
                attempts_failed: AtomicU64::new(0),
                parse_failures: AtomicU64::new(0),
                rate_limited: AtomicU64::new(0),
                ai_latencies: RwLock::new(Vec::with_capacity(LATENCY_WINDOW)),
            }),
        }
    }

    pub fn record_request(&self) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_served_ai(&self, latency_millis: u64) {
        self.inner.served_ai.fetch_add(1, Ordering::Relaxed);

        let mut latencies = self.inner.ai_latencies.write();
        latencies.push(latency_millis);
        if latencies.len() > LATENCY_WINDOW {
            latencies.drain(0..LATENCY_WINDOW / 2);
        }
    }

    pub fn record_served_local(&self) {
        self.inner.served_local.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_quiz(&self) {
        self.inner.no_quiz.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.inner.attempts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt_failure(&self, parse_failure: bool) {
        self.inner.attempts_failed.fetch_add(1, Ordering::Relaxed);
        if parse_failure {
            self.inner.parse_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rate_limited(&self) {
        self.inner.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.inner.requests_total.load(Ordering::Relaxed)
    }

    pub fn served_ai(&self) -> u64 {
        self.inner.served_ai.load(Ordering::Relaxed)
    }

    pub fn served_local(&self) -> u64 {
        self.inner.served_local.load(Ordering::Relaxed)
    }

    pub fn no_quiz(&self) -> u64 {
        self.inner.no_quiz.load(Ordering::Relaxed)
    }

    pub fn attempts_total(&self) -> u64 {
        self.inner.attempts_total.load(Ordering::Relaxed)
    }

    pub fn attempts_failed(&self) -> u64 {
        self.inner.attempts_failed.load(Ordering::Relaxed)
    }

    pub fn parse_failures(&self) -> u64 {
        self.inner.parse_failures.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> u64 {
        self.inner.rate_limited.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    pub fn latency_percentile(&self, percentile: f64) -> Option<u64> {
        let latencies = self.inner.ai_latencies.read();
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let index = ((sorted.len() as f64 * percentile).ceil() as usize).min(sorted.len() - 1);
        Some(sorted[index])
    }

    pub fn latency_p50(&self) -> Option<u64> {
        self.latency_percentile(0.50)
    }

    pub fn latency_p95(&self) -> Option<u64> {
        self.latency_percentile(0.95)
    }

    /// Multi-line human-readable summary
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Requests: {} (AI: {}, Local: {}, None: {}) in {}s",
            self.requests_total(),
            self.served_ai(),
            self.served_local(),
            self.no_quiz(),
            self.uptime_seconds()
        );
        let _ = writeln!(
            out,
            "Attempts: {} ({} failed, {} unparseable), rate limited: {}",
            self.attempts_total(),
            self.attempts_failed(),
            self.parse_failures(),
            self.rate_limited()
        );
        match (self.latency_p50(), self.latency_p95()) {
            (Some(p50), Some(p95)) => {
                let _ = writeln!(out, "AI latency: p50 {}ms, p95 {}ms", p50, p95);
            }
            _ => {
                let _ = writeln!(out, "AI latency: n/a");
            }
        }
        out
    }
}

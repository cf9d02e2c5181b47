//! Admission control for network attempts
//!
//! [`InFlightGauge`] counts requests currently on the wire and refuses new ones
//! past its limit. Admission is a compare-and-swap, so concurrent callers can
//! never push the count beyond the limit. Each admitted request holds an
//! [`InFlightSlot`]; dropping it (success, error, timeout or cancellation)
//! gives the slot back.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct InFlightGauge {
    inner: Arc<GaugeInner>,
}

#[derive(Debug)]
struct GaugeInner {
    in_flight: AtomicUsize,
    limit: usize,
    loading: watch::Sender<bool>,
}

impl GaugeInner {
    /// Bring the loading flag in line with the counter
    fn publish(&self) {
        self.loading.send_if_modified(|loading| {
            let busy = self.in_flight.load(Ordering::SeqCst) > 0;
            if *loading != busy {
                *loading = busy;
                true
            } else {
                false
            }
        });
    }
}

impl InFlightGauge {
    pub fn new(limit: usize) -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            inner: Arc::new(GaugeInner {
                in_flight: AtomicUsize::new(0),
                limit,
                loading,
            }),
        }
    }

    /// Take a slot if one is free
    pub fn try_acquire(&self) -> Option<InFlightSlot> {
        let mut current = self.inner.in_flight.load(Ordering::SeqCst);
        loop {
            if current >= self.inner.limit {
                return None;
            }
            match self.inner.in_flight.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.inner.publish();
        Some(InFlightSlot {
            gauge: Arc::clone(&self.inner),
        })
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    /// True while at least one slot is held
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }
}

/// One admitted network attempt
#[derive(Debug)]
#[must_use = "the slot is released as soon as it is dropped"]
pub struct InFlightSlot {
    gauge: Arc<GaugeInner>,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.gauge.publish();
    }
}

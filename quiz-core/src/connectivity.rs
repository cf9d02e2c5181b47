//! Network reachability as reported by the host platform

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of truth for "is there a network at all"
pub trait Connectivity: Send + Sync {
    fn is_available(&self) -> bool;
}

/// Reachability flag the host flips when the platform reports a change
#[derive(Debug, Clone)]
pub struct ReachabilityFlag {
    reachable: Arc<AtomicBool>,
}

impl Default for ReachabilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReachabilityFlag {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
        }
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }
}

impl Connectivity for ReachabilityFlag {
    fn is_available(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }
}

/// Headless hosts with no reachability reporting
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Connectivity for AlwaysOnline {
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_shared_between_clones() {
        let flag = ReachabilityFlag::default();
        let host_side = flag.clone();
        assert!(flag.is_available());

        host_side.set(false);
        assert!(!flag.is_available());
    }
}

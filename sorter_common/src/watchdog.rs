//! # Peer Heartbeat Health
//!
//! Shared vocabulary for the heartbeat watchdog. The node binary owns the
//! timer threads; this module only classifies a heartbeat age against a
//! timeout so the rule is testable without threads.

use std::time::Duration;

/// Health of the peer node as seen through its heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Last peer heartbeat is within the timeout.
    Healthy,
    /// Peer heartbeat is older than the timeout (peer hung or link down).
    Stale {
        /// Time since the last peer heartbeat.
        age: Duration,
    },
}

impl HealthStatus {
    /// Classify a heartbeat `age` against `timeout`.
    ///
    /// An age equal to the timeout is still healthy.
    #[inline]
    pub fn classify(age: Duration, timeout: Duration) -> Self {
        if age > timeout {
            Self::Stale { age }
        } else {
            Self::Healthy
        }
    }

    #[inline]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

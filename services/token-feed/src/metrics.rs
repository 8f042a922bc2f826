//! Counters for the live feed
//!
//! Tracks emissions, skipped ticks, isolated callback failures, applied
//! upserts and failed fetches. Shared by `Arc` between the channel, the
//! orchestrator and the loader.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Core metrics for the token feed.
#[derive(Debug, Default)]
pub struct FeedMetrics {
    pub emissions: AtomicU64,
    pub ticks_skipped: AtomicU64,
    pub callback_failures: AtomicU64,
    pub upserts_applied: AtomicU64,
    pub fetches_completed: AtomicU64,
    pub fetches_failed: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one emitted update.
    pub fn record_emission(&self) {
        self.emissions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tick that found nothing to emit.
    pub fn record_skipped_tick(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a subscriber callback that panicked.
    pub fn record_callback_failure(&self) {
        self.callback_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an upsert that replaced at least one stored token.
    pub fn record_upsert(&self) {
        self.upserts_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self, ok: bool) {
        if ok {
            self.fetches_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fetches_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            emissions: self.emissions.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            upserts_applied: self.upserts_applied.load(Ordering::Relaxed),
            fetches_completed: self.fetches_completed.load(Ordering::Relaxed),
            fetches_failed: self.fetches_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of [`FeedMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub emissions: u64,
    pub ticks_skipped: u64,
    pub callback_failures: u64,
    pub upserts_applied: u64,
    pub fetches_completed: u64,
    pub fetches_failed: u64,
}

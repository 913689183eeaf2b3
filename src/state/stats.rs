//! Lock-free node statistics.
//!
//! Counters are bumped from the frame and timer threads and read by the
//! status reporter in `main`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for both execution contexts.
#[derive(Debug, Default)]
pub struct NodeStats {
    /// Frames run through the preprocessing pipeline
    frames_processed: AtomicU64,
    /// Frames discarded because a newer one was queued behind them
    frames_dropped: AtomicU64,
    /// Timer ticks that ran the inference cycle
    ticks: AtomicU64,
    /// Ticks skipped (missed deadlines or overlapping cycles)
    ticks_skipped: AtomicU64,
    /// Ticks that republished the previous detection list
    stale_republishes: AtomicU64,
    /// Markers emitted across all ticks
    markers_published: AtomicU64,
}

/// Point-in-time copy of [`NodeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub ticks: u64,
    pub ticks_skipped: u64,
    pub stale_republishes: u64,
    pub markers_published: u64,
}

impl NodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: u64) {
        self.frames_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, count: u64) {
        self.ticks_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale_republishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_markers(&self, count: usize) {
        self.markers_published
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            stale_republishes: self.stale_republishes.load(Ordering::Relaxed),
            markers_published: self.markers_published.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} dropped={} ticks={} skipped={} stale={} markers={}",
            self.frames_processed,
            self.frames_dropped,
            self.ticks,
            self.ticks_skipped,
            self.stale_republishes,
            self.markers_published
        )
    }
}

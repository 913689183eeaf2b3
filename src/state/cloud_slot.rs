//! Synchronized handoff slot for the latest non-ground cloud.
//!
//! The frame thread publishes one cloud per processed frame and the timer
//! thread snapshots it once per tick. Published clouds are frozen behind an
//! `Arc`; the lock guards the pointer swap and the freshness flag, so a
//! reader sees the previous cloud or the new one in full.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::core::types::PointCloud;

/// Result of reading the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Nothing has been published yet.
    Empty,
    /// The most recently published cloud.
    Cloud(Arc<PointCloud>),
}

impl Snapshot {
    /// The cloud, if any.
    pub fn cloud(&self) -> Option<&Arc<PointCloud>> {
        match self {
            Snapshot::Empty => None,
            Snapshot::Cloud(cloud) => Some(cloud),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Snapshot::Empty)
    }

    /// The cloud, or an empty cloud in `frame_id` when nothing was published.
    pub fn into_cloud_or_empty(self, frame_id: &str) -> Arc<PointCloud> {
        match self {
            Snapshot::Empty => Arc::new(PointCloud::new(frame_id)),
            Snapshot::Cloud(cloud) => cloud,
        }
    }
}

/// Last-writer-wins slot shared by the frame and timer threads.
#[derive(Debug, Default)]
pub struct CloudSlot {
    current: Mutex<Option<Arc<PointCloud>>>,
    /// Total publishes since creation
    publish_count: AtomicU64,
    /// Set on publish, cleared on snapshot. Only written under `current`.
    fresh: AtomicBool,
}

impl CloudSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored cloud.
    ///
    /// Takes ownership; the previous cloud is released once the last reader
    /// holding a snapshot drops it.
    pub fn publish(&self, cloud: PointCloud) {
        let cloud = Arc::new(cloud);
        let previous = {
            let mut guard = self.current.lock();
            self.publish_count.fetch_add(1, Ordering::Relaxed);
            self.fresh.store(true, Ordering::Release);
            guard.replace(cloud)
        };
        // Drop outside the lock
        drop(previous);
    }

    /// Latest fully published cloud, or [`Snapshot::Empty`].
    pub fn snapshot(&self) -> Snapshot {
        let current = {
            let guard = self.current.lock();
            self.fresh.store(false, Ordering::Release);
            guard.clone()
        };
        match current {
            Some(cloud) => Snapshot::Cloud(cloud),
            None => Snapshot::Empty,
        }
    }

    /// Number of publishes since creation.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    /// True if a cloud was published since the last snapshot.
    pub fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }
}

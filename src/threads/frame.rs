//! Frame thread: per-frame preprocessing.
//!
//! Driven by frame arrival. Each frame is range filtered and ground
//! segmented, and the non-ground cloud replaces the one in the slot.
//! When frames queue up faster than they are processed, only the newest
//! is kept.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::core::types::PointCloud;
use crate::preprocessing::FramePreprocessor;
use crate::state::{CloudSlot, NodeStats};

/// Receive timeout, bounds shutdown latency.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Frame thread state and logic.
pub struct FrameThread {
    preprocessor: FramePreprocessor,
    slot: Arc<CloudSlot>,
    stats: Arc<NodeStats>,
    input_rx: Receiver<PointCloud>,
    running: Arc<AtomicBool>,
}

impl FrameThread {
    pub fn new(
        preprocessor: FramePreprocessor,
        slot: Arc<CloudSlot>,
        stats: Arc<NodeStats>,
        input_rx: Receiver<PointCloud>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            preprocessor,
            slot,
            stats,
            input_rx,
            running,
        }
    }

    /// Run the frame thread main loop.
    pub fn run(&mut self) {
        log::info!("Frame thread started, waiting for point clouds");

        while self.running.load(Ordering::Relaxed) {
            match self.input_rx.recv_timeout(RECV_TIMEOUT) {
                Ok(frame) => {
                    let frame = self.drain_to_latest(frame);
                    self.process_frame(&frame);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Input channel closed, frame thread exiting");
                    break;
                }
            }
        }

        log::info!("Frame thread stopped");
    }

    /// Keep only the newest queued frame.
    fn drain_to_latest(&self, first: PointCloud) -> PointCloud {
        let mut latest = first;
        let mut dropped = 0u64;
        while let Ok(next) = self.input_rx.try_recv() {
            latest = next;
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!("Dropped {} stale frames", dropped);
            self.stats.record_dropped(dropped);
        }
        latest
    }

    /// Preprocess one frame and hand the non-ground cloud to the slot.
    pub fn process_frame(&mut self, frame: &PointCloud) {
        let start = Instant::now();
        let segmented = self.preprocessor.process(frame);
        log::trace!(
            "Frame preprocessed in {:.1} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        self.slot.publish(segmented.non_ground);
        self.stats.record_frame();
    }
}

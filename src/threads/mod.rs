//! Multi-threaded architecture for Drishti.
//!
//! Two threads share only the cloud slot and the statistics counters:
//! - Frame thread: per-frame range filtering and ground segmentation
//! - Timer thread: periodic inference and publishing
//!
//! An optional replay thread feeds recorded frames into the input channel.

mod frame;
mod timer;

pub use frame::FrameThread;
pub use timer::{TickReport, TimerThread};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::core::types::PointCloud;
use crate::error::{DrishtiError, Result};
use crate::io::CloudReplay;
use crate::state::NodeStats;

/// Thread handles for the running node.
pub struct ThreadHandles {
    pub frame: JoinHandle<()>,
    pub timer: JoinHandle<()>,
}

impl ThreadHandles {
    /// Wait for both threads, reporting any that panicked.
    pub fn join(self) -> Result<()> {
        let frame = self.frame.join();
        let timer = self.timer.join();
        if frame.is_err() {
            return Err(DrishtiError::Thread("frame thread panicked".to_string()));
        }
        if timer.is_err() {
            return Err(DrishtiError::Thread("timer thread panicked".to_string()));
        }
        Ok(())
    }
}

/// Spawn the frame and timer threads.
pub fn spawn_threads(mut frame: FrameThread, mut timer: TimerThread) -> Result<ThreadHandles> {
    let frame_handle = thread::Builder::new()
        .name("frame".into())
        .spawn(move || frame.run())
        .map_err(|e| DrishtiError::Thread(format!("Failed to spawn frame thread: {}", e)))?;

    let timer_handle = thread::Builder::new()
        .name("timer".into())
        .spawn(move || timer.run())
        .map_err(|e| DrishtiError::Thread(format!("Failed to spawn timer thread: {}", e)))?;

    Ok(ThreadHandles {
        frame: frame_handle,
        timer: timer_handle,
    })
}

/// Spawn a replay thread pushing frames into `tx`.
pub fn spawn_replay(
    replay: CloudReplay,
    tx: Sender<PointCloud>,
    running: Arc<AtomicBool>,
    stats: Arc<NodeStats>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("replay".into())
        .spawn(move || replay.run(tx, running, stats))
        .map_err(|e| DrishtiError::Thread(format!("Failed to spawn replay thread: {}", e)))
}

//! Node assembly: wires configuration, engine, sinks and threads together.
//!
//! ```ignore
//! let engine = create_engine(&config.engine)?;
//! let node = Node::new(config, engine);
//! let input = node.input();
//! let running = node.start(OutputSinks::logging())?;
//! input.send(cloud)?;
//! let stats = running.stop()?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::config::NodeConfig;
use crate::core::types::PointCloud;
use crate::engine::DetectionEngine;
use crate::error::Result;
use crate::inference::InferenceCycle;
use crate::io::OutputSinks;
use crate::preprocessing::FramePreprocessor;
use crate::publish::{DetectionPublisher, RangeAnnouncer};
use crate::state::{CloudSlot, NodeStats, StatsSnapshot};
use crate::threads::{FrameThread, ThreadHandles, TickReport, TimerThread, spawn_threads};
use crate::transform::{FrameTransformer, StaticTransformTree};

/// A configured node that has not started yet.
pub struct Node {
    config: NodeConfig,
    slot: Arc<CloudSlot>,
    stats: Arc<NodeStats>,
    running: Arc<AtomicBool>,
    input_tx: Sender<PointCloud>,
    input_rx: Receiver<PointCloud>,
    cycle: Arc<InferenceCycle>,
    reports: Option<Sender<TickReport>>,
}

impl Node {
    /// Build a node around an initialized engine.
    pub fn new(config: NodeConfig, engine: Box<dyn DetectionEngine>) -> Self {
        let (input_tx, input_rx) = bounded(config.input.queue_size.max(1));
        let slot = Arc::new(CloudSlot::new());
        let cycle = Arc::new(InferenceCycle::new(
            engine,
            Arc::clone(&slot),
            &config.frames.sensor_frame,
        ));

        Self {
            config,
            slot,
            stats: Arc::new(NodeStats::new()),
            running: Arc::new(AtomicBool::new(true)),
            input_tx,
            input_rx,
            cycle,
            reports: None,
        }
    }

    /// Use an externally owned shutdown flag (e.g. set by a Ctrl-C handler).
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = running;
        self
    }

    /// Forward every tick report to `tx`.
    pub fn with_reports(mut self, tx: Sender<TickReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Sender for input frames. Dropping every sender stops the frame thread.
    pub fn input(&self) -> Sender<PointCloud> {
        self.input_tx.clone()
    }

    pub fn stats(&self) -> Arc<NodeStats> {
        Arc::clone(&self.stats)
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn slot(&self) -> Arc<CloudSlot> {
        Arc::clone(&self.slot)
    }

    pub fn cycle(&self) -> Arc<InferenceCycle> {
        Arc::clone(&self.cycle)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn transformer(&self) -> Option<Arc<dyn FrameTransformer>> {
        if self.config.frames.static_transforms.is_empty() {
            return None;
        }
        let tree = StaticTransformTree::from_config(&self.config.frames.static_transforms);
        log::info!("Loaded {} static transforms", tree.len());
        Some(Arc::new(tree))
    }

    /// Spawn the frame and timer threads.
    pub fn start(self, sinks: OutputSinks) -> Result<RunningNode> {
        let mut publisher = DetectionPublisher::new(self.config.publisher_config());
        if let Some(transformer) = self.transformer() {
            publisher = publisher.with_transformer(transformer);
        }
        let announcer = RangeAnnouncer::new(&self.config.range, &self.config.frames.sensor_frame);

        let frame = FrameThread::new(
            FramePreprocessor::new(self.config.preprocessor_config()),
            Arc::clone(&self.slot),
            Arc::clone(&self.stats),
            self.input_rx,
            Arc::clone(&self.running),
        );

        let mut timer = TimerThread::new(
            Duration::from_millis(self.config.timer.period_ms),
            Arc::clone(&self.slot),
            Arc::clone(&self.cycle),
            publisher,
            announcer,
            sinks,
            Arc::clone(&self.stats),
            Arc::clone(&self.running),
        );
        if let Some(tx) = self.reports {
            timer = timer.with_reports(tx);
        }

        // Only callers holding `input()` senders keep the frame thread alive
        drop(self.input_tx);

        let handles = spawn_threads(frame, timer)?;
        log::info!("Node started using the {} engine", self.cycle.engine_name());

        Ok(RunningNode {
            handles,
            running: self.running,
            stats: self.stats,
        })
    }
}

/// A node whose threads are running.
pub struct RunningNode {
    handles: ThreadHandles,
    running: Arc<AtomicBool>,
    stats: Arc<NodeStats>,
}

impl RunningNode {
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// True once the input channel closed and the frame thread exited.
    pub fn frame_thread_finished(&self) -> bool {
        self.handles.frame.is_finished()
    }

    /// Signal shutdown, wait for in-flight work and return final counters.
    pub fn stop(self) -> Result<StatsSnapshot> {
        self.running.store(false, Ordering::Relaxed);
        self.handles.join()?;
        Ok(self.stats.snapshot())
    }
}

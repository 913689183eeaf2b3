//! Periodic inference over the latest non-ground cloud.
//!
//! Each cycle snapshots the [`CloudSlot`], hands the cloud to the detection
//! engine and reads back its detections. At most one cycle touches the
//! engine at a time: a cycle that finds another in flight is skipped, never
//! queued. When inference fails the previous detection list is republished.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::core::types::{Detection, DetectionList};
use crate::engine::DetectionEngine;
use crate::state::{CloudSlot, Snapshot};

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Inference succeeded; detections are new.
    Fresh,
    /// Inference failed; detections are the previous cycle's.
    Stale,
    /// Another cycle was still running; the engine was not touched.
    Skipped,
}

/// Result of one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// Points handed to the engine (0 when skipped)
    pub input_points: usize,
    /// Detections to publish this tick (empty when skipped)
    pub detections: DetectionList,
}

/// Engine plus the last list it produced.
struct EngineState {
    engine: Box<dyn DetectionEngine>,
    retained: DetectionList,
}

/// Owner of the detection engine.
pub struct InferenceCycle {
    state: Mutex<EngineState>,
    slot: Arc<CloudSlot>,
    sensor_frame: String,
}

impl InferenceCycle {
    /// Wrap an initialized engine.
    pub fn new(engine: Box<dyn DetectionEngine>, slot: Arc<CloudSlot>, sensor_frame: &str) -> Self {
        Self {
            state: Mutex::new(EngineState {
                engine,
                retained: Vec::new(),
            }),
            slot,
            sensor_frame: sensor_frame.to_string(),
        }
    }

    /// Snapshot the slot and run one cycle.
    pub fn run(&self) -> CycleReport {
        self.run_with(self.slot.snapshot())
    }

    /// Run one cycle on an already taken snapshot.
    ///
    /// An empty slot still runs inference, on an empty cloud.
    pub fn run_with(&self, snapshot: Snapshot) -> CycleReport {
        let Some(mut state) = self.state.try_lock() else {
            log::debug!("Inference still in flight, skipping cycle");
            return CycleReport {
                outcome: CycleOutcome::Skipped,
                input_points: 0,
                detections: Vec::new(),
            };
        };

        let cloud = snapshot.into_cloud_or_empty(&self.sensor_frame);
        let input_points = cloud.len();

        let start = Instant::now();
        state.engine.set_input_cloud(cloud);
        let result = state.engine.infer();
        log::debug!(
            "Inference on {} points took {:.1} ms",
            input_points,
            start.elapsed().as_secs_f64() * 1000.0
        );

        let outcome = match result {
            Ok(()) => {
                state.retained = state.engine.detections().to_vec();
                CycleOutcome::Fresh
            }
            Err(e) => {
                log::error!("Inference failed: {}", e);
                CycleOutcome::Stale
            }
        };

        CycleReport {
            outcome,
            input_points,
            detections: state.retained.clone(),
        }
    }

    /// Detections from the last successful inference.
    ///
    /// Blocks while a cycle is running.
    pub fn last_detections(&self) -> Vec<Detection> {
        self.state.lock().retained.clone()
    }

    /// Name of the wrapped engine.
    pub fn engine_name(&self) -> &'static str {
        self.state.lock().engine.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PointCloud;
    use crate::engine::{EngineConfig, MockEngine};

    fn sample() -> Vec<Detection> {
        vec![Detection::new(3.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.6)]
    }

    fn create_cycle(engine: MockEngine) -> (InferenceCycle, Arc<CloudSlot>) {
        let mut engine = engine;
        engine.init(&EngineConfig::default()).unwrap();
        let slot = Arc::new(CloudSlot::new());
        let cycle = InferenceCycle::new(Box::new(engine), Arc::clone(&slot), "os_sensor");
        (cycle, slot)
    }

    #[test]
    fn test_fresh_cycle() {
        let (cycle, slot) = create_cycle(MockEngine::new().with_detections(sample()));
        let mut cloud = PointCloud::new("os_sensor");
        cloud.push_xyz(3.0, 1.0, 0.0);
        slot.publish(cloud);

        let report = cycle.run();
        assert_eq!(report.outcome, CycleOutcome::Fresh);
        assert_eq!(report.input_points, 1);
        assert_eq!(report.detections, sample());
    }

    #[test]
    fn test_empty_slot_still_infers() {
        let engine = MockEngine::new().with_detections(sample());
        let counters = engine.counters();
        let (cycle, _slot) = create_cycle(engine);

        let report = cycle.run();
        assert_eq!(report.outcome, CycleOutcome::Fresh);
        assert_eq!(report.input_points, 0);
        assert_eq!(
            counters
                .infer_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn test_failure_republishes_previous() {
        let (cycle, _slot) =
            create_cycle(MockEngine::new().with_detections(sample()).with_fail_every(2));

        let first = cycle.run();
        assert_eq!(first.outcome, CycleOutcome::Fresh);

        let second = cycle.run();
        assert_eq!(second.outcome, CycleOutcome::Stale);
        assert_eq!(second.detections, first.detections);
        assert_eq!(cycle.last_detections(), sample());
    }

    #[test]
    fn test_failure_before_any_success_is_empty() {
        let (cycle, _slot) = create_cycle(MockEngine::new().with_fail_every(1));
        let report = cycle.run();
        assert_eq!(report.outcome, CycleOutcome::Stale);
        assert!(report.detections.is_empty());
    }

    #[test]
    fn test_engine_name() {
        let (cycle, _slot) = create_cycle(MockEngine::new());
        assert_eq!(cycle.engine_name(), "mock");
    }
}

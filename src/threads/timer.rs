//! Timer thread: periodic inference and publishing.
//!
//! Every period:
//! 1. Snapshot the non-ground cloud and publish it
//! 2. Run the inference cycle
//! 3. Publish the detection marker batch
//! 4. Publish the range marker
//!
//! When the inference cycle is still busy from an earlier tick, step 3 is
//! skipped; the range marker is still published. A tick that overruns its
//! period does not trigger catch-up ticks; the missed deadlines are skipped
//! and counted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::core::time::now_us;
use crate::inference::{CycleOutcome, InferenceCycle};
use crate::io::{OutputSinks, publish_or_log};
use crate::publish::{DetectionPublisher, RangeAnnouncer};
use crate::state::{CloudSlot, NodeStats};

/// Longest single sleep, bounds shutdown latency.
const MAX_SLEEP: Duration = Duration::from_millis(50);

/// Outcome of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: CycleOutcome,
    /// Points in the published non-ground cloud
    pub non_ground_points: usize,
    /// Detections returned for this tick
    pub detections: usize,
    /// Markers that passed the inclusion filter
    pub markers: usize,
}

/// Timer thread state and logic.
pub struct TimerThread {
    period: Duration,
    slot: Arc<CloudSlot>,
    cycle: Arc<InferenceCycle>,
    publisher: DetectionPublisher,
    announcer: RangeAnnouncer,
    sinks: OutputSinks,
    stats: Arc<NodeStats>,
    running: Arc<AtomicBool>,
    sensor_frame: String,
    reports: Option<Sender<TickReport>>,
}

impl TimerThread {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        period: Duration,
        slot: Arc<CloudSlot>,
        cycle: Arc<InferenceCycle>,
        publisher: DetectionPublisher,
        announcer: RangeAnnouncer,
        sinks: OutputSinks,
        stats: Arc<NodeStats>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let sensor_frame = publisher.config().sensor_frame.clone();
        Self {
            period,
            slot,
            cycle,
            publisher,
            announcer,
            sinks,
            stats,
            running,
            sensor_frame,
            reports: None,
        }
    }

    /// Forward every tick report to `tx` (dropped when full).
    pub fn with_reports(mut self, tx: Sender<TickReport>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Run the timer thread main loop.
    pub fn run(&mut self) {
        log::info!(
            "Timer thread started ({} ms period)",
            self.period.as_millis()
        );

        let mut next = Instant::now() + self.period;
        while self.running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next {
                std::thread::sleep((next - now).min(MAX_SLEEP));
                continue;
            }

            let report = self.tick();
            if let Some(tx) = &self.reports {
                let _ = tx.try_send(report);
            }

            next += self.period;
            let now = Instant::now();
            if now >= next {
                let missed = skipped_periods(now - next, self.period);
                next += self.period * missed;
                self.stats.record_skipped(u64::from(missed));
                log::debug!("Tick overran, skipping {} periods", missed);
            }
        }

        log::info!("Timer thread stopped");
    }

    /// Run one tick.
    pub fn tick(&mut self) -> TickReport {
        let stamp_us = now_us();
        let snapshot = self.slot.snapshot();

        let cloud = snapshot.clone().into_cloud_or_empty(&self.sensor_frame);
        publish_or_log(self.sinks.non_ground.as_mut(), &*cloud);

        let cycle = self.cycle.run_with(snapshot);
        match cycle.outcome {
            CycleOutcome::Skipped => {
                self.stats.record_skipped(1);
                publish_or_log(self.sinks.range.as_mut(), &self.announcer.marker(stamp_us));
                return TickReport {
                    outcome: cycle.outcome,
                    non_ground_points: cloud.len(),
                    detections: 0,
                    markers: 0,
                };
            }
            CycleOutcome::Stale => self.stats.record_stale(),
            CycleOutcome::Fresh => {}
        }

        let batch = self.publisher.build_batch(&cycle.detections, stamp_us);
        publish_or_log(self.sinks.detections.as_mut(), &batch);
        publish_or_log(self.sinks.range.as_mut(), &self.announcer.marker(stamp_us));

        self.stats.record_tick();
        self.stats.record_markers(batch.len());

        TickReport {
            outcome: cycle.outcome,
            non_ground_points: cloud.len(),
            detections: cycle.detections.len(),
            markers: batch.len(),
        }
    }
}

/// Whole periods elapsed past a deadline, counting the one just missed.
fn skipped_periods(late_by: Duration, period: Duration) -> u32 {
    let period_ns = period.as_nanos().max(1);
    (late_by.as_nanos() / period_ns + 1).min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Detection, PointCloud, RangeBounds};
    use crate::engine::{DetectionEngine, EngineConfig, MockEngine};
    use crate::io::{ChannelSink, topics};
    use crate::publish::{BoxMarker, MarkerBatch, PublisherConfig};
    use crossbeam_channel::{Receiver, bounded};

    struct Outputs {
        clouds: Receiver<PointCloud>,
        batches: Receiver<MarkerBatch>,
        ranges: Receiver<BoxMarker>,
    }

    fn create_timer(engine: MockEngine) -> (TimerThread, Arc<CloudSlot>, Outputs) {
        let mut engine = engine;
        engine.init(&EngineConfig::default()).unwrap();

        let slot = Arc::new(CloudSlot::new());
        let cycle = Arc::new(InferenceCycle::new(
            Box::new(engine),
            Arc::clone(&slot),
            "os_sensor",
        ));

        let (cloud_tx, clouds) = bounded(16);
        let (batch_tx, batches) = bounded(16);
        let (range_tx, ranges) = bounded(16);
        let sinks = OutputSinks {
            non_ground: Box::new(ChannelSink::new(topics::NON_GROUND, cloud_tx)),
            detections: Box::new(ChannelSink::new(topics::DETECTIONS, batch_tx)),
            range: Box::new(ChannelSink::new(topics::RANGE, range_tx)),
        };

        let timer = TimerThread::new(
            Duration::from_millis(20),
            Arc::clone(&slot),
            cycle,
            DetectionPublisher::new(PublisherConfig::default()),
            RangeAnnouncer::new(&RangeBounds::default(), "os_sensor"),
            sinks,
            Arc::new(NodeStats::new()),
            Arc::new(AtomicBool::new(true)),
        );

        (
            timer,
            slot,
            Outputs {
                clouds,
                batches,
                ranges,
            },
        )
    }

    fn detections() -> Vec<Detection> {
        vec![
            Detection::new(3.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.6),
            Detection::new(0.2, 0.1, 0.0, 1.0, 1.0, 1.0, 0.9),
        ]
    }

    #[test]
    fn test_tick_publishes_all_streams() {
        let (mut timer, slot, outputs) =
            create_timer(MockEngine::new().with_detections(detections()));
        let mut cloud = PointCloud::new("os_sensor");
        cloud.push_xyz(3.0, 1.0, 0.2);
        slot.publish(cloud);

        let report = timer.tick();

        assert_eq!(report.outcome, CycleOutcome::Fresh);
        assert_eq!(report.non_ground_points, 1);
        assert_eq!(report.detections, 2);
        assert_eq!(report.markers, 1);
        assert_eq!(outputs.clouds.try_recv().unwrap().len(), 1);
        assert_eq!(outputs.batches.try_recv().unwrap().len(), 1);
        assert_eq!(outputs.ranges.try_recv().unwrap().namespace, "range");
    }

    #[test]
    fn test_empty_slot_publishes_empty_cloud() {
        let (mut timer, _slot, outputs) = create_timer(MockEngine::new());
        let report = timer.tick();

        assert_eq!(report.non_ground_points, 0);
        let cloud = outputs.clouds.try_recv().unwrap();
        assert!(cloud.is_empty());
        assert_eq!(cloud.frame_id, "os_sensor");
        assert!(outputs.batches.try_recv().unwrap().is_empty());
    }

    #[test]
    fn test_stale_tick_republishes_previous() {
        let (mut timer, _slot, outputs) = create_timer(
            MockEngine::new()
                .with_detections(detections())
                .with_fail_every(2),
        );

        let first = timer.tick();
        let second = timer.tick();

        assert_eq!(first.outcome, CycleOutcome::Fresh);
        assert_eq!(second.outcome, CycleOutcome::Stale);
        assert_eq!(second.markers, first.markers);
        assert_eq!(outputs.batches.try_iter().count(), 2);
        assert_eq!(timer.stats.snapshot().stale_republishes, 1);
    }

    #[test]
    fn test_skipped_tick_still_announces_range() {
        let (mut timer, _slot, outputs) = create_timer(
            MockEngine::new()
                .with_detections(detections())
                .with_latency(Duration::from_millis(200)),
        );

        let busy = {
            let cycle = Arc::clone(&timer.cycle);
            std::thread::spawn(move || cycle.run())
        };
        std::thread::sleep(Duration::from_millis(50));

        let report = timer.tick();

        assert_eq!(report.outcome, CycleOutcome::Skipped);
        assert_eq!(report.markers, 0);
        assert_eq!(outputs.clouds.try_iter().count(), 1);
        assert!(outputs.batches.try_recv().is_err());
        assert_eq!(outputs.ranges.try_recv().unwrap().namespace, "range");
        assert_eq!(timer.stats.snapshot().ticks_skipped, 1);

        assert_eq!(busy.join().unwrap().outcome, CycleOutcome::Fresh);
    }

    #[test]
    fn test_run_ticks_until_stopped() {
        let (timer, _slot, outputs) = create_timer(MockEngine::new());
        let running = Arc::clone(&timer.running);
        let stats = Arc::clone(&timer.stats);
        let mut timer = timer;

        let handle = std::thread::spawn(move || timer.run());
        std::thread::sleep(Duration::from_millis(150));
        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();

        let ticks = stats.snapshot().ticks;
        assert!(ticks >= 2, "expected several ticks, got {}", ticks);
        assert_eq!(outputs.ranges.try_iter().count() as u64, ticks);
    }

    #[test]
    fn test_skipped_periods() {
        let period = Duration::from_millis(200);
        assert_eq!(skipped_periods(Duration::ZERO, period), 1);
        assert_eq!(skipped_periods(Duration::from_millis(199), period), 1);
        assert_eq!(skipped_periods(Duration::from_millis(450), period), 3);
    }
}

//! Inference cycle tests
//!
//! Exercises the engine ownership rules from outside the crate:
//! - Overlapping cycles never run the engine concurrently
//! - Failed inference republishes the last good list
//! - Empty input still reaches the engine
//!
//! Run with: `cargo test --test inference`

use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use drishti::engine::{DetectionEngine, EngineConfig, MockEngine};
use drishti::state::CloudSlot;
use drishti::{CycleOutcome, Detection, InferenceCycle, PointCloud};

fn cycle_with(engine: MockEngine) -> (InferenceCycle, Arc<CloudSlot>) {
    let mut engine = engine;
    engine.init(&EngineConfig::default()).unwrap();
    let slot = Arc::new(CloudSlot::new());
    let cycle = InferenceCycle::new(Box::new(engine), Arc::clone(&slot), "os_sensor");
    (cycle, slot)
}

fn one_box() -> Vec<Detection> {
    vec![Detection::new(4.0, 1.0, 0.0, 1.0, 1.0, 1.5, 0.7)]
}

#[test]
fn test_overlapping_cycles_are_skipped() {
    let engine = MockEngine::new()
        .with_detections(one_box())
        .with_latency(Duration::from_millis(150));
    let counters = engine.counters();
    let (cycle, _slot) = cycle_with(engine);
    let cycle = Arc::new(cycle);

    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let cycle = Arc::clone(&cycle);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cycle.run().outcome
            })
        })
        .collect();

    let outcomes: Vec<CycleOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let fresh = outcomes.iter().filter(|o| **o == CycleOutcome::Fresh).count();
    let skipped = outcomes
        .iter()
        .filter(|o| **o == CycleOutcome::Skipped)
        .count();

    assert_eq!(counters.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(fresh + skipped, threads);
    assert!(skipped >= 1, "expected at least one skipped cycle");
    assert_eq!(
        counters.infer_calls.load(Ordering::SeqCst),
        fresh as u64,
        "skipped cycles must not touch the engine"
    );
}

#[test]
fn test_skipped_cycle_publishes_nothing() {
    let engine = MockEngine::new()
        .with_detections(one_box())
        .with_latency(Duration::from_millis(200));
    let (cycle, _slot) = cycle_with(engine);
    let cycle = Arc::new(cycle);

    let busy = {
        let cycle = Arc::clone(&cycle);
        thread::spawn(move || cycle.run())
    };
    thread::sleep(Duration::from_millis(50));

    let report = cycle.run();
    assert_eq!(report.outcome, CycleOutcome::Skipped);
    assert!(report.detections.is_empty());
    assert_eq!(report.input_points, 0);

    assert_eq!(busy.join().unwrap().outcome, CycleOutcome::Fresh);
}

#[test]
fn test_failure_keeps_last_good_list() {
    let (cycle, slot) = cycle_with(
        MockEngine::new()
            .with_detections(one_box())
            .with_fail_every(2),
    );
    let mut cloud = PointCloud::new("os_sensor");
    cloud.push_xyz(4.0, 1.0, 0.0);
    slot.publish(cloud);

    let outcomes: Vec<_> = (0..4).map(|_| cycle.run()).collect();

    assert_eq!(outcomes[0].outcome, CycleOutcome::Fresh);
    assert_eq!(outcomes[1].outcome, CycleOutcome::Stale);
    assert_eq!(outcomes[2].outcome, CycleOutcome::Fresh);
    assert_eq!(outcomes[3].outcome, CycleOutcome::Stale);
    for report in &outcomes {
        assert_eq!(report.detections, one_box());
        assert_eq!(report.input_points, 1);
    }
}

#[test]
fn test_failure_before_any_success_is_empty() {
    let (cycle, _slot) = cycle_with(
        MockEngine::new()
            .with_detections(one_box())
            .with_fail_every(1),
    );

    let report = cycle.run();
    assert_eq!(report.outcome, CycleOutcome::Stale);
    assert!(report.detections.is_empty());
    assert!(cycle.last_detections().is_empty());
}

#[test]
fn test_empty_slot_runs_on_empty_cloud() {
    let engine = MockEngine::new().with_detections(one_box());
    let counters = engine.counters();
    let (cycle, _slot) = cycle_with(engine);

    let report = cycle.run();

    assert_eq!(report.outcome, CycleOutcome::Fresh);
    assert_eq!(report.input_points, 0);
    assert_eq!(counters.infer_calls.load(Ordering::SeqCst), 1);
    assert_eq!(counters.last_input_len.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cycle_sees_latest_publish() {
    let engine = MockEngine::new();
    let counters = engine.counters();
    let (cycle, slot) = cycle_with(engine);

    for n in 1..=3 {
        let mut cloud = PointCloud::new("os_sensor");
        for i in 0..n {
            cloud.push_xyz(i as f32, 0.0, 0.0);
        }
        slot.publish(cloud);
    }
    cycle.run();

    assert_eq!(counters.last_input_len.load(Ordering::SeqCst), 3);
    assert_eq!(cycle.engine_name(), "mock");
}

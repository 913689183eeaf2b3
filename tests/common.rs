//! Test utilities for Drishti integration tests.
//!
//! Synthetic scenes, output sinks wired to channels, and a node config
//! tuned for fast ticks.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, bounded};
use drishti::io::{ChannelSink, OutputSinks, topics};
use drishti::publish::{BoxMarker, MarkerBatch};
use drishti::{NodeConfig, PointCloud};

/// Ground plane height used by the synthetic scenes.
pub const GROUND_Z: f32 = -0.5;

/// Flat ground grid of (2n+1)² points with `spacing` meters between them.
pub fn ground_grid(cloud: &mut PointCloud, n: i32, spacing: f32) {
    for i in -n..=n {
        for j in -n..=n {
            cloud.push_xyz(i as f32 * spacing, j as f32 * spacing, GROUND_Z);
        }
    }
}

/// Solid block of points centred at (cx, cy), spanning z in [z_min, z_max].
///
/// Returns the number of points added.
pub fn obstacle(cloud: &mut PointCloud, cx: f32, cy: f32, z_min: f32, z_max: f32) -> usize {
    let mut added = 0;
    for i in -1..=1 {
        for j in -1..=1 {
            for k in 0..5 {
                let z = z_min + (z_max - z_min) * k as f32 / 4.0;
                cloud.push_xyz(cx + i as f32 * 0.1, cy + j as f32 * 0.1, z);
                added += 1;
            }
        }
    }
    added
}

/// Ground grid plus one obstacle and a few out-of-range points.
///
/// Returns the cloud and the number of obstacle points.
pub fn street_scene() -> (PointCloud, usize) {
    let mut cloud = PointCloud::new("os_sensor");
    ground_grid(&mut cloud, 10, 1.0);
    let obstacle_points = obstacle(&mut cloud, 5.0, 0.0, -0.3, 0.7);

    // Outside the default range box
    cloud.push_xyz(30.0, 0.0, 0.0);
    cloud.push_xyz(0.0, -25.0, 0.0);
    cloud.push_xyz(2.0, 2.0, 3.0);
    cloud.push_xyz(2.0, 2.0, -2.0);

    (cloud, obstacle_points)
}

/// Default config with a short timer period and a seeded segmenter.
pub fn fast_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.timer.period_ms = 20;
    config.ground.seed = Some(42);
    config
}

/// Receivers for the three output topics.
pub struct Outputs {
    pub clouds: Receiver<PointCloud>,
    pub batches: Receiver<MarkerBatch>,
    pub ranges: Receiver<BoxMarker>,
}

/// Output sinks backed by bounded channels.
pub fn channel_sinks(capacity: usize) -> (OutputSinks, Outputs) {
    let (cloud_tx, clouds) = bounded(capacity);
    let (batch_tx, batches) = bounded(capacity);
    let (range_tx, ranges) = bounded(capacity);

    let sinks = OutputSinks {
        non_ground: Box::new(ChannelSink::new(topics::NON_GROUND, cloud_tx)),
        detections: Box::new(ChannelSink::new(topics::DETECTIONS, batch_tx)),
        range: Box::new(ChannelSink::new(topics::RANGE, range_tx)),
    };

    (
        sinks,
        Outputs {
            clouds,
            batches,
            ranges,
        },
    )
}

/// Receive until `accept` returns true or `timeout` elapses.
pub fn recv_until<T>(
    rx: &Receiver<T>,
    timeout: Duration,
    mut accept: impl FnMut(&T) -> bool,
) -> Option<T> {
    let deadline = Instant::now() + timeout;
    while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(remaining) {
            Ok(item) if accept(&item) => return Some(item),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

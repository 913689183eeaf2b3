//! Detection filtering, frame transform and marker formatting.
//!
//! For every detection the engine reports, the publisher decides whether it
//! is worth showing, re-expresses it in the world frame when a transform is
//! available, and emits a [`BoxMarker`].
//!
//! # Inclusion
//!
//! A detection is published when all of:
//! - not dropped by the engine
//! - score above [`MIN_SCORE`]
//! - outside the near-field square (`|x| < 0.5 ∧ |y| < 0.5` is excluded)
//! - every dimension below [`MAX_BOX_DIMENSION`]

use std::sync::Arc;

use super::marker::{BoxMarker, Color, MarkerBatch};
use crate::core::types::{Detection, Orientation, Point3D, Pose3D};
use crate::transform::FrameTransformer;

/// Detections at or below this confidence are discarded.
pub const MIN_SCORE: f32 = 0.1;

/// Half-width of the square around the sensor where boxes are ignored (meters).
pub const NEAR_FIELD_HALF_WIDTH: f32 = 0.5;

/// Boxes with any dimension at or above this are discarded (meters).
pub const MAX_BOX_DIMENSION: f32 = 2.0;

/// Marker namespace for detection boxes.
pub const BOX_NAMESPACE: &str = "boxes";

const BOX_ALPHA: f32 = 0.5;

/// Detection publisher configuration.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Frame detections are reported in
    pub sensor_frame: String,
    /// Frame markers are published in when a transform is available
    pub world_frame: String,
    /// Marker lifetime in seconds
    pub box_lifetime_s: f32,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            sensor_frame: "os_sensor".to_string(),
            world_frame: "camera_init".to_string(),
            box_lifetime_s: 0.45,
        }
    }
}

/// Turns engine detections into marker batches.
pub struct DetectionPublisher {
    config: PublisherConfig,
    transformer: Option<Arc<dyn FrameTransformer>>,
}

impl DetectionPublisher {
    /// Create a publisher without a transform service; markers stay in the
    /// sensor frame.
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            config,
            transformer: None,
        }
    }

    /// Attach a frame transform service.
    pub fn with_transformer(mut self, transformer: Arc<dyn FrameTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Apply the inclusion rule.
    pub fn is_publishable(detection: &Detection) -> bool {
        let in_near_field = detection.x.abs() < NEAR_FIELD_HALF_WIDTH
            && detection.y.abs() < NEAR_FIELD_HALF_WIDTH;
        let fits = detection.w < MAX_BOX_DIMENSION
            && detection.l < MAX_BOX_DIMENSION
            && detection.h < MAX_BOX_DIMENSION;

        !detection.is_drop && detection.score > MIN_SCORE && !in_near_field && fits
    }

    /// Build the marker for the detection at `index` in the engine list.
    ///
    /// Falls back to the sensor frame with a yaw-only orientation when the
    /// world-frame lookup fails.
    pub fn build_marker(&self, index: usize, detection: &Detection, stamp_us: u64) -> BoxMarker {
        let (frame_id, position, orientation) = self.locate(index, detection);

        BoxMarker {
            namespace: BOX_NAMESPACE.to_string(),
            id: index as u32,
            frame_id,
            stamp_us,
            position,
            orientation,
            scale: Point3D::new(detection.l, detection.w, detection.h),
            color: Color::new(1.0, detection.class_id, detection.score, BOX_ALPHA),
            lifetime_s: Some(self.config.box_lifetime_s),
        }
    }

    fn locate(&self, index: usize, detection: &Detection) -> (String, Point3D, Orientation) {
        if let Some(transformer) = &self.transformer {
            let pose = Pose3D::from_xyz_yaw(detection.x, detection.y, detection.z, detection.theta);
            match transformer.lookup(&self.config.sensor_frame, &self.config.world_frame, &pose) {
                Ok(world) => {
                    return (
                        self.config.world_frame.clone(),
                        world.position_point(),
                        Orientation::from(world.orientation),
                    );
                }
                Err(e) => {
                    log::warn!(
                        "Detection {}: {}; publishing in '{}'",
                        index,
                        e,
                        self.config.sensor_frame
                    );
                }
            }
        }

        (
            self.config.sensor_frame.clone(),
            Point3D::new(detection.x, detection.y, detection.z),
            Orientation::from_yaw(detection.theta),
        )
    }

    /// Filter and format a whole detection list.
    ///
    /// Always returns a batch, empty when nothing passes.
    pub fn build_batch(&self, detections: &[Detection], stamp_us: u64) -> MarkerBatch {
        if detections.is_empty() {
            log::warn!("No boxes detected");
        }

        let mut batch = MarkerBatch::new(stamp_us);
        batch.markers = detections
            .iter()
            .enumerate()
            .filter(|(_, d)| Self::is_publishable(d))
            .map(|(i, d)| self.build_marker(i, d, stamp_us))
            .collect();

        log::info!("Detected {} objects", batch.len());
        batch
    }
}

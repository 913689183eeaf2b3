//! 3D detections produced by a detection engine.

use serde::{Deserialize, Serialize};

/// One oriented 3D box from the detection engine.
///
/// Detections are immutable once produced; the engine owns their creation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Box center in the sensor frame (meters).
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Length, width and height (meters).
    pub l: f32,
    pub w: f32,
    pub h: f32,
    /// Yaw about the vertical axis (radians).
    #[serde(default)]
    pub theta: f32,
    /// Class identifier as emitted by the engine.
    #[serde(default)]
    pub class_id: f32,
    /// Confidence in [0, 1].
    pub score: f32,
    /// Set by the engine when the box was suppressed.
    #[serde(default)]
    pub is_drop: bool,
}

impl Detection {
    /// Box at (x, y, z) with the given dimensions, yaw 0, class 0.
    pub fn new(x: f32, y: f32, z: f32, l: f32, w: f32, h: f32, score: f32) -> Self {
        Self {
            x,
            y,
            z,
            l,
            w,
            h,
            score,
            ..Default::default()
        }
    }

    pub fn with_theta(mut self, theta: f32) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_class(mut self, class_id: f32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn dropped(mut self) -> Self {
        self.is_drop = true;
        self
    }
}

/// Detections in engine output order.
pub type DetectionList = Vec<Detection>;

//! Renderable box records.

use serde::Serialize;

use crate::core::types::{Orientation, Point3D};

/// RGBA colour, channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// One axis-aligned (in its own pose) box for visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxMarker {
    /// Marker group ("boxes", "range")
    pub namespace: String,
    /// Identifier within the namespace
    pub id: u32,
    /// Frame the pose is expressed in
    pub frame_id: String,
    /// Creation time (microseconds since epoch)
    pub stamp_us: u64,
    pub position: Point3D,
    pub orientation: Orientation,
    /// Box extent along its local x, y, z axes
    pub scale: Point3D,
    pub color: Color,
    /// Seconds until the marker expires; `None` persists until replaced
    pub lifetime_s: Option<f32>,
}

/// All detection markers of one tick, published as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerBatch {
    pub stamp_us: u64,
    pub markers: Vec<BoxMarker>,
}

impl MarkerBatch {
    pub fn new(stamp_us: u64) -> Self {
        Self {
            stamp_us,
            markers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

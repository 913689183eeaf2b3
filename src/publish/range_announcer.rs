//! Static visualization of the configured range bounds.

use super::marker::{BoxMarker, Color};
use crate::core::types::{Orientation, Point3D, RangeBounds};

/// Marker namespace for the range box.
pub const RANGE_NAMESPACE: &str = "range";

/// Thickness of the drawn range slab (meters).
const SLAB_HEIGHT: f32 = 0.1;

/// Emits a flat slab just below the floor of the range box.
#[derive(Debug, Clone)]
pub struct RangeAnnouncer {
    template: BoxMarker,
}

impl RangeAnnouncer {
    pub fn new(bounds: &RangeBounds, sensor_frame: &str) -> Self {
        let width_x = bounds.max_x_range - bounds.min_x_range;
        let width_y = bounds.max_y_range - bounds.min_y_range;

        let template = BoxMarker {
            namespace: RANGE_NAMESPACE.to_string(),
            id: 0,
            frame_id: sensor_frame.to_string(),
            stamp_us: 0,
            position: Point3D::new(
                bounds.max_x_range - width_x / 2.0,
                bounds.max_y_range - width_y / 2.0,
                bounds.min_z_range - SLAB_HEIGHT,
            ),
            orientation: Orientation::IDENTITY,
            scale: Point3D::new(width_x, width_y, SLAB_HEIGHT),
            color: Color::new(1.0, 1.0, 1.0, 0.3),
            lifetime_s: None,
        };

        Self { template }
    }

    /// The range marker stamped with `stamp_us`.
    pub fn marker(&self, stamp_us: u64) -> BoxMarker {
        BoxMarker {
            stamp_us,
            ..self.template.clone()
        }
    }
}

//! Axis-aligned range bounds.

use serde::Deserialize;

use super::point_cloud::Axis;

/// Axis-aligned inclusion box; immutable after load.
///
/// Field names match the node's parameter names.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RangeBounds {
    #[serde(default = "default_max_x")]
    pub max_x_range: f32,
    #[serde(default = "default_min_x")]
    pub min_x_range: f32,
    #[serde(default = "default_max_y")]
    pub max_y_range: f32,
    #[serde(default = "default_min_y")]
    pub min_y_range: f32,
    #[serde(default = "default_max_z")]
    pub max_z_range: f32,
    #[serde(default = "default_min_z")]
    pub min_z_range: f32,
}

fn default_max_x() -> f32 {
    20.0
}
fn default_min_x() -> f32 {
    -20.0
}
fn default_max_y() -> f32 {
    20.0
}
fn default_min_y() -> f32 {
    -20.0
}
fn default_max_z() -> f32 {
    1.0
}
fn default_min_z() -> f32 {
    -0.7
}

impl Default for RangeBounds {
    fn default() -> Self {
        Self {
            max_x_range: default_max_x(),
            min_x_range: default_min_x(),
            max_y_range: default_max_y(),
            min_y_range: default_min_y(),
            max_z_range: default_max_z(),
            min_z_range: default_min_z(),
        }
    }
}

impl RangeBounds {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            max_x_range: max[0],
            min_x_range: min[0],
            max_y_range: max[1],
            min_y_range: min[1],
            max_z_range: max[2],
            min_z_range: min[2],
        }
    }

    /// (min, max) limits for one axis.
    #[inline]
    pub fn limits(&self, axis: Axis) -> (f32, f32) {
        match axis {
            Axis::X => (self.min_x_range, self.max_x_range),
            Axis::Y => (self.min_y_range, self.max_y_range),
            Axis::Z => (self.min_z_range, self.max_z_range),
        }
    }

    /// Inclusive containment test on all three axes.
    #[inline]
    pub fn contains(&self, x: f32, y: f32, z: f32) -> bool {
        (self.min_x_range..=self.max_x_range).contains(&x)
            && (self.min_y_range..=self.max_y_range).contains(&y)
            && (self.min_z_range..=self.max_z_range).contains(&z)
    }

    /// Check that every min is below its max.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let (min, max) = self.limits(axis);
            if !(min.is_finite() && max.is_finite()) {
                return Err(format!("{} range limits must be finite", axis.name()));
            }
            if min > max {
                return Err(format!(
                    "min_{}_range ({}) exceeds max_{}_range ({})",
                    axis.name(),
                    min,
                    axis.name(),
                    max
                ));
            }
        }
        Ok(())
    }
}

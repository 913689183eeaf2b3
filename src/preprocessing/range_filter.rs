//! Range gating filter for 3D point clouds.
//!
//! Removes points outside an axis-aligned box by chaining three
//! single-axis pass-through filters (x, then y, then z).

use crate::core::types::{Axis, PointCloud, RangeBounds};

/// Pass-through filter on a single axis.
///
/// Keeps points with `min <= coordinate <= max`. NaN never passes.
#[derive(Debug, Clone, Copy)]
pub struct AxisPassFilter {
    pub axis: Axis,
    pub min: f32,
    pub max: f32,
}

impl AxisPassFilter {
    pub fn new(axis: Axis, min: f32, max: f32) -> Self {
        Self { axis, min, max }
    }

    /// Check if a coordinate value passes.
    #[inline]
    pub fn is_valid(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Apply the pass to a cloud, returning a new cloud.
    pub fn apply(&self, cloud: &PointCloud) -> PointCloud {
        let values = cloud.axis(self.axis);
        cloud.retain_indexed(|i| self.is_valid(values[i]))
    }
}

/// Range filter over all three axes.
///
/// Each pass is independent, so the result equals the logical AND of the
/// three predicates whatever the pass order.
#[derive(Debug, Clone)]
pub struct RangeFilter {
    bounds: RangeBounds,
    passes: [AxisPassFilter; 3],
}

impl RangeFilter {
    /// Create a new range filter for the given bounds.
    pub fn new(bounds: RangeBounds) -> Self {
        let pass = |axis| {
            let (min, max) = bounds.limits(axis);
            AxisPassFilter::new(axis, min, max)
        };
        Self {
            bounds,
            passes: [pass(Axis::X), pass(Axis::Y), pass(Axis::Z)],
        }
    }

    pub fn bounds(&self) -> &RangeBounds {
        &self.bounds
    }

    /// Check if a point lies inside the bounds.
    #[inline]
    pub fn is_valid(&self, x: f32, y: f32, z: f32) -> bool {
        self.bounds.contains(x, y, z)
    }

    /// Apply range filtering to a cloud.
    ///
    /// Returns a new cloud with only in-range points.
    pub fn apply(&self, cloud: &PointCloud) -> PointCloud {
        let [x_pass, y_pass, z_pass] = &self.passes;
        let filtered = x_pass.apply(cloud);
        let filtered = y_pass.apply(&filtered);
        z_pass.apply(&filtered)
    }

    /// Apply the axis passes in a caller-chosen order.
    pub fn apply_in_order(&self, cloud: &PointCloud, order: [Axis; 3]) -> PointCloud {
        order.iter().fold(cloud.clone(), |acc, &axis| {
            let pass = match axis {
                Axis::X => &self.passes[0],
                Axis::Y => &self.passes[1],
                Axis::Z => &self.passes[2],
            };
            pass.apply(&acc)
        })
    }
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self::new(RangeBounds::default())
    }
}

//! 3D point cloud types.

use serde::Serialize;

/// A single 3D point in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3D {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True if all coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Coordinate axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// Point cloud frame in Structure-of-Arrays layout.
///
/// Point order carries no meaning; only membership does. All coordinate
/// vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointCloud {
    /// Reference frame the coordinates are expressed in.
    pub frame_id: String,
    /// Acquisition time in microseconds since the Unix epoch.
    pub timestamp_us: u64,
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
    pub zs: Vec<f32>,
}

impl PointCloud {
    /// Create an empty cloud in the given frame.
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            ..Default::default()
        }
    }

    /// Create an empty cloud with pre-allocated capacity.
    pub fn with_capacity(frame_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            frame_id: frame_id.into(),
            timestamp_us: 0,
            xs: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
            zs: Vec::with_capacity(capacity),
        }
    }

    /// Create from a list of points (converts AoS to SoA).
    pub fn from_points(frame_id: impl Into<String>, points: &[Point3D]) -> Self {
        let mut cloud = Self::with_capacity(frame_id, points.len());
        for p in points {
            cloud.push(*p);
        }
        cloud
    }

    /// Builder-style setter for the acquisition timestamp.
    pub fn with_timestamp(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    /// Empty cloud carrying the same frame id and timestamp.
    pub fn empty_like(&self, capacity: usize) -> Self {
        Self {
            frame_id: self.frame_id.clone(),
            timestamp_us: self.timestamp_us,
            xs: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
            zs: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, point: Point3D) {
        self.push_xyz(point.x, point.y, point.z);
    }

    #[inline]
    pub fn push_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.xs.push(x);
        self.ys.push(y);
        self.zs.push(z);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Point at index, if in bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Point3D> {
        if index < self.len() {
            Some(Point3D::new(self.xs[index], self.ys[index], self.zs[index]))
        } else {
            None
        }
    }

    /// Coordinate slice for an axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> &[f32] {
        match axis {
            Axis::X => &self.xs,
            Axis::Y => &self.ys,
            Axis::Z => &self.zs,
        }
    }

    /// Iterate over points.
    pub fn iter(&self) -> impl Iterator<Item = Point3D> + '_ {
        self.xs
            .iter()
            .zip(self.ys.iter())
            .zip(self.zs.iter())
            .map(|((&x, &y), &z)| Point3D::new(x, y, z))
    }

    /// Keep only points whose index satisfies `keep`.
    pub fn retain_indexed(&self, mut keep: impl FnMut(usize) -> bool) -> Self {
        let mut out = self.empty_like(self.len());
        for i in 0..self.len() {
            if keep(i) {
                out.push_xyz(self.xs[i], self.ys[i], self.zs[i]);
            }
        }
        out
    }

    /// Centroid of all points, or `None` if empty.
    pub fn centroid(&self) -> Option<Point3D> {
        if self.is_empty() {
            return None;
        }
        let n = self.len() as f32;
        Some(Point3D::new(
            self.xs.iter().sum::<f32>() / n,
            self.ys.iter().sum::<f32>() / n,
            self.zs.iter().sum::<f32>() / n,
        ))
    }
}

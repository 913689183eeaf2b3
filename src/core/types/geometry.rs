//! Poses, orientations, and plane models.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::Serialize;

use super::point_cloud::Point3D;

/// Orientation as a plain quaternion record (w, x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Orientation {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Orientation {
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Yaw-only rotation about the vertical axis.
    ///
    /// `w = cos(theta/2)`, `z = sin(theta/2)`, `x = y = 0`.
    #[inline]
    pub fn from_yaw(theta: f32) -> Self {
        let half = theta / 2.0;
        Self {
            w: half.cos(),
            x: 0.0,
            y: 0.0,
            z: half.sin(),
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<UnitQuaternion<f32>> for Orientation {
    fn from(q: UnitQuaternion<f32>) -> Self {
        Self {
            w: q.w,
            x: q.i,
            y: q.j,
            z: q.k,
        }
    }
}

/// 3D pose: position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3D {
    pub position: Vector3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Pose3D {
    pub fn new(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// Pose at (x, y, z) with yaw-only orientation.
    pub fn from_xyz_yaw(x: f32, y: f32, z: f32, yaw: f32) -> Self {
        Self::new(
            Vector3::new(x, y, z),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        )
    }

    pub fn to_isometry(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    pub fn from_isometry(iso: &Isometry3<f32>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// Express this pose in a parent frame given the child-to-parent transform.
    pub fn transformed_by(&self, transform: &Isometry3<f32>) -> Self {
        Self::from_isometry(&(transform * self.to_isometry()))
    }

    pub fn position_point(&self) -> Point3D {
        Point3D::new(self.position.x, self.position.y, self.position.z)
    }
}

impl Default for Pose3D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Plane `a·x + b·y + c·z + d = 0` with unit normal (a, b, c).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaneModel {
    pub coefficients: [f32; 4],
}

impl PlaneModel {
    /// Build from a normal and offset; the normal is normalized.
    ///
    /// Returns `None` for a zero-length or non-finite normal.
    pub fn from_normal(normal: Vector3<f32>, d: f32) -> Option<Self> {
        let norm = normal.norm();
        if !norm.is_finite() || norm < f32::EPSILON || !d.is_finite() {
            return None;
        }
        let n = normal / norm;
        Some(Self {
            coefficients: [n.x, n.y, n.z, d / norm],
        })
    }

    /// Fit a plane through three points. `None` if they are collinear.
    pub fn from_three_points(p1: Point3D, p2: Point3D, p3: Point3D) -> Option<Self> {
        let a = Vector3::new(p1.x, p1.y, p1.z);
        let b = Vector3::new(p2.x, p2.y, p2.z);
        let c = Vector3::new(p3.x, p3.y, p3.z);
        let normal = (b - a).cross(&(c - a));
        let norm = normal.norm();
        // Near-collinear samples produce unstable normals
        if norm < 1e-6 {
            return None;
        }
        let n = normal / norm;
        Self::from_normal(n, -n.dot(&a))
    }

    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        Vector3::new(
            self.coefficients[0],
            self.coefficients[1],
            self.coefficients[2],
        )
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.coefficients[3]
    }

    /// Signed distance from a point to the plane.
    #[inline]
    pub fn signed_distance(&self, x: f32, y: f32, z: f32) -> f32 {
        let [a, b, c, d] = self.coefficients;
        a * x + b * y + c * z + d
    }

    #[inline]
    pub fn distance(&self, x: f32, y: f32, z: f32) -> f32 {
        self.signed_distance(x, y, z).abs()
    }
}

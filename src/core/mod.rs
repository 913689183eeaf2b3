//! Foundation layer: core types and time helpers.

pub mod time;
pub mod types;

pub use types::{
    Axis, Detection, DetectionList, Orientation, PlaneModel, Point3D, PointCloud, Pose3D,
    RangeBounds,
};

//! Core data types shared by every pipeline stage.

mod bounds;
mod detection;
mod geometry;
mod point_cloud;

pub use bounds::RangeBounds;
pub use detection::{Detection, DetectionList};
pub use geometry::{Orientation, PlaneModel, Pose3D};
pub use point_cloud::{Axis, Point3D, PointCloud};

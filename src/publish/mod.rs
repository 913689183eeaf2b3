//! Output formatting for detections and range bounds.
//!
//! - [`DetectionPublisher`]: engine detections → filtered [`MarkerBatch`]
//! - [`RangeAnnouncer`]: range bounds → one static [`BoxMarker`]

mod detection_publisher;
mod marker;
mod range_announcer;

pub use detection_publisher::{
    BOX_NAMESPACE, DetectionPublisher, MAX_BOX_DIMENSION, MIN_SCORE, NEAR_FIELD_HALF_WIDTH,
    PublisherConfig,
};
pub use marker::{BoxMarker, Color, MarkerBatch};
pub use range_announcer::{RANGE_NAMESPACE, RangeAnnouncer};

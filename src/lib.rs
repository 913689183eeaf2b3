//! Drishti - 3D perception preprocessing and detection publishing
//!
//! Turns a stream of 3D point cloud frames into detection box markers:
//! out-of-range points are removed, the ground plane is segmented away,
//! and the remaining points are handed to a detection engine on a fixed
//! period. Engine output is filtered, transformed to the world frame and
//! published as renderable box records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  node / threads                     │  ← Orchestration
//! │        (frame thread, timer thread, replay)         │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │           inference / publish / io                  │  ← Periodic path
//! │   (inference cycle, marker publishing, sinks)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │      preprocessing / state / engine / transform     │  ← Per-frame path
//! │  (range filter, ground segmentation, cloud slot)    │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │            (point cloud, poses, detections)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Data Flow
//!
//! ```text
//! frame → RangeFilter → GroundSegmenter → CloudSlot
//!                                            ⇣ (every period)
//!                     InferenceCycle → DetectionPublisher / RangeAnnouncer → sinks
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod inference;
pub mod io;
pub mod node;
pub mod preprocessing;
pub mod publish;
pub mod state;
pub mod threads;
pub mod transform;

pub use config::NodeConfig;
pub use core::types::{Detection, DetectionList, PointCloud, RangeBounds};
pub use error::{DrishtiError, EngineError, Result, TransformError};
pub use inference::{CycleOutcome, InferenceCycle};
pub use node::{Node, RunningNode};

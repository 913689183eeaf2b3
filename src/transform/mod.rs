//! Frame transform service.
//!
//! Detections arrive in the sensor frame; the publisher asks a
//! [`FrameTransformer`] to re-express them in the world frame.
//! [`StaticTransformTree`] serves lookups from a fixed set of parent/child
//! transforms loaded from configuration.
//!
//! # Lookup
//!
//! ```text
//! source → ... → common ancestor ← ... ← target
//! ```
//!
//! Both frames walk up to the root; the first shared frame joins the two
//! chains. Frames with no shared ancestor have no transform.

use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;

use crate::core::types::Pose3D;
use crate::error::TransformError;

/// Upper bound on chain length; guards against cycles in the configured tree.
const MAX_CHAIN_DEPTH: usize = 64;

/// Resolves poses between reference frames.
pub trait FrameTransformer: Send + Sync {
    /// Express `pose`, given in `source`, in the `target` frame.
    fn lookup(&self, source: &str, target: &str, pose: &Pose3D)
    -> Result<Pose3D, TransformError>;
}

/// One static transform: pose of `child` expressed in `parent`.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticTransformConfig {
    pub parent: String,
    pub child: String,
    /// Translation [x, y, z] in meters
    #[serde(default)]
    pub translation: [f32; 3],
    /// Rotation [roll, pitch, yaw] in radians
    #[serde(default)]
    pub rotation_rpy: [f32; 3],
}

impl StaticTransformConfig {
    fn to_isometry(&self) -> Isometry3<f32> {
        let [x, y, z] = self.translation;
        let [roll, pitch, yaw] = self.rotation_rpy;
        Isometry3::from_parts(
            Translation3::from(Vector3::new(x, y, z)),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }
}

/// Parent link of one frame.
#[derive(Debug, Clone)]
struct Edge {
    parent: String,
    /// Maps child coordinates into parent coordinates
    parent_from_child: Isometry3<f32>,
}

/// Tree of static transforms keyed by child frame.
#[derive(Debug, Clone, Default)]
pub struct StaticTransformTree {
    edges: HashMap<String, Edge>,
}

impl StaticTransformTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration entries. Later entries replace earlier ones
    /// for the same child.
    pub fn from_config(entries: &[StaticTransformConfig]) -> Self {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(&entry.parent, &entry.child, entry.to_isometry());
        }
        tree
    }

    /// Set the transform of `child` relative to `parent`.
    pub fn insert(&mut self, parent: &str, child: &str, parent_from_child: Isometry3<f32>) {
        if let Some(previous) = self.edges.insert(
            child.to_string(),
            Edge {
                parent: parent.to_string(),
                parent_from_child,
            },
        ) {
            log::warn!(
                "Replacing transform {} -> {} with {} -> {}",
                previous.parent,
                child,
                parent,
                child
            );
        }
    }

    /// Number of configured transforms.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Frames from `start` up to its root, each with the transform mapping
    /// `start` coordinates into that frame.
    fn path_to_root<'a>(&'a self, start: &'a str) -> Vec<(&'a str, Isometry3<f32>)> {
        let mut path = Vec::new();
        let mut current = start;
        let mut accumulated = Isometry3::identity();
        path.push((current, accumulated));

        while let Some(edge) = self.edges.get(current) {
            if path.len() > MAX_CHAIN_DEPTH {
                log::warn!("Transform chain from '{}' exceeds depth limit", start);
                break;
            }
            accumulated = edge.parent_from_child * accumulated;
            current = edge.parent.as_str();
            path.push((current, accumulated));
        }

        path
    }

    /// Transform mapping `source` coordinates into `target` coordinates.
    pub fn resolve(&self, source: &str, target: &str) -> Result<Isometry3<f32>, TransformError> {
        if source == target {
            return Ok(Isometry3::identity());
        }

        let source_path = self.path_to_root(source);
        let target_path = self.path_to_root(target);

        for (frame, ancestor_from_source) in &source_path {
            if let Some((_, ancestor_from_target)) =
                target_path.iter().find(|(other, _)| other == frame)
            {
                return Ok(ancestor_from_target.inverse() * ancestor_from_source);
            }
        }

        Err(TransformError::NotFound {
            from_frame: source.to_string(),
            to_frame: target.to_string(),
        })
    }
}

impl FrameTransformer for StaticTransformTree {
    fn lookup(
        &self,
        source: &str,
        target: &str,
        pose: &Pose3D,
    ) -> Result<Pose3D, TransformError> {
        let transform = self.resolve(source, target)?;
        Ok(pose.transformed_by(&transform))
    }
}

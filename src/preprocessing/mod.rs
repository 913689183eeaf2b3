//! Point cloud preprocessing.
//!
//! Provides the per-frame pipeline that turns a raw sensor cloud into
//! ground and non-ground clouds ready for detection.
//!
//! # Pipeline
//!
//! ```text
//! PointCloud → RangeFilter → GroundSegmenter → (ground, non_ground)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use drishti::preprocessing::{FramePreprocessor, PreprocessorConfig};
//!
//! let mut preprocessor = FramePreprocessor::new(PreprocessorConfig::default());
//! let frame = preprocessor.process(&cloud);
//! println!("{} non-ground points", frame.non_ground.len());
//! ```

mod ground_segmenter;
mod range_filter;

pub use ground_segmenter::{
    GroundSegmenter, GroundSegmenterConfig, SegmentationResult, extract_indices, partition,
    segment_plane,
};
pub use range_filter::{AxisPassFilter, RangeFilter};

use crate::core::types::{PlaneModel, PointCloud, RangeBounds};

/// Trait for cloud filtering operations.
pub trait CloudFilter: Send + Sync {
    /// Apply the filter to a cloud, returning a filtered cloud.
    fn filter(&self, cloud: &PointCloud) -> PointCloud;

    /// Get the name of this filter for diagnostics.
    fn name(&self) -> &'static str;
}

impl CloudFilter for RangeFilter {
    fn filter(&self, cloud: &PointCloud) -> PointCloud {
        self.apply(cloud)
    }

    fn name(&self) -> &'static str {
        "RangeFilter"
    }
}

impl CloudFilter for AxisPassFilter {
    fn filter(&self, cloud: &PointCloud) -> PointCloud {
        self.apply(cloud)
    }

    fn name(&self) -> &'static str {
        "AxisPassFilter"
    }
}

/// Configuration for the frame preprocessor.
#[derive(Debug, Clone, Default)]
pub struct PreprocessorConfig {
    /// Range filter bounds
    pub bounds: RangeBounds,
    /// Ground segmentation configuration
    pub ground: GroundSegmenterConfig,
}

/// Output of one preprocessed frame.
#[derive(Debug, Clone)]
pub struct SegmentedFrame {
    /// Points within the fitted ground plane.
    pub ground: PointCloud,
    /// Every in-range point not on the ground plane.
    pub non_ground: PointCloud,
    /// Fitted ground plane, if any.
    pub plane: Option<PlaneModel>,
    /// Point count after range filtering.
    pub range_filtered_len: usize,
}

/// Per-frame preprocessing pipeline.
pub struct FramePreprocessor {
    range_filter: RangeFilter,
    segmenter: GroundSegmenter,
}

impl FramePreprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            range_filter: RangeFilter::new(config.bounds),
            segmenter: GroundSegmenter::new(config.ground),
        }
    }

    /// Process a frame through the full pipeline.
    ///
    /// Steps:
    /// 1. Range filter (three axis passes)
    /// 2. RANSAC ground plane fit
    /// 3. Positive and negative extraction over the inlier set
    pub fn process(&mut self, cloud: &PointCloud) -> SegmentedFrame {
        let filtered = self.range_filter.apply(cloud);
        let result = self.segmenter.segment(&filtered);
        let (ground, non_ground) = partition(&filtered, &result);

        log::debug!(
            "Frame: {} raw → {} in range → {} ground / {} non-ground ({} iterations)",
            cloud.len(),
            filtered.len(),
            ground.len(),
            non_ground.len(),
            result.iterations
        );

        SegmentedFrame {
            ground,
            non_ground,
            plane: result.plane,
            range_filtered_len: filtered.len(),
        }
    }

    pub fn range_filter(&self) -> &RangeFilter {
        &self.range_filter
    }
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self::new(PreprocessorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame() -> PointCloud {
        let mut cloud = PointCloud::new("os_sensor").with_timestamp(1_000);
        // Ground grid at z = -0.5
        for i in 0..30 {
            for j in 0..30 {
                cloud.push_xyz(i as f32 * 0.5 - 7.5, j as f32 * 0.5 - 7.5, -0.5);
            }
        }
        // Box-shaped obstacle above the ground
        for i in 0..5 {
            for k in 0..5 {
                cloud.push_xyz(3.0 + i as f32 * 0.1, 2.0, -0.2 + k as f32 * 0.15);
            }
        }
        // Out of range points
        cloud.push_xyz(50.0, 0.0, 0.0);
        cloud.push_xyz(0.0, 0.0, 5.0);
        cloud
    }

    #[test]
    fn test_pipeline_partitions_in_range_points() {
        let config = PreprocessorConfig {
            ground: GroundSegmenterConfig::default().with_seed(3),
            ..Default::default()
        };
        let mut preprocessor = FramePreprocessor::new(config);
        let cloud = create_test_frame();

        let frame = preprocessor.process(&cloud);

        assert_eq!(frame.range_filtered_len, 925);
        assert_eq!(frame.ground.len() + frame.non_ground.len(), 925);
        assert_eq!(frame.ground.len(), 900);
        assert_eq!(frame.non_ground.len(), 25);
        assert_eq!(frame.non_ground.frame_id, "os_sensor");
        assert_eq!(frame.non_ground.timestamp_us, 1_000);
    }

    #[test]
    fn test_empty_frame() {
        let mut preprocessor = FramePreprocessor::default();
        let frame = preprocessor.process(&PointCloud::new("os_sensor"));
        assert!(frame.ground.is_empty());
        assert!(frame.non_ground.is_empty());
        assert!(frame.plane.is_none());
    }

    #[test]
    fn test_filter_trait_names() {
        let filters: Vec<Box<dyn CloudFilter>> = vec![
            Box::new(RangeFilter::default()),
            Box::new(AxisPassFilter::new(crate::core::types::Axis::Z, -1.0, 1.0)),
        ];
        let names: Vec<_> = filters.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["RangeFilter", "AxisPassFilter"]);
    }
}

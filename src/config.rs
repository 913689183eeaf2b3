//! Configuration loading for Drishti
//!
//! Loaded once at startup from TOML; every section and field is optional.
//!
//! ```toml
//! [range]
//! max_x_range = 20.0
//! min_z_range = -0.7
//!
//! [ground]
//! ransac_distance_threshold = 0.1
//! ransac_max_iterations = 500
//!
//! [timer]
//! period_ms = 200
//!
//! [frames]
//! sensor_frame = "os_sensor"
//! world_frame = "camera_init"
//!
//! [[frames.static_transforms]]
//! parent = "camera_init"
//! child = "os_sensor"
//! translation = [0.0, 0.0, 0.5]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::core::types::RangeBounds;
use crate::engine::EngineConfig;
use crate::error::{DrishtiError, Result};
use crate::preprocessing::{GroundSegmenterConfig, PreprocessorConfig};
use crate::publish::PublisherConfig;
use crate::transform::StaticTransformConfig;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub range: RangeBounds,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Ground segmentation parameters
#[derive(Clone, Debug, Deserialize)]
pub struct GroundConfig {
    /// Inlier distance to the plane in meters (default: 0.1)
    #[serde(default = "default_distance_threshold")]
    pub ransac_distance_threshold: f32,

    /// RANSAC iteration cap (default: 500)
    #[serde(default = "default_max_iterations")]
    pub ransac_max_iterations: usize,

    /// Minimum inliers for a plane to count (default: 3)
    #[serde(default = "default_min_inliers")]
    pub min_inliers: usize,

    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Periodic inference timer
#[derive(Clone, Debug, Deserialize)]
pub struct TimerConfig {
    /// Tick period in milliseconds (default: 200)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

/// Reference frames and static transforms
#[derive(Clone, Debug, Deserialize)]
pub struct FramesConfig {
    /// Frame of incoming clouds and detections (default: "os_sensor")
    #[serde(default = "default_sensor_frame")]
    pub sensor_frame: String,

    /// Frame markers are published in (default: "camera_init")
    #[serde(default = "default_world_frame")]
    pub world_frame: String,

    /// Parent/child transforms served to the publisher
    #[serde(default)]
    pub static_transforms: Vec<StaticTransformConfig>,
}

/// Marker publishing
#[derive(Clone, Debug, Deserialize)]
pub struct PublishConfig {
    /// Detection marker lifetime in seconds (default: 0.45)
    #[serde(default = "default_box_lifetime")]
    pub box_lifetime_s: f32,
}

/// Frame input
#[derive(Clone, Debug, Deserialize)]
pub struct InputConfig {
    /// Bounded input queue capacity (default: 1)
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// Directory of point files to replay
    #[serde(default)]
    pub replay_dir: Option<String>,

    /// Replay rate in frames per second, 0 for unthrottled (default: 10.0)
    #[serde(default = "default_replay_rate")]
    pub replay_rate_hz: f32,

    /// Restart replay after the last file (default: false)
    #[serde(default)]
    pub replay_loop: bool,
}

/// Output sinks
#[derive(Clone, Debug, Deserialize)]
pub struct OutputConfig {
    /// Directory for JSON-lines output; logging only when unset
    #[serde(default)]
    pub jsonl_dir: Option<String>,

    /// Statistics log interval in seconds, 0 disables (default: 5)
    #[serde(default = "default_stats_interval")]
    pub stats_interval_s: u64,
}

// Default value functions
fn default_distance_threshold() -> f32 {
    0.1
}
fn default_max_iterations() -> usize {
    500
}
fn default_min_inliers() -> usize {
    3
}
fn default_period_ms() -> u64 {
    200
}
fn default_sensor_frame() -> String {
    "os_sensor".to_string()
}
fn default_world_frame() -> String {
    "camera_init".to_string()
}
fn default_box_lifetime() -> f32 {
    0.45
}
fn default_queue_size() -> usize {
    1
}
/// Slowest accepted replay rate (one frame every 100 s)
pub const MIN_REPLAY_RATE_HZ: f32 = 0.01;

/// Fastest accepted replay rate
pub const MAX_REPLAY_RATE_HZ: f32 = 1000.0;

fn default_replay_rate() -> f32 {
    10.0
}
fn default_stats_interval() -> u64 {
    5
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            ransac_distance_threshold: default_distance_threshold(),
            ransac_max_iterations: default_max_iterations(),
            min_inliers: default_min_inliers(),
            seed: None,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            sensor_frame: default_sensor_frame(),
            world_frame: default_world_frame(),
            static_transforms: Vec::new(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            box_lifetime_s: default_box_lifetime(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            queue_size: default_queue_size(),
            replay_dir: None,
            replay_rate_hz: default_replay_rate(),
            replay_loop: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jsonl_dir: None,
            stats_interval_s: default_stats_interval(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DrishtiError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.range.validate().map_err(DrishtiError::Config)?;

        let threshold = self.ground.ransac_distance_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(DrishtiError::Config(
                "ground.ransac_distance_threshold must be positive".to_string(),
            ));
        }
        if self.ground.ransac_max_iterations == 0 {
            return Err(DrishtiError::Config(
                "ground.ransac_max_iterations must be at least 1".to_string(),
            ));
        }
        if self.timer.period_ms == 0 {
            return Err(DrishtiError::Config(
                "timer.period_ms must be at least 1".to_string(),
            ));
        }
        if self.input.queue_size == 0 {
            return Err(DrishtiError::Config(
                "input.queue_size must be at least 1".to_string(),
            ));
        }
        let rate = self.input.replay_rate_hz;
        if !(rate == 0.0 || (MIN_REPLAY_RATE_HZ..=MAX_REPLAY_RATE_HZ).contains(&rate)) {
            return Err(DrishtiError::Config(format!(
                "input.replay_rate_hz must be 0 or within {}..={} Hz, got {}",
                MIN_REPLAY_RATE_HZ, MAX_REPLAY_RATE_HZ, rate
            )));
        }
        Ok(())
    }

    pub fn preprocessor_config(&self) -> PreprocessorConfig {
        let mut ground = GroundSegmenterConfig::default()
            .with_distance_threshold(self.ground.ransac_distance_threshold)
            .with_max_iterations(self.ground.ransac_max_iterations)
            .with_min_inliers(self.ground.min_inliers);
        if let Some(seed) = self.ground.seed {
            ground = ground.with_seed(seed);
        }

        PreprocessorConfig {
            bounds: self.range,
            ground,
        }
    }

    pub fn publisher_config(&self) -> PublisherConfig {
        PublisherConfig {
            sensor_frame: self.frames.sensor_frame.clone(),
            world_frame: self.frames.world_frame.clone(),
            box_lifetime_s: self.publish.box_lifetime_s,
        }
    }

    /// Log the effective parameters
    pub fn log_summary(&self) {
        log::info!("max_x_range: {}", self.range.max_x_range);
        log::info!("min_x_range: {}", self.range.min_x_range);
        log::info!("max_y_range: {}", self.range.max_y_range);
        log::info!("min_y_range: {}", self.range.min_y_range);
        log::info!("max_z_range: {}", self.range.max_z_range);
        log::info!("min_z_range: {}", self.range.min_z_range);
        log::info!(
            "ransac_distance_threshold: {}",
            self.ground.ransac_distance_threshold
        );
        log::info!("ransac_max_iterations: {}", self.ground.ransac_max_iterations);
        log::info!("timer period: {} ms", self.timer.period_ms);
        log::info!(
            "frames: {} -> {} ({} static transforms)",
            self.frames.sensor_frame,
            self.frames.world_frame,
            self.frames.static_transforms.len()
        );
    }
}

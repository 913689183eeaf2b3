//! Detection engine abstraction.
//!
//! The node treats the detector as an external collaborator: it hands over
//! the latest non-ground cloud, asks for one inference, and reads back the
//! resulting detection list. Only that call contract lives here.
//!
//! # Engines
//!
//! | Kind | Description |
//! |------|-------------|
//! | `mock` | Scripted engine returning a fixed list ([`MockEngine`]) |

mod mock;

pub use mock::MockEngine;

use std::sync::Arc;

use serde::Deserialize;

use crate::core::types::{Detection, PointCloud};
use crate::error::{DrishtiError, EngineError};

/// Result alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Object detection engine.
///
/// Calls happen in a fixed order per cycle: `set_input_cloud`, `infer`,
/// then `detections`. The list returned by `detections` stays valid until
/// the next successful `infer`.
pub trait DetectionEngine: Send {
    /// Build the engine. Called once at startup; failure is fatal.
    fn init(&mut self, config: &EngineConfig) -> EngineResult<()>;

    /// Hand over the cloud for the next inference.
    fn set_input_cloud(&mut self, cloud: Arc<PointCloud>);

    /// Run one inference over the current input cloud.
    fn infer(&mut self) -> EngineResult<()>;

    /// Detections from the last successful inference.
    fn detections(&self) -> &[Detection];

    /// Engine name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Engine selection and parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Engine kind ("mock")
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Model file handed to the engine at init
    #[serde(default)]
    pub model_path: Option<String>,

    /// Detections returned on every successful inference (mock)
    #[serde(default)]
    pub detections: Vec<Detection>,

    /// Fail every Nth inference, 0 = never (mock)
    #[serde(default)]
    pub fail_every: u32,

    /// Simulated inference latency in milliseconds (mock)
    #[serde(default)]
    pub latency_ms: u64,

    /// Fail at init (mock)
    #[serde(default)]
    pub fail_init: bool,
}

fn default_kind() -> String {
    "mock".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            model_path: None,
            detections: Vec::new(),
            fail_every: 0,
            latency_ms: 0,
            fail_init: false,
        }
    }
}

/// Create and initialize the engine named by `config.kind`.
pub fn create_engine(config: &EngineConfig) -> crate::error::Result<Box<dyn DetectionEngine>> {
    let mut engine: Box<dyn DetectionEngine> = match config.kind.to_lowercase().as_str() {
        "mock" => Box::new(MockEngine::new()),
        other => {
            return Err(DrishtiError::Config(format!(
                "Unknown engine kind '{}'",
                other
            )));
        }
    };

    engine.init(config)?;
    log::info!("{} engine build succeeded", engine.name());
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_engine() {
        let engine = create_engine(&EngineConfig::default()).unwrap();
        assert_eq!(engine.name(), "mock");
        assert!(engine.detections().is_empty());
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let config = EngineConfig {
            kind: "tensorrt".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_engine(&config),
            Err(DrishtiError::Config(_))
        ));
    }

    #[test]
    fn test_init_failure_propagates() {
        let config = EngineConfig {
            fail_init: true,
            ..Default::default()
        };
        assert!(matches!(
            create_engine(&config),
            Err(DrishtiError::Engine(EngineError::InitFailed(_)))
        ));
    }
}

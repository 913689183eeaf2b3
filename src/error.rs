//! Error types for Drishti

use thiserror::Error;

/// Drishti error type
#[derive(Error, Debug)]
pub enum DrishtiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Detection engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Thread error: {0}")]
    Thread(String),
}

impl From<toml::de::Error> for DrishtiError {
    fn from(e: toml::de::Error) -> Self {
        DrishtiError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for DrishtiError {
    fn from(e: serde_json::Error) -> Self {
        DrishtiError::Io(e.into())
    }
}

/// Errors reported by a detection engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Engine build failed: {0}")]
    InitFailed(String),

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Inference failed: {0}")]
    InferFailed(String),
}

/// Errors reported by a frame transform lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("No transform from '{from_frame}' to '{to_frame}'")]
    NotFound { from_frame: String, to_frame: String },

    #[error("Transform service unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, DrishtiError>;

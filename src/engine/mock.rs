//! Scripted detection engine for hardware-free runs and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{DetectionEngine, EngineConfig, EngineResult};
use crate::core::types::{Detection, PointCloud};
use crate::error::EngineError;

/// Call counters observable from outside the engine.
#[derive(Debug, Default)]
pub struct MockCounters {
    /// Total `infer` calls
    pub infer_calls: AtomicU64,
    /// Inferences currently running
    pub active: AtomicUsize,
    /// Highest number of overlapping inferences seen
    pub max_active: AtomicUsize,
    /// Point count of the last input cloud
    pub last_input_len: AtomicUsize,
}

/// Engine returning a fixed detection list.
pub struct MockEngine {
    script: Vec<Detection>,
    output: Vec<Detection>,
    input: Option<Arc<PointCloud>>,
    fail_every: u32,
    latency: Duration,
    initialized: bool,
    counters: Arc<MockCounters>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            output: Vec::new(),
            input: None,
            fail_every: 0,
            latency: Duration::ZERO,
            initialized: false,
            counters: Arc::new(MockCounters::default()),
        }
    }

    /// Set the detection list returned by every successful inference.
    pub fn with_detections(mut self, detections: Vec<Detection>) -> Self {
        self.script = detections;
        self
    }

    /// Fail every Nth inference (1-based; 0 disables).
    pub fn with_fail_every(mut self, n: u32) -> Self {
        self.fail_every = n;
        self
    }

    /// Sleep this long inside every inference.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Shared handle to the call counters.
    pub fn counters(&self) -> Arc<MockCounters> {
        Arc::clone(&self.counters)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionEngine for MockEngine {
    fn init(&mut self, config: &EngineConfig) -> EngineResult<()> {
        if config.fail_init {
            return Err(EngineError::InitFailed(
                "mock engine configured to fail".to_string(),
            ));
        }
        if !config.detections.is_empty() {
            self.script = config.detections.clone();
        }
        if config.fail_every > 0 {
            self.fail_every = config.fail_every;
        }
        if config.latency_ms > 0 {
            self.latency = Duration::from_millis(config.latency_ms);
        }
        if let Some(path) = &config.model_path {
            log::debug!("Mock engine ignoring model '{}'", path);
        }
        self.initialized = true;
        Ok(())
    }

    fn set_input_cloud(&mut self, cloud: Arc<PointCloud>) {
        self.counters
            .last_input_len
            .store(cloud.len(), Ordering::Relaxed);
        self.input = Some(cloud);
    }

    fn infer(&mut self) -> EngineResult<()> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        let call = self.counters.infer_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let result = if self.fail_every > 0 && call % u64::from(self.fail_every) == 0 {
            Err(EngineError::InferFailed(format!("scripted failure on call {}", call)))
        } else {
            self.output = self.script.clone();
            Ok(())
        };

        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn detections(&self) -> &[Detection] {
        &self.output
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

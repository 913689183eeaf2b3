//! Point cloud replay from ASCII files.
//!
//! Stands in for the sensor driver: every `.xyz`, `.csv` or `.txt` file in a
//! directory is one frame, replayed in lexical file-name order.
//!
//! # File Format
//!
//! ```text
//! # comment
//! 1.20 0.35 -0.51
//! 1.21,0.36,-0.50,12     # extra columns ignored
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};

use crate::core::time::now_us;
use crate::core::types::PointCloud;
use crate::error::{DrishtiError, Result};
use crate::state::NodeStats;

const EXTENSIONS: [&str; 3] = ["xyz", "csv", "txt"];

/// Parse one frame from text. Malformed lines are skipped.
pub fn parse_cloud(text: &str, frame_id: &str) -> PointCloud {
    let mut cloud = PointCloud::new(frame_id);
    let mut skipped = 0usize;

    for line in text.lines() {
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .map(str::parse::<f32>);

        match (fields.next(), fields.next(), fields.next()) {
            (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => cloud.push_xyz(x, y, z),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed lines", skipped);
    }
    cloud
}

/// Load one frame file.
pub fn load_cloud<P: AsRef<Path>>(path: P, frame_id: &str) -> Result<PointCloud> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(parse_cloud(&text, frame_id))
}

/// Frame files found in a directory.
pub struct CloudReplay {
    files: Vec<PathBuf>,
    frame_id: String,
    rate_hz: f32,
    looping: bool,
    index: usize,
}

impl CloudReplay {
    /// Scan `dir` for frame files.
    pub fn open<P: AsRef<Path>>(dir: P, frame_id: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .collect();

        if files.is_empty() {
            return Err(DrishtiError::Config(format!(
                "No point cloud files in {}",
                dir.display()
            )));
        }
        files.sort();

        Ok(Self {
            files,
            frame_id: frame_id.to_string(),
            rate_hz: 10.0,
            looping: false,
            index: 0,
        })
    }

    /// Frames per second during [`CloudReplay::run`].
    pub fn with_rate(mut self, rate_hz: f32) -> Self {
        self.rate_hz = rate_hz;
        self
    }

    /// Restart from the first file after the last one.
    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Next frame, stamped with the current time.
    ///
    /// Unreadable files are logged and skipped.
    pub fn next_frame(&mut self) -> Option<PointCloud> {
        let mut attempts = 0;
        while attempts < self.files.len() {
            if self.index >= self.files.len() {
                if !self.looping {
                    return None;
                }
                self.index = 0;
            }

            let path = &self.files[self.index];
            self.index += 1;
            attempts += 1;

            match load_cloud(path, &self.frame_id) {
                Ok(cloud) => return Some(cloud.with_timestamp(now_us())),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        None
    }

    /// Push frames into `tx` at the configured rate until exhausted or
    /// `running` is cleared. Frames are dropped when the queue is full.
    pub fn run(mut self, tx: Sender<PointCloud>, running: Arc<AtomicBool>, stats: Arc<NodeStats>) {
        let period = frame_period(self.rate_hz);
        log::info!(
            "Replaying {} frames at {:.1} Hz{}",
            self.files.len(),
            self.rate_hz,
            if self.looping { " (looping)" } else { "" }
        );

        let mut sent = 0u64;
        while running.load(Ordering::Relaxed) {
            let start = Instant::now();
            let Some(cloud) = self.next_frame() else {
                log::info!("Replay finished after {} frames", sent);
                break;
            };

            match tx.try_send(cloud) {
                Ok(()) => sent += 1,
                Err(TrySendError::Full(_)) => {
                    log::debug!("Input queue full, dropping replay frame");
                    stats.record_dropped(1);
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::warn!("Input channel closed, stopping replay");
                    break;
                }
            }

            if let Some(remaining) = period.checked_sub(start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }
}

/// Delay between frames at `rate_hz`.
///
/// Zero, negative and non-finite rates replay unthrottled, as does a rate
/// whose period does not fit in a [`Duration`].
fn frame_period(rate_hz: f32) -> Duration {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(1.0 / rate_hz).unwrap_or_else(|_| {
        log::warn!("Replay rate {} Hz out of range, replaying unthrottled", rate_hz);
        Duration::ZERO
    })
}

impl Iterator for CloudReplay {
    type Item = PointCloud;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

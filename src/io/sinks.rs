//! Output sinks for the three published streams.
//!
//! | Sink | Transport |
//! |------|-----------|
//! | [`ChannelSink`] | crossbeam channel, non-blocking |
//! | [`LogSink`] | one log line per item |
//! | [`JsonLinesSink`] | one JSON object per line to any writer |

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crossbeam_channel::{Sender, TrySendError};
use serde::Serialize;

use crate::core::types::PointCloud;
use crate::error::{DrishtiError, Result};
use crate::publish::{BoxMarker, MarkerBatch};

/// Topic names, one per output stream.
pub mod topics {
    pub const NON_GROUND: &str = "/non_ground_points";
    pub const DETECTIONS: &str = "/centerpoint/dets";
    pub const RANGE: &str = "/filtered_points_range";
}

/// Destination for one output stream.
pub trait Sink<T>: Send {
    /// Publish one item.
    fn publish(&mut self, item: &T) -> Result<()>;

    /// Sink name for diagnostics.
    fn name(&self) -> &str;
}

/// One-line description of a published item.
pub trait Summary {
    fn summary(&self) -> String;
}

impl Summary for PointCloud {
    fn summary(&self) -> String {
        format!("{} points in '{}'", self.len(), self.frame_id)
    }
}

impl Summary for MarkerBatch {
    fn summary(&self) -> String {
        format!("{} markers", self.len())
    }
}

impl Summary for BoxMarker {
    fn summary(&self) -> String {
        format!(
            "{}/{} at ({:.2}, {:.2}, {:.2}) in '{}'",
            self.namespace,
            self.id,
            self.position.x,
            self.position.y,
            self.position.z,
            self.frame_id
        )
    }
}

/// Sends clones into a bounded channel, dropping when full.
pub struct ChannelSink<T> {
    topic: String,
    tx: Sender<T>,
    dropped: u64,
}

impl<T> ChannelSink<T> {
    pub fn new(topic: &str, tx: Sender<T>) -> Self {
        Self {
            topic: topic.to_string(),
            tx,
            dropped: 0,
        }
    }

    /// Items dropped because the receiver was behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<T: Clone + Send> Sink<T> for ChannelSink<T> {
    fn publish(&mut self, item: &T) -> Result<()> {
        match self.tx.try_send(item.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::debug!("{}: receiver behind, dropping item", self.topic);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(DrishtiError::Channel(format!(
                "{} receiver disconnected",
                self.topic
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// Logs a one-line summary of every item.
pub struct LogSink {
    topic: String,
}

impl LogSink {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
        }
    }
}

impl<T: Summary> Sink<T> for LogSink {
    fn publish(&mut self, item: &T) -> Result<()> {
        log::debug!("{}: {}", self.topic, item.summary());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// JSON-lines record wrapper.
#[derive(Serialize)]
struct Record<'a, T> {
    topic: &'a str,
    data: &'a T,
}

/// Writes `{"topic": ..., "data": ...}` lines.
pub struct JsonLinesSink<W: Write + Send> {
    topic: String,
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(topic: &str, writer: W) -> Self {
        Self {
            topic: topic.to_string(),
            writer,
        }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (truncating) a JSON-lines file.
    pub fn create<P: AsRef<Path>>(topic: &str, path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(topic, BufWriter::new(file)))
    }
}

impl<T: Serialize, W: Write + Send> Sink<T> for JsonLinesSink<W> {
    fn publish(&mut self, item: &T) -> Result<()> {
        let record = Record {
            topic: &self.topic,
            data: item,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// The three output streams of the node.
pub struct OutputSinks {
    pub non_ground: Box<dyn Sink<PointCloud>>,
    pub detections: Box<dyn Sink<MarkerBatch>>,
    pub range: Box<dyn Sink<BoxMarker>>,
}

impl OutputSinks {
    /// Log-only sinks for every stream.
    pub fn logging() -> Self {
        Self {
            non_ground: Box::new(LogSink::new(topics::NON_GROUND)),
            detections: Box::new(LogSink::new(topics::DETECTIONS)),
            range: Box::new(LogSink::new(topics::RANGE)),
        }
    }
}

/// Publish to a sink, logging instead of failing.
pub fn publish_or_log<T>(sink: &mut dyn Sink<T>, item: &T) {
    if let Err(e) = sink.publish(item) {
        log::warn!("Publish to {} failed: {}", sink.name(), e);
    }
}

//! Infrastructure: frame sources and output sinks.

pub mod replay;
pub mod sinks;

pub use replay::{CloudReplay, load_cloud, parse_cloud};
pub use sinks::{
    ChannelSink, JsonLinesSink, LogSink, OutputSinks, Sink, Summary, publish_or_log, topics,
};

//! State shared between the frame and timer threads.

mod cloud_slot;
mod stats;

pub use cloud_slot::{CloudSlot, Snapshot};
pub use stats::{NodeStats, StatsSnapshot};

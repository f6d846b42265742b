//! Snapshot aggregation and refresh scheduling.
//!
//! [`SnapshotAggregator`] merges weather and activity into one [`Snapshot`],
//! substituting fixed sample readings for whichever side fails.
//! [`RefreshScheduler`] runs it immediately and then on a fixed interval,
//! handing each result to a [`SnapshotSink`].

pub mod aggregator;
pub mod render;
pub mod scheduler;
pub mod types;

mod test_utils;

pub use aggregator::{Branch, BranchError, SnapshotAggregator, SnapshotReport};
pub use render::{Formatter, TerminalSink};
pub use scheduler::{RefreshScheduler, SnapshotSink};
pub use types::Snapshot;

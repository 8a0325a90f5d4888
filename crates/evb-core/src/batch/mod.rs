//! Time-windowed batch files.
//!
//! [`RotatingBatchWriter`] owns at most one open file at a time. The time of
//! the first event written into a file is its `anchor`. An event at or after
//! `anchor + batch_interval` closes the file and opens the next one; earlier
//! events, including ones before the anchor, stay in the open file.
//!
//! Files are created through a [`SinkOpener`]. [`FsOpener`] is the default.

mod naming;
mod session;
mod stats;
mod writer;

pub use naming::{FILE_EXTENSION, batch_file_name};
pub use session::{BatchSink, ClosedBatch, FsOpener, SinkOpener};
pub use stats::WriterStats;
pub use writer::{IngestSummary, RotatingBatchWriter, WriterOptions};

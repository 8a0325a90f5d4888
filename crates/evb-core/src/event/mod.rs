//! Event records accepted by the batch writer.
//!
//! The writer only needs two things from a record: the event time that drives
//! window assignment and the row of cells that lands in the output file. Both
//! are expressed by [`BatchEvent`]; [`UserEvent`] is the record type served by
//! the HTTP ingress.

mod decode;
mod user;

pub use decode::{DecodeError, decode_line, decode_lines};
pub use user::UserEvent;

use chrono::{DateTime, Utc};

/// A record that can be placed into a time-windowed batch file.
pub trait BatchEvent {
    /// When the real-world action happened. Supplied by the producer, not the
    /// wall clock.
    fn event_time(&self) -> DateTime<Utc>;

    /// Cells of the output row, in file column order.
    fn csv_row(&self) -> Vec<String>;
}

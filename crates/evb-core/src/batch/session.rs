use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::BatchError;

// ---------------------------------------------------------------------------
// BatchSink / SinkOpener: where batch rows end up
// ---------------------------------------------------------------------------

/// Byte destination of one batch file.
pub trait BatchSink: Write + Send {
    /// Make everything written so far durable.
    fn sync(&mut self) -> io::Result<()>;
}

impl BatchSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Creates the sink for a new batch path.
///
/// Must refuse an existing path with [`ErrorKind::AlreadyExists`] instead of
/// truncating it.
pub trait SinkOpener: Send + Sync {
    fn open_new(&self, path: &Path) -> io::Result<Box<dyn BatchSink>>;
}

/// Opens batch files on the local filesystem with exclusive creation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOpener;

impl SinkOpener for FsOpener {
    fn open_new(&self, path: &Path) -> io::Result<Box<dyn BatchSink>> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Box::new(file))
    }
}

pub(super) fn fs_opener() -> Arc<dyn SinkOpener> {
    Arc::new(FsOpener)
}

/// Summary of a batch file that has been flushed and closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedBatch {
    pub path: PathBuf,
    pub first_event_time: DateTime<Utc>,
    pub rows: u64,
}

/// The currently open batch file. Exists only while the file is open, so the
/// file handle, sink, anchor and open time are always set together.
pub(super) struct Session {
    path: PathBuf,
    sink: csv::Writer<Box<dyn BatchSink>>,
    first_event_time: DateTime<Utc>,
    opened_at: Instant,
    rows: u64,
}

impl Session {
    /// Create `path` exclusively. An existing file is never truncated.
    pub(super) fn create(
        opener: &dyn SinkOpener,
        path: PathBuf,
        first_event_time: DateTime<Utc>,
        opened_at: Instant,
    ) -> Result<Self, BatchError> {
        let file = match opener.open_new(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BatchError::FileConflict { path });
            }
            Err(source) => return Err(BatchError::Create { path, source }),
        };
        let sink = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Ok(Self {
            path,
            sink,
            first_event_time,
            opened_at,
            rows: 0,
        })
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    pub(super) fn first_event_time(&self) -> DateTime<Utc> {
        self.first_event_time
    }

    pub(super) fn rows(&self) -> u64 {
        self.rows
    }

    /// `false` once `time` reaches `first_event_time + interval`. Events
    /// earlier than the anchor stay in the open window.
    pub(super) fn covers(&self, time: DateTime<Utc>, interval: TimeDelta) -> bool {
        time.signed_duration_since(self.first_event_time) < interval
    }

    /// `true` once the session has been open for at least `idle_after`.
    pub(super) fn is_idle(&self, idle_after: std::time::Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.opened_at) >= idle_after
    }

    pub(super) fn append(&mut self, row: &[String]) -> io::Result<()> {
        self.sink.write_record(row).map_err(io::Error::from)?;
        self.rows += 1;
        Ok(())
    }

    pub(super) fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Flush buffered rows, sync the file and release the handle.
    pub(super) fn close(self) -> io::Result<ClosedBatch> {
        let Self {
            path,
            sink,
            first_event_time,
            rows,
            ..
        } = self;
        let mut file = sink.into_inner().map_err(|e| e.into_error())?;
        file.sync()?;
        Ok(ClosedBatch {
            path,
            first_event_time,
            rows,
        })
    }
}

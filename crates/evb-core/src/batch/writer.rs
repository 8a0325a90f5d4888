use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use tracing::Span;

use crate::error::BatchError;
use crate::event::{BatchEvent, decode_lines};

use super::naming::batch_file_name;
use super::session::{ClosedBatch, Session, SinkOpener, fs_opener};
use super::stats::{StatsCounters, WriterStats};

// ---------------------------------------------------------------------------
// WriterOptions
// ---------------------------------------------------------------------------

/// Construction parameters of a [`RotatingBatchWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Destination directory. Must already exist; the writer never creates it.
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Width of a batch window in event time. Must be > 0.
    pub batch_interval: Duration,
}

/// Outcome of a fully consumed request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub events: usize,
}

// ---------------------------------------------------------------------------
// RotatingBatchWriter
// ---------------------------------------------------------------------------

/// Writes events into time-windowed files, rotating when an event reaches
/// the end of the open file's window.
///
/// A single mutex guards the whole session. File creation, appends, flushes
/// and closes all run while it is held, so the request path and the idle
/// closer observe session transitions in one total order.
pub struct RotatingBatchWriter<E> {
    output_dir: PathBuf,
    file_prefix: String,
    batch_interval: TimeDelta,
    session: Mutex<Option<Session>>,
    opener: Arc<dyn SinkOpener>,
    stats: StatsCounters,
    span: Span,
    _event: PhantomData<fn(&E)>,
}

impl<E: BatchEvent> RotatingBatchWriter<E> {
    pub fn new(options: WriterOptions) -> Result<Self, BatchError> {
        if options.batch_interval.is_zero() {
            return Err(BatchError::InvalidInterval);
        }
        let batch_interval =
            TimeDelta::from_std(options.batch_interval).map_err(|_| BatchError::InvalidInterval)?;
        Ok(Self {
            output_dir: options.output_dir,
            file_prefix: options.file_prefix,
            batch_interval,
            session: Mutex::new(None),
            opener: fs_opener(),
            stats: StatsCounters::default(),
            span: Span::none(),
            _event: PhantomData,
        })
    }

    /// Emit all writer log events inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Create batch files through `opener` instead of the local filesystem.
    #[must_use]
    pub fn with_opener(mut self, opener: Arc<dyn SinkOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one event, rotating first if it is at or past the end of the
    /// open window. Events earlier than the anchor go into the open file.
    ///
    /// A rotation failure aborts before the event is written. A write failure
    /// leaves the session open with the rows written so far.
    pub fn submit(&self, event: &E) -> Result<(), BatchError> {
        let mut slot = self.lock();
        let event_time = event.event_time();

        if let Some(session) = slot.take() {
            if session.covers(event_time, self.batch_interval) {
                *slot = Some(session);
            } else {
                self.rotate(session, event_time)?;
            }
        }

        let session = match slot.take() {
            Some(session) => session,
            None => self.open_session(event_time)?,
        };
        let session = slot.insert(session);

        if let Err(source) = session.append(&event.csv_row()) {
            self.stats.inc_write_errors();
            return Err(BatchError::Write {
                path: session.path().to_path_buf(),
                source,
            });
        }
        self.stats.inc_rows();
        Ok(())
    }

    /// Flush and close the open file, if any. Idempotent.
    pub fn close_active_session(&self) -> Result<Option<ClosedBatch>, BatchError> {
        let mut slot = self.lock();
        let Some(session) = slot.take() else {
            return Ok(None);
        };
        let closed = self.close_session(session)?;
        tracing::info!(
            parent: &self.span,
            domain = "pipe",
            path = %closed.path.display(),
            rows = closed.rows,
            "closed batch file"
        );
        Ok(Some(closed))
    }

    /// Close the open file if it was opened at least `idle_after` before `now`.
    pub fn close_if_idle(
        &self,
        idle_after: Duration,
        now: Instant,
    ) -> Result<Option<ClosedBatch>, BatchError> {
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(session) if session.is_idle(idle_after, now) => {}
            _ => return Ok(None),
        }
        let Some(session) = slot.take() else {
            return Ok(None);
        };
        let closed = self.close_session(session)?;
        self.stats.inc_idle_closes();
        tracing::info!(
            parent: &self.span,
            domain = "pipe",
            path = %closed.path.display(),
            rows = closed.rows,
            "closing expired file"
        );
        Ok(Some(closed))
    }

    /// Push buffered rows of the open file to the OS without closing it.
    pub fn flush(&self) -> Result<(), BatchError> {
        let mut slot = self.lock();
        if let Some(session) = slot.as_mut() {
            session.flush().map_err(|source| BatchError::Write {
                path: session.path().to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Decode a newline-delimited request body and submit every event in
    /// order, then flush.
    ///
    /// The first failing line aborts the request. Rows written for earlier
    /// lines stay in place.
    pub fn handle_request_body(&self, body: &[u8]) -> Result<IngestSummary, BatchError>
    where
        E: DeserializeOwned,
    {
        let mut events = 0;
        for decoded in decode_lines::<E>(body) {
            let event = decoded?;
            self.submit(&event)?;
            events += 1;
        }
        self.flush()?;
        tracing::debug!(parent: &self.span, domain = "pipe", events, "request body consumed");
        Ok(IngestSummary { events })
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Path of the open file, if any.
    pub fn active_path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|s| s.path().to_path_buf())
    }

    pub fn stats(&self) -> WriterStats {
        self.stats.snapshot()
    }

    // -- internals ----------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().expect("batch session lock poisoned")
    }

    fn open_session(&self, anchor: DateTime<Utc>) -> Result<Session, BatchError> {
        let path = self
            .output_dir
            .join(batch_file_name(&self.file_prefix, anchor));
        let session = Session::create(self.opener.as_ref(), path, anchor, Instant::now())?;
        self.stats.inc_opened();
        tracing::debug!(
            parent: &self.span,
            domain = "pipe",
            path = %session.path().display(),
            anchor = %anchor,
            "opened batch file"
        );
        Ok(session)
    }

    fn rotate(&self, session: Session, next_event_time: DateTime<Utc>) -> Result<(), BatchError> {
        let path = session.path().to_path_buf();
        let anchor = session.first_event_time();
        let rows = session.rows();
        if let Err(source) = session.close() {
            self.stats.inc_close_errors();
            return Err(BatchError::Rotation { path, source });
        }
        self.stats.inc_closed();
        self.stats.inc_rotations();
        tracing::info!(
            parent: &self.span,
            domain = "pipe",
            path = %path.display(),
            rows,
            anchor = %anchor,
            next = %next_event_time,
            "rotated batch file"
        );
        Ok(())
    }

    fn close_session(&self, session: Session) -> Result<ClosedBatch, BatchError> {
        let path = session.path().to_path_buf();
        match session.close() {
            Ok(closed) => {
                self.stats.inc_closed();
                Ok(closed)
            }
            Err(source) => {
                self.stats.inc_close_errors();
                Err(BatchError::Close { path, source })
            }
        }
    }
}

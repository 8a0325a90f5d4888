use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the writer's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub files_opened: u64,
    /// Files closed cleanly (flushed and synced).
    pub files_closed: u64,
    /// Closes that failed. The session is dropped either way.
    pub close_errors: u64,
    /// Closes triggered by an event outside the current window.
    pub rotations: u64,
    /// Closes triggered by the idle timeout.
    pub idle_closes: u64,
    pub rows_written: u64,
    pub write_errors: u64,
}

impl WriterStats {
    /// Files opened and not yet closed. Never exceeds one.
    pub fn open_files(&self) -> u64 {
        self.files_opened
            .saturating_sub(self.files_closed)
            .saturating_sub(self.close_errors)
    }
}

/// Lock-free counters shared by all writer operations.
#[derive(Default)]
pub(super) struct StatsCounters {
    files_opened: AtomicU64,
    files_closed: AtomicU64,
    close_errors: AtomicU64,
    rotations: AtomicU64,
    idle_closes: AtomicU64,
    rows_written: AtomicU64,
    write_errors: AtomicU64,
}

impl StatsCounters {
    pub(super) fn inc_opened(&self) {
        self.files_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_closed(&self) {
        self.files_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_close_errors(&self) {
        self.close_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_rotations(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_idle_closes(&self) {
        self.idle_closes.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_rows(&self) {
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn inc_write_errors(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> WriterStats {
        WriterStats {
            files_opened: self.files_opened.load(Ordering::Relaxed),
            files_closed: self.files_closed.load(Ordering::Relaxed),
            close_errors: self.close_errors.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            idle_closes: self.idle_closes.load(Ordering::Relaxed),
            rows_written: self.rows_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

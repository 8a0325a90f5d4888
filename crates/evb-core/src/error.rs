use std::io;
use std::path::PathBuf;

use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

use crate::event::DecodeError;

// ---------------------------------------------------------------------------
// BatchError: per-operation failures of the rotating writer
// ---------------------------------------------------------------------------

/// Failures surfaced by [`RotatingBatchWriter`](crate::batch::RotatingBatchWriter).
///
/// Nothing in the writer retries; every variant reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The deterministic file name for a new window is already taken.
    #[error("file already exists: {}", path.display())]
    FileConflict { path: PathBuf },
    #[error("failed to create new file: {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Encoding or appending a row failed. The session stays open.
    #[error("error writing event data to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Closing the previous window failed; the triggering event was not written.
    #[error("failed to rotate {}: {source}", path.display())]
    Rotation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to close {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("batch interval must be > 0 and fit in a signed duration")]
    InvalidInterval,
}

impl BatchError {
    /// Close-path failures leave a window that could not be flushed. A
    /// background caller with nobody to answer must escalate these.
    pub fn is_fatal_for_background(&self) -> bool {
        matches!(self, Self::Close { .. } | Self::Rotation { .. })
    }

    /// Coded reason for aggregating this failure into a [`CoreError`].
    pub fn core_reason(&self) -> CoreReason {
        match self {
            Self::Decode(_) => CoreReason::DataFormat,
            _ => CoreReason::Writer,
        }
    }
}

// ---------------------------------------------------------------------------
// CoreReason: coded reasons for callers that aggregate errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum CoreReason {
    #[error("batch writer error")]
    Writer,
    #[error("data format error")]
    DataFormat,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for CoreReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Writer => 1001,
            Self::DataFormat => 1002,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<CoreReason>;
pub type CoreResult<T> = Result<T, CoreError>;

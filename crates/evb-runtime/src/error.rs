use derive_more::From;
use evb_core::error::CoreReason;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum RuntimeReason {
    #[error("bootstrap error")]
    Bootstrap,
    #[error("shutdown error")]
    Shutdown,
    #[error("background task fault")]
    Fault,
    #[error("{0}")]
    Core(CoreReason),
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for RuntimeReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::Bootstrap => 2001,
            Self::Shutdown => 2002,
            Self::Fault => 2003,
            Self::Core(c) => c.error_code(),
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type RuntimeError = StructError<RuntimeReason>;
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A failure reported by a background task while the runtime keeps serving.
///
/// `fatal` faults end [`Reactor::wait_for_trigger`](crate::lifecycle::Reactor::wait_for_trigger)
/// and make [`Reactor::wait`](crate::lifecycle::Reactor::wait) return a
/// [`RuntimeReason::Fault`] error. Other faults are logged and serving goes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFault {
    pub task: &'static str,
    pub fatal: bool,
    pub message: String,
}

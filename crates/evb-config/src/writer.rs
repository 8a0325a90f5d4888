use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CloseErrorPolicy, HumanDuration};

// ---------------------------------------------------------------------------
// WriterConfig: deserialized from [writer]
// ---------------------------------------------------------------------------

/// Batch-file writer settings. Every field has a default, so the whole
/// `[writer]` section may be omitted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Directory that receives batch files. Must already exist. Relative
    /// paths are resolved against the config file's parent directory.
    pub output_dir: PathBuf,
    /// File name prefix, e.g. `user-events` → `user-events-20240701-020304.csv`.
    pub file_prefix: String,
    /// Width of a batch window in event time.
    pub batch_interval: HumanDuration,
    /// Wall-clock age after which an open batch file is force-closed.
    /// `0s` disables the idle closer.
    pub auto_close_after: HumanDuration,
    /// How often the idle closer checks. Falls back to `auto_close_after`.
    pub auto_close_check_interval: Option<HumanDuration>,
    /// Reaction of the idle closer to a failed close.
    pub on_close_error: CloseErrorPolicy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            file_prefix: "user-events".to_string(),
            batch_interval: Duration::from_secs(5 * 60).into(),
            auto_close_after: Duration::from_secs(15).into(),
            auto_close_check_interval: Some(Duration::from_secs(1).into()),
            on_close_error: CloseErrorPolicy::Shutdown,
        }
    }
}

impl WriterConfig {
    /// Idle threshold, or `None` when idle closing is disabled.
    pub fn idle_close_after(&self) -> Option<Duration> {
        if self.auto_close_after.is_zero() {
            None
        } else {
            Some(self.auto_close_after.as_duration())
        }
    }

    /// Effective tick period of the idle closer.
    pub fn idle_check_interval(&self) -> Duration {
        self.auto_close_check_interval
            .unwrap_or(self.auto_close_after)
            .as_duration()
    }
}

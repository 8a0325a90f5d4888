use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// `[logging]` section. Every field has a default.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for every target, e.g. `"info"`.
    pub level: String,
    /// Per-target levels, e.g. `"evb_runtime::receiver" = "debug"`.
    pub modules: BTreeMap<String, String>,
    /// Extra log file next to stderr. Relative to the config directory.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: BTreeMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives: the base level followed by `target=level`
    /// overrides in target order.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (target, level) in &self.modules {
            directives.push_str(&format!(",{target}={level}"));
        }
        directives
    }

    /// Log file path with a relative `file` joined onto `base_dir`.
    pub fn file_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.file.as_ref().map(|file| {
            if file.is_relative() {
                base_dir.join(file)
            } else {
                file.clone()
            }
        })
    }
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp LEVEL [domain] spans: message fields`
    Plain,
    /// One JSON object per line, `domain` kept as a field.
    Json,
}

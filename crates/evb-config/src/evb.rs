use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::logging::LoggingConfig;
use crate::server::ServerConfig;
use crate::validate;
use crate::writer::WriterConfig;

// ---------------------------------------------------------------------------
// Raw TOML structure (intermediate representation)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EvbConfigRaw {
    server: ServerConfig,
    writer: WriterConfig,
    logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// EvbConfig (resolved, validated)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct EvbConfig {
    pub server: ServerConfig,
    pub writer: WriterConfig,
    pub logging: LoggingConfig,
}

impl Default for EvbConfig {
    fn default() -> Self {
        let raw = EvbConfigRaw::default();
        Self {
            server: raw.server,
            writer: raw.writer,
            logging: raw.logging,
        }
    }
}

impl EvbConfig {
    /// Read and parse an `evbatch.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }

    /// Re-run validation, e.g. after command-line overrides were applied.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate::validate(self)
    }
}

impl FromStr for EvbConfig {
    type Err = anyhow::Error;

    /// Parse a TOML string into a resolved, validated [`EvbConfig`].
    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let raw: EvbConfigRaw = toml::from_str(toml_str)?;

        let config = EvbConfig {
            server: raw.server,
            writer: raw.writer,
            logging: raw.logging,
        };

        validate::validate(&config)?;

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use crate::types::{CloseErrorPolicy, HumanDuration};
    use std::path::PathBuf;
    use std::time::Duration;

    const FULL_TOML: &str = r#"
[server]
listen = "tcp://127.0.0.1:9800"
path = "/v1/events"
max_body_bytes = "4MB"

[writer]
output_dir = "/var/lib/evbatch"
file_prefix = "clicks"
batch_interval = "10m"
auto_close_after = "30s"
auto_close_check_interval = "2s"
on_close_error = "continue"

[logging]
level = "debug"
format = "json"
file = "logs/evbatch.log"

[logging.modules]
evb_runtime = "trace"
"#;

    #[test]
    fn load_full_toml() {
        let cfg: EvbConfig = FULL_TOML.parse().unwrap();

        // server
        assert_eq!(cfg.server.listen, "tcp://127.0.0.1:9800");
        assert_eq!(cfg.server.path, "/v1/events");
        assert_eq!(cfg.server.max_body_bytes.as_bytes(), 4 * 1024 * 1024);

        // writer
        assert_eq!(cfg.writer.output_dir, PathBuf::from("/var/lib/evbatch"));
        assert_eq!(cfg.writer.file_prefix, "clicks");
        assert_eq!(
            cfg.writer.batch_interval.as_duration(),
            Duration::from_secs(600),
        );
        assert_eq!(
            cfg.writer.idle_close_after(),
            Some(Duration::from_secs(30)),
        );
        assert_eq!(cfg.writer.idle_check_interval(), Duration::from_secs(2));
        assert_eq!(cfg.writer.on_close_error, CloseErrorPolicy::Continue);

        // logging
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.logging.modules["evb_runtime"], "trace");
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: EvbConfig = "".parse().unwrap();
        assert_eq!(cfg.server.listen, "tcp://localhost:8080");
        assert_eq!(cfg.server.path, "/user/event");
        assert_eq!(cfg.writer.output_dir, PathBuf::from("./data"));
        assert_eq!(cfg.writer.file_prefix, "user-events");
        assert_eq!(
            cfg.writer.batch_interval,
            "5m".parse::<HumanDuration>().unwrap(),
        );
        assert_eq!(
            cfg.writer.idle_close_after(),
            Some(Duration::from_secs(15)),
        );
        assert_eq!(cfg.writer.idle_check_interval(), Duration::from_secs(1));
        assert_eq!(cfg.writer.on_close_error, CloseErrorPolicy::Shutdown);
        assert_eq!(cfg.logging.format, LogFormat::Plain);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: EvbConfig = "[writer]\nbatch_interval = \"1h\"\n".parse().unwrap();
        assert_eq!(
            cfg.writer.batch_interval.as_duration(),
            Duration::from_secs(3600),
        );
        assert_eq!(cfg.writer.file_prefix, "user-events");
    }

    #[test]
    fn zero_auto_close_disables_idle_closer() {
        let toml = FULL_TOML.replace("auto_close_after = \"30s\"", "auto_close_after = \"0s\"");
        let cfg: EvbConfig = toml.parse().unwrap();
        assert_eq!(cfg.writer.idle_close_after(), None);
    }

    #[test]
    fn reject_invalid_listen() {
        let toml = FULL_TOML.replace("tcp://127.0.0.1:9800", "http://bad");
        assert!(toml.parse::<EvbConfig>().is_err());
    }

    #[test]
    fn reject_zero_batch_interval() {
        let toml = FULL_TOML.replace("batch_interval = \"10m\"", "batch_interval = \"0s\"");
        let err = toml.parse::<EvbConfig>().unwrap_err();
        assert!(
            err.to_string().contains("batch_interval"),
            "error should name the field: {err}",
        );
    }

    #[test]
    fn reject_bad_duration_string() {
        let toml = FULL_TOML.replace("batch_interval = \"10m\"", "batch_interval = \"ten\"");
        assert!(toml.parse::<EvbConfig>().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evbatch.toml");
        std::fs::write(&path, FULL_TOML).unwrap();
        let cfg = EvbConfig::load(&path).unwrap();
        assert_eq!(cfg.writer.file_prefix, "clicks");
    }

    #[test]
    fn load_missing_file_names_path() {
        let err = EvbConfig::load("/nonexistent/evbatch.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/evbatch.toml"));
    }
}

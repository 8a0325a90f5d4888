use crate::evb::EvbConfig;

/// Internal validation, called automatically during `EvbConfig::from_str` / `load`.
pub(crate) fn validate(config: &EvbConfig) -> anyhow::Result<()> {
    // server.listen must start with tcp://
    if !config.server.listen.starts_with("tcp://") {
        anyhow::bail!(
            "server.listen must start with \"tcp://\", got {:?}",
            config.server.listen,
        );
    }

    if !config.server.path.starts_with('/') {
        anyhow::bail!(
            "server.path must start with \"/\", got {:?}",
            config.server.path,
        );
    }

    if config.server.max_body_bytes.as_bytes() == 0 {
        anyhow::bail!("server.max_body_bytes must be > 0");
    }

    if config.writer.batch_interval.is_zero() {
        anyhow::bail!("writer.batch_interval must be > 0");
    }

    if !is_valid_file_prefix(&config.writer.file_prefix) {
        anyhow::bail!(
            "writer.file_prefix {:?} must be non-empty and contain no path separators",
            config.writer.file_prefix,
        );
    }

    // The check interval only matters when idle closing is on.
    if config.writer.idle_close_after().is_some()
        && config.writer.idle_check_interval().is_zero()
    {
        anyhow::bail!("writer.auto_close_check_interval must be > 0");
    }

    Ok(())
}

fn is_valid_file_prefix(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix != "."
        && prefix != ".."
        && !prefix.contains(['/', '\\', '\0'])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

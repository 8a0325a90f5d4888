use std::path::{Path, PathBuf};
use std::sync::Arc;

use orion_error::compat_prelude::*;
use orion_error::prelude::*;

use evb_config::WriterConfig;
use evb_core::batch::WriterOptions;
use evb_core::error::CoreReason;

use crate::EventWriter;
use crate::error::{RuntimeReason, RuntimeResult};

// ---------------------------------------------------------------------------
// Phase 1: output directory check + writer construction
// ---------------------------------------------------------------------------

/// Resolve `writer.output_dir` against `base_dir` when it is relative.
pub(super) fn resolve_output_dir(config: &WriterConfig, base_dir: &Path) -> PathBuf {
    if config.output_dir.is_relative() {
        base_dir.join(&config.output_dir)
    } else {
        config.output_dir.clone()
    }
}

/// The output directory must already exist and be a directory. It is never
/// created on the operator's behalf.
pub(super) fn check_output_dir(dir: &Path) -> RuntimeResult<()> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StructError::from(RuntimeReason::Bootstrap)
            .with_detail(format!("output path {} is not a directory", dir.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StructError::from(RuntimeReason::Bootstrap)
                .with_detail(format!("output directory {} does not exist", dir.display())))
        }
        Err(e) => Err(StructError::from(RuntimeReason::Bootstrap).with_detail(format!(
            "error checking output directory {}: {e}",
            dir.display()
        ))),
    }
}

/// Check the output directory and build the shared writer. All writer log
/// events are emitted inside a `batch_writer` span carrying the directory.
pub(super) fn build_writer(config: &WriterConfig, base_dir: &Path) -> RuntimeResult<Arc<EventWriter>> {
    let output_dir = resolve_output_dir(config, base_dir);
    check_output_dir(&output_dir)?;

    let span = tracing::info_span!("batch_writer", dir = %output_dir.display());
    let writer = EventWriter::new(WriterOptions {
        output_dir,
        file_prefix: config.file_prefix.clone(),
        batch_interval: config.batch_interval.as_duration(),
    })
    .owe(RuntimeReason::Core(CoreReason::Writer))?
    .with_span(span);
    Ok(Arc::new(writer))
}

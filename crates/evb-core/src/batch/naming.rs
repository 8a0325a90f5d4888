use chrono::{DateTime, Utc};

/// Extension of every batch file.
pub const FILE_EXTENSION: &str = "csv";

/// Deterministic file name of the batch anchored at `anchor`.
///
/// Second precision: two windows anchored within the same second map to the
/// same name, which the writer reports as a conflict instead of overwriting.
pub fn batch_file_name(prefix: &str, anchor: DateTime<Utc>) -> String {
    format!(
        "{prefix}-{}.{FILE_EXTENSION}",
        anchor.format("%Y%m%d-%H%M%S")
    )
}

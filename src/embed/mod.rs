//! Resource encoder: generates the Rust sources that embed binary files.
//!
//! The generator itself lives in [`codegen`] so `build.rs` can compile the
//! same file; this module adds logging and the crate-wide error type.
//! Warnings are returned to the caller, not logged.

mod codegen;

use std::path::Path;

pub use codegen::{
    render_declarations, sanitize_identifier, write_octal_bytes, EmbedEntry, EmbedPlan,
    EncodeError, EncodeReport, Encoder, BYTES_PER_LINE, DECLARATIONS_FILE, DEFAULT_MODULE_PATH,
    DEFINITIONS_FILE,
};

use crate::error::Result;

/// Encodes `inputs` into `out_dir`. Duplicate and renamed entries are left
/// in [`EncodeReport::warnings`] for the caller to report.
pub fn encode<P: AsRef<Path>>(
    encoder: &Encoder,
    inputs: &[P],
    out_dir: &Path,
) -> Result<EncodeReport> {
    let report = encoder.encode(inputs, out_dir)?;
    log::info!(
        "embedded {} file(s), {} bytes, into {}",
        report.plan.entries.len(),
        report.total_bytes,
        out_dir.display()
    );
    Ok(report)
}

//! Output verification and relocation.
//!
//! This is the single place that decides whether a conversion succeeded.
//! `dwg2dxf` is known to exit non-zero after writing a usable file and to
//! exit zero after writing nothing, so its exit status is ignored: the job
//! succeeded if and only if a non-empty output file exists afterwards.

use std::io::ErrorKind;
use std::path::Path;

use dr_core::FormatPair;

/// Move the converter's output into place and check it.
///
/// 1. The tool writes `<input stem>.<dest_ext>` next to the input; if that
///    file exists it is renamed to `expected_output`.
/// 2. `expected_output` must then exist and be larger than zero bytes.
///
/// Returns the output size in bytes.
///
/// # Errors
///
/// [`dr_core::Error::ConversionFailed`] when the output is missing or empty.
pub async fn verify_output(
    format: &FormatPair,
    input: &Path,
    expected_output: &Path,
) -> dr_core::Result<u64> {
    let tool_output = format.tool_output_path(input);

    if tool_output != expected_output && tokio::fs::metadata(&tool_output).await.is_ok() {
        if let Err(e) = tokio::fs::rename(&tool_output, expected_output).await {
            tracing::warn!(
                "Failed to move {} to {}: {e}",
                tool_output.display(),
                expected_output.display()
            );
        }
    }

    match tokio::fs::metadata(expected_output).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {
            tracing::info!(
                "Created output file {} ({} bytes)",
                expected_output.display(),
                meta.len()
            );
            Ok(meta.len())
        }
        Ok(meta) if !meta.is_file() => {
            tracing::error!("Output {} is not a regular file", expected_output.display());
            Err(dr_core::Error::ConversionFailed("output is not a regular file".into()))
        }
        Ok(_) => {
            tracing::error!("Output file {} is empty", expected_output.display());
            Err(dr_core::Error::ConversionFailed("output file is empty".into()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::error!("Converter produced no output file");
            Err(dr_core::Error::ConversionFailed("no output file produced".into()))
        }
        Err(e) => {
            tracing::error!("Cannot inspect output {}: {e}", expected_output.display());
            Err(dr_core::Error::ConversionFailed(format!("cannot inspect output: {e}")))
        }
    }
}

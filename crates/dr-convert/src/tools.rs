//! External tool detection.
//!
//! Resolves the converter executable from configuration or `PATH` and reports
//! its availability for startup logs, the `check-tools` command, and the
//! `/api/tools` endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// Executable name of the LibreDWG converter.
pub const CONVERTER_TOOL: &str = "dwg2dxf";

/// Upper bound on `dwg2dxf --version`.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Availability information for a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `--version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Resolve the converter executable.
///
/// A configured path that exists wins; otherwise `PATH` is searched with
/// [`which::which`]. Returns `None` when neither finds it.
pub fn resolve_converter(config: &dr_core::config::ConverterConfig) -> Option<PathBuf> {
    if let Some(ref p) = config.path {
        if p.exists() {
            return Some(p.clone());
        }
        tracing::debug!("Configured converter {} missing; searching PATH", p.display());
    }
    which::which(CONVERTER_TOOL).ok()
}

/// Path to hand to the process runner. Falls back to the bare tool name so a
/// missing binary surfaces as a launch error at job time rather than at
/// startup.
pub fn converter_program(config: &dr_core::config::ConverterConfig) -> PathBuf {
    resolve_converter(config)
        .or_else(|| config.path.clone())
        .unwrap_or_else(|| PathBuf::from(CONVERTER_TOOL))
}

impl ToolInfo {
    /// Info for a tool that could not be located.
    pub fn not_found(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        }
    }
}

/// Check the converter and return its availability information.
///
/// The version check is bounded by [`VERSION_TIMEOUT`].
pub async fn check_converter(config: &dr_core::config::ConverterConfig) -> ToolInfo {
    check_converter_within(config, VERSION_TIMEOUT).await
}

/// Like [`check_converter`] with an explicit bound on the version check.
pub async fn check_converter_within(
    config: &dr_core::config::ConverterConfig,
    timeout: Duration,
) -> ToolInfo {
    match resolve_converter(config) {
        Some(path) => ToolInfo {
            name: CONVERTER_TOOL.to_string(),
            available: true,
            version: detect_version(&path, timeout).await,
            path: Some(path),
        },
        None => ToolInfo::not_found(CONVERTER_TOOL),
    }
}

/// Run `<tool> --version` and return the first non-empty line of output.
/// A tool that hangs is killed once `timeout` passes.
async fn detect_version(path: &Path, timeout: Duration) -> Option<String> {
    let output = match ToolCommand::new(path.to_path_buf())
        .arg("--version")
        .timeout(timeout)
        .execute()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Version check of {} failed: {e}", path.display());
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    // LibreDWG prints its version banner on stdout, some builds on stderr.
    let text = if output.stdout.trim().is_empty() {
        output.stderr
    } else {
        output.stdout
    };

    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

//! The external converter seam.
//!
//! The job pipeline only knows the [`Converter`] trait: "given an input path,
//! run the conversion and tell me what happened". [`Dwg2DxfConverter`] is the
//! production implementation that shells out to LibreDWG's `dwg2dxf`; tests
//! plug in fakes that write (or deliberately fail to write) output files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::command::ToolCommand;
use crate::tools;

/// Fixed flags passed before the input path: verbose output, R2000 target
/// version, binary DXF.
pub const DWG2DXF_ARGS: &[&str] = &["-v", "--as", "r2000", "-b"];

/// What a converter run reported, independent of whether it produced a file.
#[derive(Debug, Clone, Default)]
pub struct ConverterRun {
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Full captured standard output.
    pub stdout: String,
    /// Full captured standard error.
    pub stderr: String,
}

impl ConverterRun {
    /// Log captured output for diagnosis. Never sent to clients.
    pub fn log(&self, tool: &str) {
        tracing::info!(tool, exit_code = ?self.exit_code, "Converter finished");
        if !self.stdout.trim().is_empty() {
            tracing::info!(tool, "Converter stdout: {}", self.stdout.trim_end());
        }
        if !self.stderr.trim().is_empty() {
            tracing::error!(tool, "Converter stderr: {}", self.stderr.trim_end());
        }
    }
}

/// Runs a conversion for a staged input file.
///
/// Implementations write their result next to `input` (same stem, destination
/// extension) or directly to the workspace output path. The returned
/// [`ConverterRun`] is informational only: success is decided by the output
/// verifier, never by the exit code.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Convert the file at `input`.
    ///
    /// # Errors
    ///
    /// Only for failures to run at all: launch errors and timeouts.
    async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun>;
}

/// LibreDWG `dwg2dxf` invoked as a child process.
#[derive(Debug, Clone)]
pub struct Dwg2DxfConverter {
    program: PathBuf,
    timeout: Duration,
}

impl Dwg2DxfConverter {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Build from configuration, resolving the executable via
    /// [`tools::converter_program`].
    pub fn from_config(config: &dr_core::config::ConverterConfig) -> Self {
        Self::new(tools::converter_program(config), config.timeout())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, input: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(DWG2DXF_ARGS.iter().copied())
            .arg(input.to_string_lossy())
            .timeout(self.timeout);
        cmd
    }
}

#[async_trait]
impl Converter for Dwg2DxfConverter {
    fn name(&self) -> &str {
        tools::CONVERTER_TOOL
    }

    async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun> {
        tracing::info!("Converting {} with {}", input.display(), self.program.display());

        let output = self.command(input).execute().await?;

        Ok(ConverterRun {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_timeout() {
        let cfg = dr_core::config::ConverterConfig {
            path: None,
            timeout_secs: 7,
        };
        let conv = Dwg2DxfConverter::from_config(&cfg);
        assert_eq!(conv.timeout, Duration::from_secs(7));
        assert_eq!(conv.name(), "dwg2dxf");
    }

    #[tokio::test]
    async fn missing_binary_is_launch_error() {
        let conv = Dwg2DxfConverter::new(
            PathBuf::from("/nonexistent/bin/dwg2dxf"),
            Duration::from_secs(5),
        );
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.dwg");
        std::fs::write(&input, b"dwg").unwrap();

        let err = conv.convert(&input).await.unwrap_err();
        assert!(matches!(err, dr_core::Error::ProcessLaunch { .. }), "got {err}");
    }

    #[test]
    fn run_log_does_not_panic_on_empty_output() {
        ConverterRun::default().log("dwg2dxf");
    }
}

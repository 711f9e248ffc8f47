//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Default command timeout: 2 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// Unlike a plain [`Command::output`], a non-zero exit status is *not* an
/// error here: the status is returned in [`ToolOutput`] and the caller
/// decides what it means. Only a failure to start the process, or running
/// past the timeout, is reported as an error.
///
/// # Example
///
/// ```no_run
/// use dr_convert::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> dr_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("dwg2dxf"))
///     .arg("-v")
///     .arg("/tmp/drawing.dwg")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Short program name used in logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr in full.
    ///
    /// # Errors
    ///
    /// - [`dr_core::Error::ProcessLaunch`] if the process cannot be spawned.
    /// - [`dr_core::Error::Timeout`] if it runs past the timeout. The child
    ///   is killed when its handle is dropped.
    /// - [`dr_core::Error::Io`] if waiting on the process fails.
    pub async fn execute(&self) -> dr_core::Result<ToolOutput> {
        let program_name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            dr_core::Error::launch(program_name.clone(), format!("failed to spawn: {e}"))
        })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ToolOutput {
                status: output.status,
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }),
            Ok(Err(e)) => Err(dr_core::Error::Io { source: e }),
            Err(_elapsed) => {
                // The wait future owned the child; dropping it on timeout
                // triggers kill_on_drop.
                tracing::warn!("{program_name} timed out after {:?}; killed", self.timeout);
                Err(dr_core::Error::Timeout {
                    tool: program_name,
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        match output {
            Ok(out) => {
                assert!(out.status.success());
                assert!(out.stdout.trim().contains("hello"));
            }
            Err(_) => {
                // On some minimal environments echo may not exist; skip.
            }
        }
    }

    #[tokio::test]
    async fn nonexistent_tool_is_launch_error() {
        let result = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await;
        assert!(matches!(result, Err(dr_core::Error::ProcessLaunch { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_not_an_error() {
        let output = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo oops >&2; exit 3"])
            .execute()
            .await
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_fires() {
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, dr_core::Error::Timeout { .. }), "unexpected error: {err}");
    }

    #[test]
    fn program_name_uses_file_name() {
        let cmd = ToolCommand::new(PathBuf::from("/usr/local/bin/dwg2dxf"));
        assert_eq!(cmd.program_name(), "dwg2dxf");
    }
}

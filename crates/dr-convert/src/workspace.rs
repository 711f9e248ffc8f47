//! Per-job workspace management.
//!
//! A [`ConversionWorkspace`] owns a freshly created, uniquely named temporary
//! directory holding one job's input and output files. The directory is
//! removed exactly once: either through an explicit [`cleanup`] call or, on
//! any early return, when the workspace is dropped.
//!
//! Jobs use [`create_async`] and [`cleanup_async`], which run the filesystem
//! work on tokio's blocking pool. Removal through `Drop` (a cancelled job)
//! stays synchronous.
//!
//! [`create_async`]: ConversionWorkspace::create_async
//! [`cleanup_async`]: ConversionWorkspace::cleanup_async
//! [`cleanup`]: ConversionWorkspace::cleanup

use std::path::{Path, PathBuf};

use dr_core::FormatPair;
use tempfile::TempDir;

/// Prefix for workspace directory names.
pub const WORKSPACE_PREFIX: &str = "dwg2dxf_";

/// Isolated working directory for a single conversion job.
///
/// # Example
///
/// ```no_run
/// use dr_convert::ConversionWorkspace;
///
/// let ws = ConversionWorkspace::create(None, &dr_core::DWG_TO_DXF).unwrap();
/// std::fs::write(ws.input_path(), b"...").unwrap();
/// // ... run the converter, read ws.output_path() ...
/// ws.cleanup();
/// ```
#[derive(Debug)]
pub struct ConversionWorkspace {
    temp_dir: Option<TempDir>,
    dir: PathBuf,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ConversionWorkspace {
    /// Create a new workspace under `root` (or the OS temp dir).
    ///
    /// # Errors
    ///
    /// Returns [`dr_core::Error::Workspace`] if the directory cannot be created.
    pub fn create(root: Option<&Path>, format: &FormatPair) -> dr_core::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let temp_dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| dr_core::Error::Workspace(format!("failed to create temp dir: {e}")))?;

        let dir = temp_dir.path().to_path_buf();
        let input_path = dir.join(format.input_file_name());
        let output_path = dir.join(format.output_file_name());

        tracing::debug!("Created workspace {}", dir.display());

        Ok(Self {
            temp_dir: Some(temp_dir),
            dir,
            input_path,
            output_path,
        })
    }

    /// [`create`](Self::create) on the blocking thread pool.
    pub async fn create_async(root: Option<PathBuf>, format: FormatPair) -> dr_core::Result<Self> {
        tokio::task::spawn_blocking(move || Self::create(root.as_deref(), &format))
            .await
            .map_err(|e| dr_core::Error::Workspace(format!("workspace task failed: {e}")))?
    }

    /// Path to the workspace directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the uploaded bytes are staged.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Where the verified converter output must end up.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Remove the workspace directory and everything in it.
    ///
    /// A failure is logged and swallowed: cleanup never changes the outcome
    /// of the job that owned the workspace.
    pub fn cleanup(mut self) {
        self.remove();
    }

    /// [`cleanup`](Self::cleanup) on the blocking thread pool.
    pub async fn cleanup_async(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.cleanup()).await {
            tracing::error!("Workspace cleanup task failed: {e}");
        }
    }

    fn remove(&mut self) {
        let Some(temp_dir) = self.temp_dir.take() else {
            return;
        };
        match temp_dir.close() {
            Ok(()) => tracing::debug!("Removed workspace {}", self.dir.display()),
            Err(e) => tracing::error!("Failed to remove workspace {}: {e}", self.dir.display()),
        }
    }
}

impl Drop for ConversionWorkspace {
    fn drop(&mut self) {
        self.remove();
    }
}

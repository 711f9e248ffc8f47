//! Managed conversion jobs.
//!
//! A job is one end-to-end handling of an upload:
//!
//! ```text
//! Validated -> Staged -> Invoked -> Verified -> Succeeded | Failed
//! ```
//!
//! Validation happens before anything is allocated. Everything after that
//! runs inside a [`ConversionWorkspace`], which is removed exactly once when
//! the job ends, whichever way it ends (including the request future being
//! dropped mid-flight).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use dr_core::{Error, FormatPair, DWG_TO_DXF};
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::converter::{Converter, Dwg2DxfConverter};
use crate::verify::verify_output;
use crate::workspace::ConversionWorkspace;

/// An uploaded file waiting to be converted.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Name the client declared for the upload.
    pub filename: String,
    /// Raw uploaded bytes.
    pub input: Bytes,
}

impl ConversionRequest {
    pub fn new(filename: impl Into<String>, input: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            input: input.into(),
        }
    }
}

/// A successfully converted file, fully read into memory.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    /// Suggested download name.
    pub filename: String,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    pub bytes: Bytes,
}

/// Observable progress of a job, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Validated,
    Staged,
    Invoked,
    Verified,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Validated => "validated",
            JobStage::Staged => "staged",
            JobStage::Invoked => "invoked",
            JobStage::Verified => "verified",
        }
    }
}

/// Reject a request whose filename does not carry the source extension.
///
/// Runs before any I/O; has no side effects.
pub fn validate(format: &FormatPair, request: &ConversionRequest) -> dr_core::Result<()> {
    if request.filename.trim().is_empty() {
        return Err(Error::BadInput("No file name was provided".into()));
    }
    if !format.accepts(&request.filename) {
        return Err(Error::BadInput(format!(
            "Only .{} files can be uploaded",
            format.source_ext
        )));
    }
    Ok(())
}

/// Runs conversion jobs against a [`Converter`] with bounded concurrency.
///
/// Cheap to share behind an `Arc`; holds no per-job state.
pub struct JobRunner {
    converter: Arc<dyn Converter>,
    format: FormatPair,
    temp_root: Option<PathBuf>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl JobRunner {
    /// Create a runner allowing at most `max_concurrent` jobs at once.
    pub fn new(
        converter: Arc<dyn Converter>,
        temp_root: Option<PathBuf>,
        max_concurrent: usize,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            converter,
            format: DWG_TO_DXF,
            temp_root,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Build a runner that invokes the real `dwg2dxf`.
    pub fn from_config(config: &dr_core::config::Config) -> Self {
        let converter = Arc::new(Dwg2DxfConverter::from_config(&config.converter));
        Self::new(
            converter,
            config.jobs.temp_root.clone(),
            config.jobs.max_concurrent,
        )
    }

    pub fn format(&self) -> &FormatPair {
        &self.format
    }

    pub fn converter_name(&self) -> &str {
        self.converter.name()
    }

    /// Number of jobs currently holding a slot.
    pub fn active_jobs(&self) -> usize {
        self.max_concurrent - self.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run one job to completion.
    ///
    /// # Errors
    ///
    /// - [`Error::BadInput`] before any resource is touched.
    /// - [`Error::Busy`] when every slot is taken.
    /// - Any staging, launch, timeout, or verification failure. The workspace
    ///   has been removed by the time the error is returned.
    pub async fn run(&self, request: ConversionRequest) -> dr_core::Result<ConvertedFile> {
        validate(&self.format, &request)?;

        let _permit = self.permits.clone().try_acquire_owned().map_err(|_| {
            tracing::warn!("Rejecting job: all {} slots busy", self.max_concurrent);
            Error::Busy("The server is busy converting other files; try again shortly".into())
        })?;

        let workspace =
            ConversionWorkspace::create_async(self.temp_root.clone(), self.format).await?;
        let workspace_name = workspace
            .dir()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let span = tracing::info_span!("job", workspace = %workspace_name);

        let result = self
            .execute(&workspace, &request)
            .instrument(span.clone())
            .await;

        span.in_scope(|| match &result {
            Ok(file) => tracing::info!(bytes = file.bytes.len(), "Job succeeded"),
            Err(e) => tracing::error!("Job failed: {e}"),
        });

        workspace.cleanup_async().await;
        result
    }

    async fn execute(
        &self,
        workspace: &ConversionWorkspace,
        request: &ConversionRequest,
    ) -> dr_core::Result<ConvertedFile> {
        stage(JobStage::Validated);

        write_input(workspace.input_path(), &request.input).await?;
        tracing::info!(
            "Saved input file {} ({} bytes)",
            workspace.input_path().display(),
            request.input.len()
        );
        stage(JobStage::Staged);

        let run = self.converter.convert(workspace.input_path()).await?;
        run.log(self.converter.name());
        stage(JobStage::Invoked);

        verify_output(&self.format, workspace.input_path(), workspace.output_path()).await?;
        stage(JobStage::Verified);

        let bytes = tokio::fs::read(workspace.output_path()).await?;

        Ok(ConvertedFile {
            filename: self.format.output_filename(&request.filename),
            content_type: self.format.content_type,
            bytes: Bytes::from(bytes),
        })
    }
}

async fn write_input(path: &Path, input: &Bytes) -> dr_core::Result<()> {
    tokio::fs::write(path, input.as_ref())
        .await
        .map_err(Error::io_write)
}

fn stage(stage: JobStage) {
    tracing::debug!(stage = stage.as_str(), "Job stage");
}

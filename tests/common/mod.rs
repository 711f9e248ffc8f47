//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] around a fake
//! converter and a private workspace root, plus the fake converters used
//! across the test files. [`TestHarness::with_server`] starts Axum on a
//! random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use dr_convert::{Converter, ConverterRun, JobRunner, ToolInfo};
use dr_core::config::Config;
use dr_server::context::AppContext;
use dr_server::router::build_router;

// ---------------------------------------------------------------------------
// Fake converters
// ---------------------------------------------------------------------------

/// Copies the input to `<stem>.dxf`, like `dwg2dxf` would, after an optional
/// delay. Reports a non-zero exit code to prove it is ignored.
pub struct CopyConverter {
    pub delay: Duration,
}

impl CopyConverter {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Converter for CopyConverter {
    fn name(&self) -> &str {
        "copy"
    }

    async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        tokio::fs::copy(input, input.with_extension("dxf")).await?;
        Ok(ConverterRun {
            exit_code: Some(1),
            stdout: "wrote output".into(),
            stderr: String::new(),
        })
    }
}

/// Exits "successfully" without writing anything.
pub struct NoOutputConverter;

#[async_trait]
impl Converter for NoOutputConverter {
    fn name(&self) -> &str {
        "no-output"
    }

    async fn convert(&self, _input: &Path) -> dr_core::Result<ConverterRun> {
        Ok(ConverterRun {
            exit_code: Some(0),
            ..ConverterRun::default()
        })
    }
}

/// Writes a zero-byte output file.
pub struct EmptyOutputConverter;

#[async_trait]
impl Converter for EmptyOutputConverter {
    fn name(&self) -> &str {
        "empty-output"
    }

    async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun> {
        tokio::fs::write(input.with_extension("dxf"), b"").await?;
        Ok(ConverterRun::default())
    }
}

/// Signals `started` when a conversion begins, then waits for `release`
/// before copying the input.
pub struct GatedConverter {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl GatedConverter {
    pub fn new() -> Self {
        Self {
            started: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Converter for GatedConverter {
    fn name(&self) -> &str {
        "gated"
    }

    async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun> {
        self.started.notify_one();
        self.release.notified().await;
        tokio::fs::copy(input, input.with_extension("dxf")).await?;
        Ok(ConverterRun::default())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Test harness wrapping a fully-constructed [`AppContext`] whose workspaces
/// live under a private temporary root.
pub struct TestHarness {
    pub ctx: AppContext,
    pub runner: Arc<JobRunner>,
    pub temp_root: TempDir,
}

impl TestHarness {
    /// Create a harness around `converter` with default configuration.
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        Self::with_config(converter, Config::default())
    }

    /// Create a harness around `converter` with a custom configuration. The
    /// workspace root always points at the harness's own temp dir.
    pub fn with_config(converter: Arc<dyn Converter>, mut config: Config) -> Self {
        let temp_root = tempfile::tempdir().expect("failed to create temp root");
        config.jobs.temp_root = Some(temp_root.path().to_path_buf());

        let runner = Arc::new(JobRunner::new(
            converter,
            config.jobs.temp_root.clone(),
            config.jobs.max_concurrent,
        ));
        let tool = ToolInfo::not_found(dr_convert::tools::CONVERTER_TOOL);
        let ctx = AppContext::new(config, runner.clone(), tool);

        Self {
            ctx,
            runner,
            temp_root,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(converter: Arc<dyn Converter>) -> (Self, SocketAddr) {
        Self::with_server_config(converter, Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(
        converter: Arc<dyn Converter>,
        config: Config,
    ) -> (Self, SocketAddr) {
        let harness = Self::with_config(converter, config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn root(&self) -> PathBuf {
        self.temp_root.path().to_path_buf()
    }

    /// Number of entries (workspaces) currently under the temp root.
    pub fn workspace_count(&self) -> usize {
        std::fs::read_dir(self.temp_root.path())
            .expect("failed to read temp root")
            .count()
    }
}

/// POST `data` as the `file` field of a multipart upload.
pub async fn upload(addr: SocketAddr, filename: &str, data: Vec<u8>) -> reqwest::Response {
    upload_field(addr, "file", filename, data).await
}

/// POST `data` as a multipart upload under an arbitrary field name.
pub async fn upload_field(
    addr: SocketAddr,
    field: &str,
    filename: &str,
    data: Vec<u8>,
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
    let form = reqwest::multipart::Form::new().part(field.to_string(), part);

    reqwest::Client::new()
        .post(format!("http://{addr}/api/dwg2dxf"))
        .multipart(form)
        .send()
        .await
        .expect("upload request failed")
}

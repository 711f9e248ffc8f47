//! # dr-convert
//!
//! Managed conversion jobs around an external converter process.
//!
//! This crate provides:
//!
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support that captures output without judging the exit status.
//! - **Tool discovery** ([`tools`]) -- locate `dwg2dxf` via config or `PATH`
//!   and read its version under a timeout.
//! - **Workspace management** ([`ConversionWorkspace`]) -- a unique temporary
//!   directory per job, removed exactly once.
//! - **Converter seam** ([`Converter`], [`Dwg2DxfConverter`]) -- the black-box
//!   conversion step, replaceable in tests.
//! - **Output verification** ([`verify`]) -- the single success decision.
//! - **Job pipeline** ([`JobRunner`]) -- validate, stage, invoke, verify,
//!   read, clean up, with bounded concurrency.

pub mod command;
pub mod converter;
pub mod job;
pub mod tools;
pub mod verify;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use converter::{Converter, ConverterRun, Dwg2DxfConverter};
pub use job::{ConversionRequest, ConvertedFile, JobRunner, JobStage};
pub use tools::{check_converter, check_converter_within, ToolInfo};
pub use workspace::ConversionWorkspace;

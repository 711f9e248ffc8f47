//! Shared application context.
//!
//! [`AppContext`] is handed to every route handler via Axum state. It holds
//! immutable configuration, the job runner, and the converter availability
//! found at startup, all behind `Arc`s, so cloning it per request is cheap.

use std::sync::Arc;

use dr_convert::{JobRunner, ToolInfo};
use dr_core::config::Config;

/// Central application context shared across all route handlers.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub runner: Arc<JobRunner>,
    /// Converter availability detected once at startup.
    pub converter_tool: Arc<ToolInfo>,
}

impl AppContext {
    /// Build a context that runs jobs with the real `dwg2dxf` converter.
    pub fn from_config(config: Config, converter_tool: ToolInfo) -> Self {
        let runner = Arc::new(JobRunner::from_config(&config));
        Self::new(config, runner, converter_tool)
    }

    /// Build a context around an existing runner (tests plug fakes in here).
    pub fn new(config: Config, runner: Arc<JobRunner>, converter_tool: ToolInfo) -> Self {
        Self {
            config: Arc::new(config),
            runner,
            converter_tool: Arc::new(converter_tool),
        }
    }
}

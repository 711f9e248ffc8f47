//! Unified error type for conversion jobs.
//!
//! Every stage of a job funnels its failure into [`Error`], which carries
//! enough context for the HTTP layer to derive a status code via
//! [`Error::http_status`] and a client-safe summary via
//! [`Error::public_message`]. Internal detail stays in the `Display` output,
//! which is only ever logged.

/// Errors that can occur while validating, staging, running, or reading back
/// a conversion job.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was rejected before any resource was allocated.
    #[error("Bad input: {0}")]
    BadInput(String),

    /// The upload exceeded the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The job workspace could not be created.
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// The uploaded bytes could not be written into the workspace.
    #[error("Failed to write input file: {source}")]
    IoWrite {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The converter process could not be started.
    #[error("Failed to launch [{tool}]: {message}")]
    ProcessLaunch {
        /// Name of the tool that failed to start.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The converter ran but did not produce a usable output file.
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// The converter did not finish within the configured time.
    #[error("Tool [{tool}] timed out after {secs}s")]
    Timeout {
        /// Name of the tool that was killed.
        tool: String,
        /// The timeout that expired, in whole seconds.
        secs: u64,
    },

    /// All conversion slots are taken.
    #[error("Busy: {0}")]
    Busy(String),

    /// Any other I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The configuration could not be read or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::BadInput(_) => 400,
            Error::PayloadTooLarge(_) => 413,
            Error::Busy(_) => 503,
            Error::Workspace(_)
            | Error::IoWrite { .. }
            | Error::ProcessLaunch { .. }
            | Error::ConversionFailed(_)
            | Error::Timeout { .. }
            | Error::Io { .. }
            | Error::Config(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadInput(_) => "bad_input",
            Error::PayloadTooLarge(_) => "payload_too_large",
            Error::Workspace(_) => "workspace_error",
            Error::IoWrite { .. } => "io_write_error",
            Error::ProcessLaunch { .. } => "process_launch_error",
            Error::ConversionFailed(_) => "conversion_failed",
            Error::Timeout { .. } => "timeout",
            Error::Busy(_) => "busy",
            Error::Io { .. } => "io_error",
            Error::Config(_) => "config_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Short summary that is safe to show to a client.
    ///
    /// Client errors echo their own message. Server errors collapse to a fixed
    /// sentence so paths, tool output, and OS errors never leave the process.
    pub fn public_message(&self) -> String {
        match self {
            Error::BadInput(msg) | Error::PayloadTooLarge(msg) | Error::Busy(msg) => msg.clone(),
            Error::Workspace(_) => "Failed to prepare a conversion workspace".into(),
            Error::IoWrite { .. } => "Failed to store the uploaded file".into(),
            Error::ProcessLaunch { .. } => "The converter could not be started".into(),
            Error::ConversionFailed(_) => "File conversion failed".into(),
            Error::Timeout { .. } => "File conversion timed out".into(),
            Error::Io { .. } | Error::Config(_) | Error::Internal(_) => {
                "Internal server error".into()
            }
        }
    }

    /// Convenience constructor for [`Error::ProcessLaunch`].
    pub fn launch(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ProcessLaunch {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::IoWrite`].
    pub fn io_write(source: std::io::Error) -> Self {
        Error::IoWrite { source }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

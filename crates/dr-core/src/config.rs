//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! server, converter, and job sub-configs. Every section defaults sensibly so
//! a completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

/// Locations searched, in order, when no explicit config path is given.
const DEFAULT_PATHS: &[&str] = &[
    "./config.toml",
    "./dwgrelay.toml",
    "~/.config/dwgrelay/config.toml",
    "/etc/dwgrelay/config.toml",
];

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub converter: ConverterConfig,
    pub jobs: JobsConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("config parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Load from `custom_path` if given, otherwise from the first default
    /// location that exists, otherwise return the defaults.
    pub fn load_or_default(custom_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = custom_path {
            return Self::load(path);
        }

        for path_str in DEFAULT_PATHS {
            let expanded = shellexpand::tilde(path_str);
            let path = Path::new(expanded.as_ref());
            if path.exists() {
                tracing::info!("Loading config from {}", path.display());
                return Self::load(path);
            }
        }

        tracing::debug!("No config file found; using defaults");
        Ok(Self::default())
    }

    /// Reject values that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port cannot be 0".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::Config("server.max_upload_bytes cannot be 0".into()));
        }
        if self.converter.timeout_secs == 0 {
            return Err(Error::Config("converter.timeout_secs cannot be 0".into()));
        }
        if self.jobs.max_concurrent == 0 {
            return Err(Error::Config("jobs.max_concurrent cannot be 0".into()));
        }
        Ok(())
    }

    /// Return a list of non-fatal issues worth logging at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref path) = self.converter.path {
            if !path.exists() {
                warnings.push(format!(
                    "converter.path {} does not exist; falling back to PATH lookup",
                    path.display()
                ));
            }
        }

        if let Some(ref root) = self.jobs.temp_root {
            if !root.is_dir() {
                warnings.push(format!(
                    "jobs.temp_root {} is not a directory; jobs will fail to stage",
                    root.display()
                ));
            }
        }

        if self.server.cors_origins.is_empty() {
            warnings.push("server.cors_origins is empty; browsers cannot call the API".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".into()],
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

/// External converter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Explicit converter executable; `None` means look up `dwg2dxf` in PATH.
    pub path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            path: None,
            timeout_secs: 120,
        }
    }
}

/// Job admission and workspace placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Jobs allowed to run at once; further requests get 503.
    pub max_concurrent: usize,
    /// Directory under which workspaces are created (OS temp dir if unset).
    pub temp_root: Option<PathBuf>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            temp_root: None,
        }
    }
}

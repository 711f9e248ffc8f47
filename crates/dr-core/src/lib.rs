//! dr-core: shared errors, configuration, and format rules.
//!
//! This crate is the foundational dependency for the other dr-* crates. It
//! defines the unified [`Error`] taxonomy for conversion jobs, the TOML
//! [`config::Config`], and the [`format::FormatPair`] describing the single
//! supported input/output conversion.

pub mod config;
pub mod error;
pub mod format;

pub use error::{Error, Result};
pub use format::{FormatPair, DWG_TO_DXF};

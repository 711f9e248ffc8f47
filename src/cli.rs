use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dwgrelay")]
#[command(author, version, about = "Convert DWG drawings to DXF over HTTP")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP conversion server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Convert a single DWG file locally
    Convert {
        /// Input .dwg file
        #[arg(required = true)]
        input: PathBuf,

        /// Where to write the DXF (defaults to the input path with .dxf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that the dwg2dxf converter is available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

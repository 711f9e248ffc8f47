mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use dr_convert::{ConversionRequest, JobRunner};
use dr_core::config::Config;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;

    // CLI flags win over the config file.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting dwgrelay");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    dr_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dwgrelay=trace,dr_server=debug,dr_convert=debug,dr_core=debug,tower_http=debug"
                .to_string()
        } else {
            "dwgrelay=info,dr_server=info,dr_convert=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Convert { input, output } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_file(&input, output.as_deref(), cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dwgrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert_file(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load_or_default(config_path)?;

    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let filename = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let runner = JobRunner::from_config(&config);
    let file = runner.run(ConversionRequest::new(filename, data)).await?;

    let destination = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(&file.filename),
    };
    tokio::fs::write(&destination, &file.bytes)
        .await
        .with_context(|| format!("failed to write {}", destination.display()))?;

    println!(
        "Converted {} -> {} ({} bytes)",
        input.display(),
        destination.display(),
        file.bytes.len()
    );
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    let tool = rt.block_on(dr_convert::check_converter(&config.converter));

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let Some(ref version) = tool.version {
        print!(" ({})", version);
    }
    if let Some(ref path) = tool.path {
        print!(" - {}", path.display());
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!("dwg2dxf is missing. Install LibreDWG or set converter.path in the config.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  CORS origins: {}", config.server.cors_origins.join(", "));
    println!("  Max upload: {} bytes", config.server.max_upload_bytes);
    println!(
        "  Converter: {}",
        config
            .converter
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "dwg2dxf (from PATH)".to_string())
    );
    println!("  Timeout: {}s", config.converter.timeout_secs);
    println!("  Max concurrent jobs: {}", config.jobs.max_concurrent);
    for warning in config.warnings() {
        println!("  Warning: {warning}");
    }

    Ok(())
}

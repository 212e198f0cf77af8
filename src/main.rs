//! kantan-cms-mcp: MCP server for the Kantan CMS
//!
//! Reads `PROJECT_ID` and `CMS_API_KEY` from the environment and serves the
//! CMS tool surface over stdio.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use kantan_cms_mcp::config::{self, CmsConfig, Credentials};
use kantan_cms_mcp::error::ConfigError;
use kantan_cms_mcp::mcp::server::McpServer;

/// MCP server for the Kantan CMS.
///
/// Exposes collections, records, schemas, documentation and the starter
/// project template as tools for AI assistants.
#[derive(Parser, Debug)]
#[command(name = "kantan-cms-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Override the CMS base URL from the configuration file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Text printed to stderr when credentials cannot be loaded.
fn startup_error_message(error: &ConfigError) -> String {
    if error.is_missing_env() {
        format!("Error: {error}\nMCP server startup aborted due to missing environment variables.")
    } else {
        format!("Error: {error}")
    }
}

/// Entry point for the kantan-cms-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load settings
    let mut settings = match config::load_config(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
        if let Err(e) = settings.validate() {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    }

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &settings.logging.level);
    init_tracing(log_level);

    // Credentials are required before anything talks to the CMS
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", startup_error_message(&e));
            return ExitCode::FAILURE;
        }
    };
    let cms_config = CmsConfig::from_settings(credentials, &settings);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cms_config.base_url,
        project_id = %cms_config.credentials.project_id(),
        "Starting kantan-cms-mcp server"
    );

    let mut server = match McpServer::new(&cms_config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e.to_chain_string(), "Failed to create server");
            return ExitCode::FAILURE;
        }
    };

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

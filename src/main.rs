//! Evalgate — MCP server for a hosted evaluation platform.
//!
//! Usage:
//!   evalgate --api-key K --secret-key S --base-url https://api.example
//!
//! Credentials may also come from the environment (EVALGATE_API_KEY,
//! EVALGATE_SECRET_KEY, EVALGATE_BASE_URL) or from the config file;
//! CLI flags win, then environment, then file. Missing credentials are
//! fatal before any call is served.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use evalgate::config;
use evalgate::server::Server;
use evalgate::tools;

#[derive(Parser, Debug)]
#[command(name = "evalgate")]
#[command(version)]
#[command(about = "MCP server exposing a hosted evaluation platform's tooling")]
struct Cli {
    /// Evaluation platform API key.
    #[arg(long)]
    api_key: Option<String>,

    /// Evaluation platform secret key.
    #[arg(long)]
    secret_key: Option<String>,

    /// Evaluation platform base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Path to the config file.
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Stdout carries protocol frames; all diagnostics go to stderr.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(config::resolve_path(p)))
        .unwrap_or_else(config::default_config_path);

    let creds = match bootstrap(&cli, &config_path) {
        Ok(creds) => creds,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    let registry = match tools::catalog(&creds) {
        Ok(registry) => Arc::new(registry),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    info!("evalgate starting against {}", creds.base_url);
    Server::new(registry).run_stdio().await
}

/// Resolve credentials from the three configuration layers. Any missing
/// credential is a startup failure, not a per-call error.
fn bootstrap(cli: &Cli, config_path: &std::path::Path) -> Result<config::Credentials> {
    let file = config::load_file_config(config_path)?;
    let creds = config::resolve_credentials(
        cli.api_key.as_deref(),
        cli.secret_key.as_deref(),
        cli.base_url.as_deref(),
        &file,
    )?;
    Ok(creds)
}

//! orgdir server
//!
//! Serves the directory administration API over HTTP.

use clap::Parser;
use orgdir::{
    api,
    config::{LogFormat, load_config},
    directory::{DirectoryStore, InMemoryDirectory, SeedFile},
    path::PathGrammar,
    service::DirectoryService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directory-backed organization and group administration
#[derive(Parser, Debug)]
#[command(name = "orgdir")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ORGDIR_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ORGDIR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// HTTP server host
    #[arg(long, env = "ORGDIR_HOST")]
    host: Option<String>,

    /// HTTP server port
    #[arg(long, env = "ORGDIR_PORT")]
    port: Option<u16>,

    /// JSON seed file for the in-memory directory
    #[arg(long, env = "ORGDIR_SEED")]
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up ORGDIR_* variables from a local .env, if any
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }

    // Initialize logging
    let level = args
        .log_level
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting orgdir");

    let grammar = Arc::new(
        PathGrammar::new(&config.directory)
            .inspect_err(|e| error!(error = %e, "Invalid directory layout"))?,
    );

    let store = Arc::new(InMemoryDirectory::new(grammar.clone()));
    info!(
        store = store.store_type(),
        internal_root = grammar.branch_root_dn(orgdir::Branch::Internal),
        external_root = grammar.branch_root_dn(orgdir::Branch::External),
        "Directory store ready"
    );

    if let Some(seed_path) = args.seed.or_else(|| config.directory.seed_file.clone()) {
        let seed = SeedFile::load(&seed_path)
            .inspect_err(|e| error!(error = %e, "Failed to read seed file"))?;
        let added = seed
            .apply(store.as_ref(), &grammar)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to seed directory"))?;
        info!(path = %seed_path, added, "Seed applied");
    }

    let service = Arc::new(DirectoryService::new(store, grammar));

    api::serve(service, &config.server)
        .await
        .inspect_err(|e| error!(error = %e, "Server error"))?;

    Ok(())
}

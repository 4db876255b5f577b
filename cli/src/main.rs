//! Bike rental service, headless CLI
//!
//! ```sh
//! # Default config (~/.config/bike-rental/config.toml)
//! bike-rental-service
//!
//! # Custom config path and port
//! bike-rental-service --config /etc/bike-rental/config.toml --api-port 9000
//!
//! # Validate config without starting
//! bike-rental-service --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use bikerental::config::{AppConfig, StorageBackend};
use bikerental::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "bike-rental-service",
    version,
    about = "Bike reservation service with conflict-free booking and dynamic discounts",
    long_about = "REST API server for bike reservations.\n\n\
                  Default config: ~/.config/bike-rental/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BIKERENTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(bikerental::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if cli.check => {
            eprintln!("Configuration is invalid: {e}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.api_address());
        match config.database.backend {
            StorageBackend::Memory => println!("   Storage     : memory"),
            _ => println!("   Database    : {}", config.database.connection_url()),
        }
        println!("   Isolation   : {}", config.reservations.isolation);
        println!("   Log level   : {}", config.logging.level);
        return ExitCode::SUCCESS;
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    ExitCode::SUCCESS
}

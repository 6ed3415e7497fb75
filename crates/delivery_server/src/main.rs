//! Delivery Quote Server
//!
//! REST API for staged delivery price quotes.

use clap::Parser;
use delivery_server::config::{build_config, CliArgs as ConfigCliArgs, LogFormat};
use delivery_server::server::Server;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Delivery Quote Server - REST API for delivery price quotes
#[derive(Parser, Debug)]
#[command(name = "delivery_server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML format)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, env = "DELIVERY_SERVER_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "DELIVERY_SERVER_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DELIVERY_LOG_LEVEL")]
    log_level: Option<String>,

    /// SQLite database file
    #[arg(long, value_name = "PATH", env = "DELIVERY_DATABASE_PATH")]
    database: Option<PathBuf>,
}

impl From<Args> for ConfigCliArgs {
    fn from(args: Args) -> Self {
        ConfigCliArgs {
            config_file: args.config,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
            database_path: args.database,
        }
    }
}

fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cli_args: ConfigCliArgs = args.into();
    let config = build_config(&cli_args)?;

    init_tracing(config.log_level.as_filter_str(), config.log_format);

    tracing::info!("Delivery Quote Server v{}", delivery_server::VERSION);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        log_level = %config.log_level,
        log_format = %config.log_format,
        environment = %config.environment,
        database = %config.database_path.display(),
        mail_backend = %config.mail.backend(),
        "Server configuration loaded"
    );

    let server = Server::new(config)?;
    tracing::info!(address = %server.bind_addr(), "Starting server");

    server.run().await?;

    Ok(())
}

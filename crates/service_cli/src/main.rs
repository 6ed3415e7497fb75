//! Delivery CLI - Command Line Quotes and Quote History
//!
//! # Commands
//!
//! - `delivery quote --distance <km> --material <m> --urgency <u> --weight <kg> --location <l>`
//!   prices a request offline and prints the breakdown and action log
//! - `delivery history [--database <file>] [--ticket <id>]` reads quotes stored
//!   by the server

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

pub use error::{CliError, Result};

/// Delivery quote CLI
#[derive(Parser)]
#[command(name = "delivery")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a delivery request without contacting the server
    Quote {
        /// Distance in kilometres
        #[arg(short, long, allow_negative_numbers = true)]
        distance: f64,

        /// Material type (standard, fragile, perishable, heavy)
        #[arg(short, long, default_value = "standard")]
        material: String,

        /// Urgency (standard, express, same-day)
        #[arg(short, long, default_value = "standard")]
        urgency: String,

        /// Weight in kilograms
        #[arg(short, long, allow_negative_numbers = true)]
        weight: f64,

        /// Location type (urban, rural)
        #[arg(short, long, default_value = "urban")]
        location: String,

        /// User id recorded on the quote
        #[arg(long, default_value = "cli")]
        user: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List stored quotes or show one
    History {
        /// SQLite database written by the server
        #[arg(long, default_value = "delivery.db", env = "DELIVERY_DATABASE_PATH")]
        database: PathBuf,

        /// Show a single ticket
        #[arg(short, long)]
        ticket: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    // Initialise tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let output = match cli.command {
        Commands::Quote {
            distance,
            material,
            urgency,
            weight,
            location,
            user,
            format,
        } => commands::quote::run(
            commands::quote::QuoteArgs {
                distance,
                material,
                urgency,
                weight,
                location,
                user,
            },
            format,
            cli.verbose,
        )?,
        Commands::History {
            database,
            ticket,
            format,
        } => commands::history::run(&database, ticket.as_deref(), format)?,
    };

    println!("{}", output);
    Ok(())
}

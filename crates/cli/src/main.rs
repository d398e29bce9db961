//! Nexus CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the streaming HTTP API (default)
//! - `ask`:   Run one question through the loop and print each step

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Nexus, a conversational search agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port (otherwise PORT or 8000)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
    },

    /// Ask a single question and print every step of the loop
    Ask {
        /// The question
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Loaded before tracing so RUST_LOG may come from .env.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if let Some(warning) = dotenv_warning(&dotenv) {
        tracing::warn!("{warning}");
    }

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
    }

    Ok(())
}

/// A missing `.env` is fine; one that exists but cannot be read is not.
fn dotenv_warning<T>(result: &Result<T, dotenvy::Error>) -> Option<String> {
    match result {
        Err(e) if !e.not_found() => Some(format!("Ignoring unreadable .env file: {e}")),
        _ => None,
    }
}

//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod categories;
mod scrape;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use scrape::ScrapeArgs;

#[derive(Parser)]
#[command(name = "daraz")]
#[command(about = "Daraz Nepal product listing scraper")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./daraz.toml when present)
    #[arg(short, long, global = true, env = "DARAZ_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Without a subcommand, scrape interactively
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a category into a CSV file (prompts for anything not given)
    Scrape(ScrapeArgs),

    /// Start the HTTP API server
    Serve {
        /// Address to bind to (port, host, or host:port)
        #[arg(short, long, env = "DARAZ_BIND")]
        bind: Option<String>,
    },

    /// List popular category slugs
    Categories,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        None => scrape::cmd_scrape(config_path, ScrapeArgs::default()).await,
        Some(Commands::Scrape(args)) => scrape::cmd_scrape(config_path, args).await,
        Some(Commands::Serve { bind }) => serve::cmd_serve(config_path, bind.as_deref()).await,
        Some(Commands::Categories) => categories::cmd_categories(),
    }
}

//! Axion CLI - encrypted environment variables for developer projects
//!
//! This is the main entry point for the Axion command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cwd = cli.cwd.as_deref();
    match cli.command {
        Commands::Init(args) => commands::init::run(args, cwd).await,
        Commands::Set(args) => commands::set::run(args, cwd).await,
        Commands::Get(args) => commands::get::run(args, cwd).await,
        Commands::Unset(args) => commands::unset::run(args, cwd).await,
        Commands::List(args) => commands::list::run(args, cwd).await,
        Commands::Import(args) => commands::import::run(args, cwd).await,
        Commands::Run(args) => {
            let code = commands::run::run(args, cwd).await?;
            std::process::exit(code);
        }
        Commands::Rotate(args) => commands::rotate::run(args, cwd).await,
        Commands::Drift(args) => commands::drift::run(args, cwd).await,
        Commands::Push(args) => commands::push::run(args, cwd).await,
        Commands::Pull(args) => commands::pull::run(args, cwd).await,
        Commands::History(args) => commands::history::run(args, cwd).await,
        Commands::Rollback(args) => commands::rollback::run(args, cwd).await,
        Commands::Link(args) => commands::link::run(args, cwd).await,
        Commands::Recovery(args) => commands::recovery::run(args, cwd).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

//! gangway CLI - A C header binding generator for managed languages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("gangway=debug")
    } else {
        EnvFilter::new("gangway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color;

    // Execute command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, color),
        Commands::Check(args) => commands::check::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

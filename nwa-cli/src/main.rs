use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::fetch::FetchArgs;
use commands::query::QueryCommands;

/// nwa - Inspect network automation collections from the command line
#[derive(Parser)]
#[command(name = "nwa")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (skips the default search path)
    #[arg(long, global = true, value_name = "FILE", env = "NWA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a collection
    Fetch(FetchArgs),
    /// Encode or decode table query strings
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::execute(args, cli.config).await,
        Commands::Query { command } => commands::query::execute(command, cli.config),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}

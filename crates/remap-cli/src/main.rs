mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "swath-remap", about = "Remap satellite swath bands onto grids")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remap every band of a job set
    Run(commands::run::RunArgs),
    /// List the grids known to the catalog
    Grids(commands::grids::GridsArgs),
    /// Print a default remap config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::Grids(args) => commands::grids::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}

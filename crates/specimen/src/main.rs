//! Specimen - upload a photo of a plant or insect, get its species.
//!
//! Runs the web front door and the supporting maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account, then serve the web app
//! specimen users create ada
//! specimen serve --bind 0.0.0.0:8000
//!
//! # Classify files directly
//! specimen classify ./photos/ --format jsonl --output results.jsonl
//!
//! # Precompute the class bank
//! specimen cache build
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Specimen - zero-shot species identification for field observations.
#[derive(Parser, Debug)]
#[command(name = "specimen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "SPECIMEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web app
    Serve(cli::serve::ServeArgs),

    /// Classify image files and write one record per image
    Classify(cli::classify::ClassifyArgs),

    /// Build, inspect or clear the cached class bank
    Cache(cli::cache::CacheArgs),

    /// Manage user accounts
    Users(cli::users::UsersArgs),

    /// List or delete recorded observations
    Observations(cli::observations::ObservationsArgs),

    /// Show where models live and whether they are complete
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config_path = cli.config.as_deref().map(|p| {
        PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned())
    });
    let config = match cli::load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `specimen config path`."
            );
            specimen_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Specimen v{}", specimen_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Cache(args) => cli::cache::execute(args, config).await,
        Commands::Users(args) => cli::users::execute(args, config).await,
        Commands::Observations(args) => cli::observations::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, config_path).await,
    }
}

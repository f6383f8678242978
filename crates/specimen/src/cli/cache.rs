//! The `specimen cache` command for the persisted class bank.

use clap::{Args, Subcommand};
use specimen_core::{ClassBank, Config, SpeciesCatalog};

use super::theme;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Compute the class bank now (loads the model)
    Build {
        /// Discard any existing artifact and recompute
        #[arg(long)]
        force: bool,
    },

    /// Show the artifact's metadata and whether it fits the current catalog
    Status,

    /// Delete the artifact and its metadata
    Clear,
}

pub async fn execute(args: CacheArgs, config: Config) -> anyhow::Result<()> {
    let path = config.cache_path();

    match args.command {
        CacheCommand::Build { force } => {
            if force {
                ClassBank::remove(&path)?;
                tracing::info!("Removed existing class bank at {}", path.display());
            }
            let classifier = tokio::task::spawn_blocking({
                let config = config.clone();
                move || super::load_classifier(&config)
            })
            .await??;
            println!(
                "Class bank ready: {} species x {} dims at {}",
                classifier.bank().class_count(),
                classifier.bank().embedding_dim(),
                path.display()
            );
        }

        CacheCommand::Status => {
            let catalog = SpeciesCatalog::load(&config.catalog, &config.species_file())?;
            println!("Artifact: {}", path.display());
            println!(
                "Catalog:  {} species {}",
                catalog.len(),
                theme::dim(format!("({:?})", catalog.source()))
            );

            if !path.exists() {
                println!("Status:   {}", theme::dim("not built"));
                return Ok(());
            }

            match ClassBank::inspect(&path) {
                Ok(meta) => {
                    println!("Columns:  {}", meta.column_count);
                    println!("Dims:     {}", meta.embedding_dim);
                    println!("Model:    {}", meta.model);
                    println!("Digest:   {}", meta.label_digest);
                    let verdict = meta.check(
                        catalog.labels(),
                        &config.model.name,
                        config.model.embedding_dim,
                        config.cache.strict,
                    );
                    match verdict {
                        Ok(()) => println!("Status:   {}", theme::highlight("usable")),
                        Err(reason) => println!("Status:   stale, {reason}"),
                    }
                }
                Err(e) => println!("Status:   unreadable, {e}"),
            }
        }

        CacheCommand::Clear => {
            ClassBank::remove(&path)?;
            println!("Cleared class bank at {}", path.display());
        }
    }

    Ok(())
}

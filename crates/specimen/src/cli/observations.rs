//! The `specimen observations` command.

use clap::{Args, Subcommand};
use specimen_core::{Config, MediaStore, ObservationFilter};

use super::theme;

#[derive(Args, Debug)]
pub struct ObservationsArgs {
    #[command(subcommand)]
    pub command: ObservationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ObservationsCommand {
    /// List observations, newest first
    List {
        /// Only this species (exact label)
        #[arg(long)]
        species: Option<String>,

        /// Maximum rows
        #[arg(short = 'n', long)]
        limit: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete an observation and its stored photo
    Delete { id: i64 },
}

pub async fn execute(args: ObservationsArgs, config: Config) -> anyhow::Result<()> {
    let db = super::open_database(&config).await?;

    match args.command {
        ObservationsCommand::List {
            species,
            limit,
            json,
        } => {
            let filter = ObservationFilter { species, limit };
            let observations = db.list_observations(&filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&observations)?);
            } else if observations.is_empty() {
                println!("No observations.");
            } else {
                for o in &observations {
                    println!(
                        "{:>5}  {:<32}  {:>5.1}%  {:<12}  {}",
                        o.id,
                        o.species_name,
                        o.confidence,
                        o.username,
                        theme::dim(o.created_at.format("%Y-%m-%d %H:%M"))
                    );
                }
            }
        }

        ObservationsCommand::Delete { id } => {
            let removed = db.delete_observation(id).await?;
            let media = MediaStore::new(config.media_root());
            if let Err(e) = media.remove(&removed.image).await {
                tracing::warn!("Observation deleted but its photo was not: {e}");
            }
            println!("Deleted observation {} ({})", removed.id, removed.species_name);
        }
    }

    db.close().await;
    Ok(())
}

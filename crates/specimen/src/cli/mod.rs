//! Subcommands and the helpers they share.

pub mod cache;
pub mod classify;
pub mod config;
pub mod models;
pub mod observations;
pub mod serve;
pub mod theme;
pub mod users;

use std::path::Path;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use specimen_core::{ClipModel, Config, Database, SpeciesClassifier};

/// Load configuration from `path`, or the default location when `None`.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Load the embedding model and build the species classifier, showing a
/// progress bar if the class bank has to be computed.
///
/// Blocking: call from `spawn_blocking` inside the runtime.
pub fn load_classifier(config: &Config) -> anyhow::Result<SpeciesClassifier> {
    let model = Arc::new(ClipModel::load(&config.model, &config.model_dir())?);

    let mut bar: Option<ProgressBar> = None;
    let classifier = SpeciesClassifier::initialize_with_progress(
        config,
        model,
        &mut |done, total| {
            let pb = bar.get_or_insert_with(|| {
                let pb = progress_bar(total as u64);
                pb.set_message("embedding species names");
                pb
            });
            pb.set_position(done as u64);
        },
    )?;
    if let Some(pb) = bar {
        pb.finish_with_message("class bank ready");
    }

    Ok(classifier)
}

/// Open the observation database at its configured path.
pub async fn open_database(config: &Config) -> anyhow::Result<Database> {
    Ok(Database::open(&config.database_path()).await?)
}

/// Progress bar in the house style.
pub fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("##-");
    pb.set_style(style);
    pb
}

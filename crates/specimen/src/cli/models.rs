//! The `specimen models` command.
//!
//! Models are not downloaded: export the CLIP-family model to ONNX and drop
//! the files into `{model_dir}/{name}/`. These subcommands show where and
//! what is missing.

use clap::{Args, Subcommand};
use specimen_core::embedding::ModelFiles;
use specimen_core::Config;

use super::theme;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// List model directories and check the configured model's files
    List,

    /// Show the model directory path
    Path,
}

pub async fn execute(args: ModelsArgs, config: Config) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    match args.command {
        ModelsCommand::Path => {
            println!("{}", model_dir.display());
        }

        ModelsCommand::List => {
            println!("Model directory: {}\n", model_dir.display());

            let mut names: Vec<String> = match std::fs::read_dir(&model_dir) {
                Ok(entries) => entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_dir())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect(),
                Err(_) => Vec::new(),
            };
            if !names.contains(&config.model.name) {
                names.push(config.model.name.clone());
            }
            names.sort();

            for name in names {
                let mut model = config.model.clone();
                model.name = name.clone();
                let files = ModelFiles::new(&model, &model_dir);
                let status = if files.complete() {
                    theme::highlight("ready")
                } else {
                    "incomplete".to_string()
                };
                let marker = if name == config.model.name {
                    "  (configured)"
                } else {
                    ""
                };
                println!("  {name:<28} {status}{marker}");

                if name == config.model.name {
                    for path in files.all() {
                        let mark = if path.exists() { "✓" } else { "✗" };
                        println!("      {mark} {}", theme::dim(path.display()));
                    }
                }
            }
        }
    }

    Ok(())
}

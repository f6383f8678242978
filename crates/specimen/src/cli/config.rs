//! The `specimen config` command.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use specimen_core::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show the config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// `path` is the `--config` override, if any.
pub async fn execute(
    args: ConfigArgs,
    config: Config,
    path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(Config::default_path);

    match args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let init = || ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };

        execute(init(), Config::default(), Some(path.clone()))
            .await
            .unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.model.name, Config::default().model.name);

        assert!(execute(init(), Config::default(), Some(path.clone()))
            .await
            .is_err());
        let force = ConfigArgs {
            command: ConfigCommand::Init { force: true },
        };
        assert!(execute(force, Config::default(), Some(path)).await.is_ok());
    }
}

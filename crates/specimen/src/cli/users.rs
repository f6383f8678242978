//! The `specimen users` command. Accounts are created here; the web front
//! door has no sign-up page.

use clap::{Args, Subcommand};
use dialoguer::Password;
use specimen_core::Config;

use super::theme;

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Create an account
    Create {
        username: String,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,

        /// Password; prompted for when omitted
        #[arg(long, env = "SPECIMEN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// List accounts
    List,
}

pub async fn execute(args: UsersArgs, config: Config) -> anyhow::Result<()> {
    let db = super::open_database(&config).await?;

    match args.command {
        UsersCommand::Create {
            username,
            admin,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(&username)?,
            };
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }
            let user = db.create_user(&username, &password, admin).await?;
            println!(
                "Created {} user '{}' (id {})",
                if user.is_admin { "admin" } else { "regular" },
                user.username,
                user.id
            );
        }

        UsersCommand::List => {
            let users = db.list_users().await?;
            if users.is_empty() {
                println!("No users. Create one with `specimen users create <name>`.");
            }
            for user in users {
                let role = if user.is_admin { " (admin)" } else { "" };
                println!(
                    "{:>4}  {}{}  {}",
                    user.id,
                    user.username,
                    role,
                    theme::dim(user.created_at.format("%Y-%m-%d"))
                );
            }
        }
    }

    db.close().await;
    Ok(())
}

fn prompt_password(username: &str) -> anyhow::Result<String> {
    let password = Password::with_theme(&theme::specimen_theme())
        .with_prompt(format!("Password for {username}"))
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;
    Ok(password)
}

use anyhow::{bail, Context};
use clap::Subcommand;

use crate::auth::hash_password;
use crate::database::models::Role;
use crate::database::repositories::users::{self, NewUser};
use crate::database::Database;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Create an admin account directly in the store")]
    Create {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email (stored lowercased)")]
        email: String,
        #[arg(long, help = "Initial password")]
        password: String,
    },
}

/// Bootstrap path for a fresh install: the register endpoint only ever
/// creates employee-role accounts, so the first admin comes from here.
pub async fn handle(cmd: AdminCommands) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create {
            name,
            email,
            password,
        } => {
            Database::migrate()
                .await
                .context("database unavailable; is DATABASE_URL set?")?;

            let email = email.trim().to_lowercase();
            if email.is_empty() || !email.contains('@') {
                bail!("a valid --email is required");
            }
            if password.is_empty() {
                bail!("--password cannot be empty");
            }
            if users::find_by_email(&email).await?.is_some() {
                bail!("a user with email {} already exists", email);
            }

            let user = users::insert(NewUser {
                name: name.trim().to_string(),
                email,
                password: hash_password(&password)?,
                role: Role::Admin,
            })
            .await?;

            println!("Created admin {} <{}> ({})", user.name, user.email, user.id);
            Ok(())
        }
    }
}

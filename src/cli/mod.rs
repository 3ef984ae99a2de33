pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "staffctl")]
#[command(about = "Operator CLI for the staff API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Running-server checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Administrative account management")]
    Admin {
        #[command(subcommand)]
        cmd: commands::admin::AdminCommands,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd).await,
        Commands::Admin { cmd } => commands::admin::handle(cmd).await,
    }
}

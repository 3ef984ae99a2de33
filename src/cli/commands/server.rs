use anyhow::Context;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from the /health endpoint")]
    Health {
        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },

    #[command(about = "Show server information from the API root endpoint")]
    Info {
        #[arg(long, default_value = "http://localhost:5000", help = "Server base URL")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let body = fetch_json(&format!("{}/health", url.trim_end_matches('/'))).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        ServerCommands::Info { url } => {
            let body = fetch_json(url.trim_end_matches('/')).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
    }
}

async fn fetch_json(url: &str) -> anyhow::Result<serde_json::Value> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("request to {} failed", url))?;
    let status = resp.status();
    let body: serde_json::Value = resp
        .json()
        .await
        .with_context(|| format!("non-JSON response from {} ({})", url, status))?;
    Ok(body)
}

mod cli;
mod error;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, parse_env_pair};
use enginecfg_core::{EngineClient, EngineId, GcloudTokenProvider};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = run(cli).await {
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let id = EngineId::new(
        cli.project
            .context("missing project id: pass --project or set GOOGLE_CLOUD_PROJECT")?,
        cli.location
            .context("missing location: pass --location or set GOOGLE_CLOUD_LOCATION")?,
        cli.engine_id
            .context("missing engine id: pass --engine-id or set ENGINECFG_ENGINE_ID")?,
    );

    let client = EngineClient::new(Arc::new(GcloudTokenProvider));

    let vars = match cli.command {
        Commands::Set { vars } => {
            let updates = vars
                .iter()
                .map(|raw| parse_env_pair(raw))
                .collect::<Result<Vec<_>>>()?;
            client.apply_env_vars(&id, &updates).await?
        }
        Commands::Unset { names } => client.remove_env_vars(&id, &names).await?,
        Commands::List => client.list_env_vars(&id).await?,
    };

    output::print_env_vars(&vars, cli.format)
}

mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use accubid_lib::{ApiClient, CancellationToken, ConnectorConfig};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "accubid")]
#[command(about = "Query estimating, project and change order data from Accubid Anywhere")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured credentials can reach the API
    TestConnection,
    /// List databases available to the authenticated user
    Databases,
    /// List projects in a database
    Projects(commands::projects::ProjectsArgs),
    /// Read any data object
    Read(commands::read::ReadArgs),
    /// List readable data objects and their parameters
    Objects,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("accubid=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding requests");
            ctrl_c.cancel();
        }
    });

    match &cli.command {
        Commands::Objects => commands::objects::run(&format)?,
        Commands::TestConnection => {
            let client = build_client(cli.config.as_deref())?;
            commands::test_connection::run(&client, &format, &cancel).await?
        }
        Commands::Databases => {
            let client = build_client(cli.config.as_deref())?;
            commands::databases::run(&client, &format, &cancel).await?
        }
        Commands::Projects(args) => {
            let client = build_client(cli.config.as_deref())?;
            commands::projects::run(args, &client, &format, &cancel).await?
        }
        Commands::Read(args) => {
            let client = build_client(cli.config.as_deref())?;
            commands::read::run(args, &client, &format, &cancel).await?
        }
    }

    Ok(())
}

fn build_client(config_path: Option<&Path>) -> Result<ApiClient> {
    let mut config = match config_path {
        Some(path) => ConnectorConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConnectorConfig::default(),
    };
    config.apply_env_overrides()?;
    Ok(config.build_client()?)
}

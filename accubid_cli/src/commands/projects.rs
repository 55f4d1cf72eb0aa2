use anyhow::Result;
use clap::Args;
use accubid_lib::types::Project;
use accubid_lib::{ApiClient, CancellationToken};

use crate::output::{print_json, print_projects_table, OutputFormat};

#[derive(Args)]
pub struct ProjectsArgs {
    /// Database token (see `accubid databases`)
    #[arg(long)]
    pub database_token: String,

    /// Only the most recently accessed projects
    #[arg(long)]
    pub last: bool,
}

pub async fn run(
    args: &ProjectsArgs,
    client: &ApiClient,
    format: &OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let response = if args.last {
        client
            .get_last_projects::<Project>(&args.database_token, cancel)
            .await?
    } else {
        client
            .get_projects::<Project>(&args.database_token, cancel)
            .await?
    };
    let projects = response.into_data_or_err()?;

    eprintln!("{} projects", projects.len());

    match format {
        OutputFormat::Table => print_projects_table(&projects),
        OutputFormat::Json => print_json(&projects),
    }

    Ok(())
}

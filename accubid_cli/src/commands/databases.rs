use anyhow::Result;
use accubid_lib::types::Database;
use accubid_lib::{ApiClient, CancellationToken};

use crate::output::{print_databases_table, print_json, OutputFormat};

pub async fn run(client: &ApiClient, format: &OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let databases = client
        .get_databases::<Database>(cancel)
        .await?
        .into_data_or_err()?;

    eprintln!("{} databases", databases.len());

    match format {
        OutputFormat::Table => print_databases_table(&databases),
        OutputFormat::Json => print_json(&databases),
    }

    Ok(())
}

use anyhow::{bail, Result};
use accubid_lib::{ApiClient, CancellationToken, ConnectionTester};

use crate::output::{print_connection_result, print_json, OutputFormat};

pub async fn run(client: &ApiClient, format: &OutputFormat, cancel: &CancellationToken) -> Result<()> {
    let tester = ConnectionTester::new(client.clone());
    let result = tester.test_connection(cancel).await;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => print_connection_result(&result),
    }

    if !result.success {
        bail!("Connection test failed");
    }
    Ok(())
}

use anyhow::{anyhow, Result};
use clap::Args;
use accubid_lib::{ApiClient, CancellationToken, DataObject, DataReader, RequestParameters};

use crate::output::{print_json, print_records_table, OutputFormat};

#[derive(Args)]
pub struct ReadArgs {
    /// Data object to read (see `accubid objects`)
    pub object: String,

    /// Request parameter as key=value; repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Request parameters as a JSON object; --param values override its keys
    #[arg(long)]
    pub params_json: Option<String>,
}

pub async fn run(
    args: &ReadArgs,
    client: &ApiClient,
    format: &OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let object: DataObject = args.object.parse()?;
    let params = build_params(args)?;

    let missing: Vec<&str> = object
        .required_params()
        .iter()
        .copied()
        .filter(|key| params.get_str(key).is_none())
        .collect();
    if !missing.is_empty() {
        eprintln!("Missing required parameters for {}: {}", object, missing.join(", "));
    }

    let reader = DataReader::new(client.clone());
    let records = reader.read(object, &params, cancel).await?;

    eprintln!("{} records", records.len());

    match format {
        OutputFormat::Table => print_records_table(&records),
        OutputFormat::Json => print_json(&records),
    }

    Ok(())
}

fn build_params(args: &ReadArgs) -> Result<RequestParameters> {
    let mut params = match &args.params_json {
        Some(json) => RequestParameters::from_json_str(json)?,
        None => RequestParameters::new(),
    };
    for pair in &args.params {
        let (key, value) = parse_param(pair)?;
        params.insert(key, value);
    }
    Ok(params)
}

fn parse_param(pair: &str) -> Result<(&str, &str)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --param {:?}: expected KEY=VALUE", pair))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Invalid --param {:?}: empty key", pair));
    }
    Ok((key, value.trim()))
}

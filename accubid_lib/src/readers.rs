//! Data readers: one per readable Accubid object.
//!
//! A reader validates its request parameters, calls the matching
//! [`ApiClient`] endpoint and flattens the envelope into JSON records.
//! Some readers stamp the identifying request parameter onto each record so
//! downstream consumers can relate child records to their parent.

use std::fmt;
use std::str::FromStr;

use accubid_api::{ApiClient, ApiResponse, CancellationToken, Module};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConnectorError, ReaderError};

/// Date format accepted by `startDate` and `endDate`.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// A readable object, one per API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataObject {
    ContractCostDistribution,
    Contracts,
    Pco,
    Pcos,
    ContractQuoteLabels,
    ContractStatuses,
    ContractSubcontractLabels,
    FinalPrice,
    Databases,
    Estimates,
    Estimate,
    EstimatesByDueDate,
    ExtensionItemDetailsFileSignalR,
    NotificationTest,
    Projects,
    Project,
    LastProjects,
}

impl DataObject {
    pub const ALL: [DataObject; 17] = [
        DataObject::ContractCostDistribution,
        DataObject::Contracts,
        DataObject::Pco,
        DataObject::Pcos,
        DataObject::ContractQuoteLabels,
        DataObject::ContractStatuses,
        DataObject::ContractSubcontractLabels,
        DataObject::FinalPrice,
        DataObject::Databases,
        DataObject::Estimates,
        DataObject::Estimate,
        DataObject::EstimatesByDueDate,
        DataObject::ExtensionItemDetailsFileSignalR,
        DataObject::NotificationTest,
        DataObject::Projects,
        DataObject::Project,
        DataObject::LastProjects,
    ];

    /// Kebab-case name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            DataObject::ContractCostDistribution => "contract-cost-distribution",
            DataObject::Contracts => "contracts",
            DataObject::Pco => "pco",
            DataObject::Pcos => "pcos",
            DataObject::ContractQuoteLabels => "contract-quote-labels",
            DataObject::ContractStatuses => "contract-statuses",
            DataObject::ContractSubcontractLabels => "contract-subcontract-labels",
            DataObject::FinalPrice => "final-price",
            DataObject::Databases => "databases",
            DataObject::Estimates => "estimates",
            DataObject::Estimate => "estimate",
            DataObject::EstimatesByDueDate => "estimates-by-due-date",
            DataObject::ExtensionItemDetailsFileSignalR => "extension-item-details-file-signal-r",
            DataObject::NotificationTest => "notification-test",
            DataObject::Projects => "projects",
            DataObject::Project => "project",
            DataObject::LastProjects => "last-projects",
        }
    }

    pub fn module(&self) -> Module {
        match self {
            DataObject::ContractCostDistribution
            | DataObject::Contracts
            | DataObject::Pco
            | DataObject::Pcos
            | DataObject::ContractQuoteLabels
            | DataObject::ContractStatuses
            | DataObject::ContractSubcontractLabels => Module::ChangeOrder,
            DataObject::FinalPrice => Module::Closeout,
            DataObject::Databases => Module::Database,
            DataObject::Estimates
            | DataObject::Estimate
            | DataObject::EstimatesByDueDate
            | DataObject::ExtensionItemDetailsFileSignalR
            | DataObject::NotificationTest => Module::Estimate,
            DataObject::Projects | DataObject::Project | DataObject::LastProjects => {
                Module::Project
            }
        }
    }

    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            DataObject::ContractCostDistribution
            | DataObject::Pcos
            | DataObject::ContractQuoteLabels
            | DataObject::ContractStatuses
            | DataObject::ContractSubcontractLabels => &["databaseToken", "contractId"],
            DataObject::Contracts | DataObject::Estimates => &["databaseToken", "projectId"],
            DataObject::Pco => &["databaseToken", "pcoId"],
            DataObject::FinalPrice => &["databaseToken", "bidSummaryId"],
            DataObject::Databases => &[],
            DataObject::Estimate => &["databaseToken", "estimateId"],
            DataObject::EstimatesByDueDate => &["databaseToken", "startDate", "endDate"],
            DataObject::ExtensionItemDetailsFileSignalR => {
                &["databaseToken", "estimateId", "connectionId"]
            }
            DataObject::NotificationTest => &["connectionId"],
            DataObject::Projects | DataObject::LastProjects => &["databaseToken"],
            DataObject::Project => &["databaseToken", "id"],
        }
    }

    pub fn optional_params(&self) -> &'static [&'static str] {
        match self {
            DataObject::ExtensionItemDetailsFileSignalR => &["bidSummaryId"],
            _ => &[],
        }
    }

    /// Human-readable plural used in log lines and errors.
    fn noun(&self) -> &'static str {
        match self {
            DataObject::ContractCostDistribution => "cost distribution",
            DataObject::Contracts => "contracts",
            DataObject::Pco => "PCO details",
            DataObject::Pcos => "PCOs",
            DataObject::ContractQuoteLabels => "quote labels",
            DataObject::ContractStatuses => "statuses",
            DataObject::ContractSubcontractLabels => "subcontract labels",
            DataObject::FinalPrice => "final price details",
            DataObject::Databases => "databases",
            DataObject::Estimates | DataObject::EstimatesByDueDate => "estimates",
            DataObject::Estimate => "estimate details",
            DataObject::ExtensionItemDetailsFileSignalR => "extension item details file URL",
            DataObject::NotificationTest => "notification test response",
            DataObject::Projects | DataObject::LastProjects => "projects",
            DataObject::Project => "project details",
        }
    }
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataObject {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        DataObject::ALL
            .iter()
            .copied()
            .find(|object| object.name() == wanted)
            .ok_or_else(|| ConnectorError::Config(format!("Unknown data object: {}", s)))
    }
}

/// Label used when a parameter is missing.
fn param_label(key: &str) -> &str {
    match key {
        "databaseToken" => "Database token",
        "contractId" => "Contract ID",
        "projectId" | "id" => "Project ID",
        "pcoId" => "PCO ID",
        "bidSummaryId" => "Bid summary ID",
        "estimateId" => "Estimate ID",
        "connectionId" => "Connection ID",
        "startDate" => "Start date",
        "endDate" => "End date",
        other => other,
    }
}

/// The parameter bag passed to a reader: a JSON object of named values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParameters(Map<String, Value>);

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object. Anything other than an object is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, ConnectorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// A non-empty string value, or `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParameters
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Checks the parameters an object needs. Logs and returns `false` on the
/// first missing or malformed one.
pub fn validate_params(object: DataObject, params: &RequestParameters) -> bool {
    for key in object.required_params() {
        let Some(value) = params.get_str(key) else {
            tracing::error!("{} is missing from arguments", param_label(key));
            return false;
        };
        if matches!(*key, "startDate" | "endDate")
            && NaiveDate::parse_from_str(value, DATE_FORMAT).is_err()
        {
            tracing::error!(
                "Invalid {} format. Must be in yyyyMMdd format",
                param_label(key).to_ascii_lowercase()
            );
            return false;
        }
    }
    true
}

/// Reads [`DataObject`]s through an [`ApiClient`].
#[derive(Clone)]
pub struct DataReader {
    client: ApiClient,
}

impl DataReader {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Reads all records of `object`.
    ///
    /// Invalid parameters and empty results both produce `Ok(vec![])`.
    pub async fn read(
        &self,
        object: DataObject,
        params: &RequestParameters,
        cancel: &CancellationToken,
    ) -> Result<Vec<Value>, ReaderError> {
        if !validate_params(object, params) {
            return Ok(Vec::new());
        }
        // validated above, so the lookups below never fall back
        let p = |key: &str| params.get_str(key).unwrap_or_default();
        let db = p("databaseToken");
        let client = &self.client;

        let result = match object {
            DataObject::ContractCostDistribution => {
                let subject = format!("contract {}", p("contractId"));
                log_start(object, &subject);
                let resp = client
                    .get_contract_cost_distribution(db, p("contractId"), cancel)
                    .await?;
                list_records(object, &subject, resp)
            }
            DataObject::Contracts => {
                let subject = format!("project {}", p("projectId"));
                log_start(object, &subject);
                let resp = client.get_contracts(db, p("projectId"), cancel).await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("projectId", p("projectId"))]))
            }
            DataObject::Pco => {
                let subject = format!("PCO {}", p("pcoId"));
                log_start(object, &subject);
                let resp = client.get_pco(db, p("pcoId"), cancel).await?;
                single_record(object, &subject, resp)
            }
            DataObject::Pcos => {
                let subject = format!("contract {}", p("contractId"));
                log_start(object, &subject);
                let resp = client.get_pcos(db, p("contractId"), cancel).await?;
                list_records(object, &subject, resp)
            }
            DataObject::ContractQuoteLabels => {
                let subject = format!("contract {}", p("contractId"));
                log_start(object, &subject);
                let resp = client
                    .get_contract_quote_labels(db, p("contractId"), cancel)
                    .await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("contractId", p("contractId"))]))
            }
            DataObject::ContractStatuses => {
                let subject = format!("contract {}", p("contractId"));
                log_start(object, &subject);
                let resp = client
                    .get_contract_statuses(db, p("contractId"), cancel)
                    .await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("contractId", p("contractId"))]))
            }
            DataObject::ContractSubcontractLabels => {
                let subject = format!("contract {}", p("contractId"));
                log_start(object, &subject);
                let resp = client
                    .get_contract_subcontract_labels(db, p("contractId"), cancel)
                    .await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("contractId", p("contractId"))]))
            }
            DataObject::FinalPrice => {
                let subject = format!("bid summary {}", p("bidSummaryId"));
                log_start(object, &subject);
                let resp = client
                    .get_final_price(db, p("bidSummaryId"), cancel)
                    .await?;
                single_record(object, &subject, resp)
                    .map(|records| stamp(records, &[("bidSummaryId", p("bidSummaryId"))]))
            }
            DataObject::Databases => {
                let subject = "current user".to_string();
                log_start(object, &subject);
                let resp = client.get_databases(cancel).await?;
                list_records(object, &subject, resp)
            }
            DataObject::Estimates => {
                let subject = format!("project {}", p("projectId"));
                log_start(object, &subject);
                let resp = client.get_estimates(db, p("projectId"), cancel).await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("projectId", p("projectId"))]))
            }
            DataObject::Estimate => {
                let subject = format!("estimate {}", p("estimateId"));
                log_start(object, &subject);
                let resp = client.get_estimate(db, p("estimateId"), cancel).await?;
                single_record(object, &subject, resp)
            }
            DataObject::EstimatesByDueDate => {
                let (start, end) = (p("startDate"), p("endDate"));
                let subject = format!("due dates between {} and {}", start, end);
                log_start(object, &subject);
                let resp = client
                    .get_estimates_by_due_date(db, start, end, cancel)
                    .await?;
                list_records(object, &subject, resp)
                    .map(|records| stamp(records, &[("startDate", start), ("endDate", end)]))
            }
            DataObject::ExtensionItemDetailsFileSignalR => {
                let subject = format!("estimate {}", p("estimateId"));
                log_start(object, &subject);
                let resp = client
                    .get_extension_item_details_file(
                        db,
                        p("estimateId"),
                        p("connectionId"),
                        params.get_str("bidSummaryId"),
                        cancel,
                    )
                    .await?;
                single_record(object, &subject, resp)
            }
            DataObject::NotificationTest => {
                let connection_id = p("connectionId");
                let subject = format!("connection {}", connection_id);
                log_start(object, &subject);
                let resp = client.get_notification_test(connection_id, cancel).await?;
                single_record(object, &subject, resp).map(|records| {
                    records
                        .into_iter()
                        .map(|record| {
                            serde_json::json!({
                                "connectionId": connection_id,
                                "fileUrl": record.get("fileUrl").cloned().unwrap_or(Value::Null),
                            })
                        })
                        .collect()
                })
            }
            DataObject::Projects => {
                let subject = format!("database token {}", db);
                log_start(object, &subject);
                let resp = client.get_projects(db, cancel).await?;
                list_records(object, &subject, resp)
            }
            DataObject::Project => {
                let subject = format!("project {}", p("id"));
                log_start(object, &subject);
                let resp = client.get_project(db, p("id"), cancel).await?;
                single_record(object, &subject, resp)
            }
            DataObject::LastProjects => {
                let subject = format!("database token {}", db);
                log_start(object, &subject);
                let resp = client.get_last_projects(db, cancel).await?;
                list_records(object, &subject, resp)
            }
        };

        if let Err(e) = &result {
            tracing::error!("Error retrieving {}: {}", object.noun(), e);
        }
        result
    }
}

fn log_start(object: DataObject, subject: &str) {
    tracing::info!("Retrieving {} for {}", object.noun(), subject);
}

fn check_status<T>(object: DataObject, resp: &ApiResponse<T>) -> Result<(), ReaderError> {
    if resp.is_successful() {
        return Ok(());
    }
    tracing::error!(
        "Failed to retrieve {}. Status code: {}",
        object.noun(),
        resp.status_code()
    );
    Err(ReaderError::Status {
        object: object.noun(),
        status: resp.status_code(),
        details: resp.error_details().cloned(),
    })
}

fn list_records(
    object: DataObject,
    subject: &str,
    resp: ApiResponse<Vec<Value>>,
) -> Result<Vec<Value>, ReaderError> {
    check_status(object, &resp)?;
    let records: Vec<Value> = resp
        .into_data_or_empty()
        .into_iter()
        .filter(|record| !record.is_null())
        .collect();
    if records.is_empty() {
        tracing::info!("No {} found for {}", object.noun(), subject);
    } else {
        tracing::info!(
            "Retrieved {} {} for {}",
            records.len(),
            object.noun(),
            subject
        );
    }
    Ok(records)
}

fn single_record(
    object: DataObject,
    subject: &str,
    resp: ApiResponse<Value>,
) -> Result<Vec<Value>, ReaderError> {
    check_status(object, &resp)?;
    match resp.into_data().filter(|record| !record.is_null()) {
        Some(record) => {
            tracing::info!("Successfully retrieved {} for {}", object.noun(), subject);
            Ok(vec![record])
        }
        None => {
            tracing::info!("No {} found for {}", object.noun(), subject);
            Ok(Vec::new())
        }
    }
}

/// Sets `fields` on every object record, replacing existing values.
fn stamp(mut records: Vec<Value>, fields: &[(&str, &str)]) -> Vec<Value> {
    for record in &mut records {
        if let Value::Object(map) = record {
            for (key, value) in fields {
                map.insert((*key).to_string(), Value::String((*value).to_string()));
            }
        }
    }
    records
}

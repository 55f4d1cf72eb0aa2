//! Project records returned by the `Projects`, `Project` and `LastProjects` endpoints.

use serde::{Deserialize, Serialize};

/// A project in an Accubid database.
///
/// Dates are kept as the strings the API sends; their format varies between
/// endpoints and callers only display them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(rename = "type", default)]
    pub project_type: String,
    #[serde(default)]
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_date: Option<String>,
    pub last_modified_date: Option<String>,
    #[serde(default)]
    pub managing_branch_name: String,
}

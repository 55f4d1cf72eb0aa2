//! Database records returned by the `Databases` endpoint.

use serde::{Deserialize, Serialize};

/// A customer database the authenticated user can access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    /// Token scoping every other call to this database. Stable across sessions.
    pub token: String,
    pub database_name: String,
    pub company_name: String,
}

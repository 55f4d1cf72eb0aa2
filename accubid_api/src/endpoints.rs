//! Catalog of Accubid Anywhere endpoints and their relative URL templates.
//!
//! Path identifiers are substituted in order into the path; none of them are
//! ever sent as query parameters.

use std::fmt;

/// API module an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    ChangeOrder,
    Closeout,
    Database,
    Estimate,
    Project,
    Identity,
}

impl Module {
    /// Leading path segments shared by every endpoint of the module.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Module::ChangeOrder => "anywhere/changeorder/v1",
            Module::Closeout => "anywhere/closeout/v1",
            Module::Database => "anywhere/database/v1",
            Module::Estimate => "anywhere/estimate/v1",
            Module::Project => "anywhere/project/v1",
            Module::Identity => "oauth",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Module::ChangeOrder => "ChangeOrder",
            Module::Closeout => "Closeout",
            Module::Database => "Database",
            Module::Estimate => "Estimate",
            Module::Project => "Project",
            Module::Identity => "Identity",
        };
        f.write_str(name)
    }
}

/// A single API operation together with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    ContractCostDistribution {
        database_token: &'a str,
        contract_id: &'a str,
    },
    Contracts {
        database_token: &'a str,
        project_id: &'a str,
    },
    Pco {
        database_token: &'a str,
        pco_id: &'a str,
    },
    Pcos {
        database_token: &'a str,
        contract_id: &'a str,
    },
    ContractQuoteLabels {
        database_token: &'a str,
        contract_id: &'a str,
    },
    ContractStatuses {
        database_token: &'a str,
        contract_id: &'a str,
    },
    ContractSubcontractLabels {
        database_token: &'a str,
        contract_id: &'a str,
    },
    FinalPrice {
        database_token: &'a str,
        bid_summary_id: &'a str,
    },
    Databases,
    Estimates {
        database_token: &'a str,
        project_id: &'a str,
    },
    Estimate {
        database_token: &'a str,
        estimate_id: &'a str,
    },
    /// Dates are `yyyyMMdd`.
    EstimatesByDueDate {
        database_token: &'a str,
        start_date: &'a str,
        end_date: &'a str,
    },
    /// The bid summary segment is only present when an id is supplied.
    ExtensionItemDetailsFileSignalR {
        database_token: &'a str,
        estimate_id: &'a str,
        connection_id: &'a str,
        bid_summary_id: Option<&'a str>,
    },
    NotificationTest {
        connection_id: &'a str,
    },
    Projects {
        database_token: &'a str,
    },
    Project {
        database_token: &'a str,
        project_id: &'a str,
    },
    LastProjects {
        database_token: &'a str,
    },
    /// Identity of the authenticated user.
    Me,
}

impl Endpoint<'_> {
    /// Resource name as it appears in the URL.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::ContractCostDistribution { .. } => "ContractCostDistribution",
            Endpoint::Contracts { .. } => "Contracts",
            Endpoint::Pco { .. } => "PCO",
            Endpoint::Pcos { .. } => "PCOs",
            Endpoint::ContractQuoteLabels { .. } => "ContractQuoteLabels",
            Endpoint::ContractStatuses { .. } => "ContractStatuses",
            Endpoint::ContractSubcontractLabels { .. } => "ContractSubcontractLabels",
            Endpoint::FinalPrice { .. } => "FinalPrice",
            Endpoint::Databases => "Databases",
            Endpoint::Estimates { .. } => "Estimates",
            Endpoint::Estimate { .. } => "Estimate",
            Endpoint::EstimatesByDueDate { .. } => "EstimatesByDueDate",
            Endpoint::ExtensionItemDetailsFileSignalR { .. } => "ExtensionItemDetailsFileSignalR",
            Endpoint::NotificationTest { .. } => "NotificationTest",
            Endpoint::Projects { .. } => "Projects",
            Endpoint::Project { .. } => "Project",
            Endpoint::LastProjects { .. } => "LastProjects",
            Endpoint::Me => "me",
        }
    }

    pub fn module(&self) -> Module {
        match self {
            Endpoint::ContractCostDistribution { .. }
            | Endpoint::Contracts { .. }
            | Endpoint::Pco { .. }
            | Endpoint::Pcos { .. }
            | Endpoint::ContractQuoteLabels { .. }
            | Endpoint::ContractStatuses { .. }
            | Endpoint::ContractSubcontractLabels { .. } => Module::ChangeOrder,
            Endpoint::FinalPrice { .. } => Module::Closeout,
            Endpoint::Databases => Module::Database,
            Endpoint::Estimates { .. }
            | Endpoint::Estimate { .. }
            | Endpoint::EstimatesByDueDate { .. }
            | Endpoint::ExtensionItemDetailsFileSignalR { .. }
            | Endpoint::NotificationTest { .. } => Module::Estimate,
            Endpoint::Projects { .. } | Endpoint::Project { .. } | Endpoint::LastProjects { .. } => {
                Module::Project
            }
            Endpoint::Me => Module::Identity,
        }
    }

    /// Path parameters in substitution order.
    pub fn path_params(&self) -> Vec<&str> {
        match *self {
            Endpoint::ContractCostDistribution {
                database_token,
                contract_id,
            }
            | Endpoint::Pcos {
                database_token,
                contract_id,
            }
            | Endpoint::ContractQuoteLabels {
                database_token,
                contract_id,
            }
            | Endpoint::ContractStatuses {
                database_token,
                contract_id,
            }
            | Endpoint::ContractSubcontractLabels {
                database_token,
                contract_id,
            } => vec![database_token, contract_id],
            Endpoint::Contracts {
                database_token,
                project_id,
            }
            | Endpoint::Estimates {
                database_token,
                project_id,
            }
            | Endpoint::Project {
                database_token,
                project_id,
            } => vec![database_token, project_id],
            Endpoint::Pco {
                database_token,
                pco_id,
            } => vec![database_token, pco_id],
            Endpoint::FinalPrice {
                database_token,
                bid_summary_id,
            } => vec![database_token, bid_summary_id],
            Endpoint::Estimate {
                database_token,
                estimate_id,
            } => vec![database_token, estimate_id],
            Endpoint::EstimatesByDueDate {
                database_token,
                start_date,
                end_date,
            } => vec![database_token, start_date, end_date],
            Endpoint::ExtensionItemDetailsFileSignalR {
                database_token,
                estimate_id,
                connection_id,
                bid_summary_id,
            } => match bid_summary_id.filter(|id| !id.is_empty()) {
                Some(bid_summary_id) => {
                    vec![database_token, estimate_id, bid_summary_id, connection_id]
                }
                None => vec![database_token, estimate_id, connection_id],
            },
            Endpoint::NotificationTest { connection_id } => vec![connection_id],
            Endpoint::Projects { database_token } | Endpoint::LastProjects { database_token } => {
                vec![database_token]
            }
            Endpoint::Databases | Endpoint::Me => Vec::new(),
        }
    }

    /// Relative URL, without a leading slash.
    pub fn path(&self) -> String {
        let mut path = format!("{}/{}", self.module().path_prefix(), self.name());
        for param in self.path_params() {
            path.push('/');
            path.push_str(param);
        }
        path
    }
}

impl fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

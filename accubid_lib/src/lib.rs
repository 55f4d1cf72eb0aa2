//! Library layer for the Accubid connector: configuration and data readers.
//!
//! Wraps the `accubid_api` crate with TOML configuration, credential
//! selection, and one reader per readable Accubid object.

pub mod config;
pub mod error;
pub mod readers;

pub use accubid_api;
pub use accubid_api::types;
pub use accubid_api::{
    ApiClient, ApiResponse, CancellationToken, ConnectionTestResult, ConnectionTester,
    Environment, ResponseStatus,
};

pub use config::{AuthConfig, ConnectorConfig};
pub use error::{ConnectorError, ReaderError};
pub use readers::{DataObject, DataReader, RequestParameters};

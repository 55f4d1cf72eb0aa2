//! Error types for the library layer.

use accubid_api::ErrorDetails;

/// Errors produced while configuring and building the connector.
#[derive(thiserror::Error, Debug)]
pub enum ConnectorError {
    /// An error from the underlying API client.
    #[error("API error: {0}")]
    Api(#[from] accubid_api::Error),
    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid TOML for [`crate::ConnectorConfig`].
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors produced by a data reader.
///
/// Missing or malformed request parameters are not errors: the reader logs
/// them and yields no records.
#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    /// The API answered with a non-2xx status after all retries.
    #[error("Failed to retrieve {object}. API StatusCode: {status}")]
    Status {
        object: &'static str,
        status: u16,
        details: Option<ErrorDetails>,
    },
    /// The request could not be completed at all.
    #[error(transparent)]
    Api(#[from] accubid_api::Error),
}

impl ReaderError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Api(e) => e.status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConnectorError::Config("No connection environment selected".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: No connection environment selected"
        );
    }

    #[test]
    fn status_error_display() {
        let err = ReaderError::Status {
            object: "quote labels",
            status: 404,
            details: None,
        };
        assert_eq!(
            err.to_string(),
            "Failed to retrieve quote labels. API StatusCode: 404"
        );
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn api_error_converts() {
        let err: ConnectorError = accubid_api::Error::Cancelled.into();
        assert!(matches!(err, ConnectorError::Api(accubid_api::Error::Cancelled)));
    }
}

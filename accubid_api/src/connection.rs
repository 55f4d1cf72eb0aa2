//! End-to-end credential check against the identity endpoint.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::response::ResponseStatus;
use crate::ApiClient;

/// Outcome of a connection test. Never an error: failures are described here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
    pub status_code: u16,
}

impl ResponseStatus for ConnectionTestResult {
    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn is_successful(&self) -> bool {
        self.success
    }
}

/// Validates credentials by calling `oauth/me`.
#[derive(Clone)]
pub struct ConnectionTester {
    client: ApiClient,
}

impl ConnectionTester {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Runs the test. Transport, auth and cancellation failures are folded
    /// into a `status_code = 500` result rather than returned as errors.
    pub async fn test_connection(&self, cancel: &CancellationToken) -> ConnectionTestResult {
        match self.client.get_me::<serde_json::Value>(cancel).await {
            Ok(response) if response.is_successful() => ConnectionTestResult {
                success: true,
                message: "Successfully connected to Accubid API".to_string(),
                status_code: response.status_code(),
            },
            Ok(response) => {
                tracing::warn!(
                    "Connection test failed with status code {}",
                    response.status_code()
                );
                ConnectionTestResult {
                    success: false,
                    message: format!(
                        "Failed to connect to Accubid API. Status code: {}",
                        response.status_code()
                    ),
                    status_code: response.status_code(),
                }
            }
            Err(e) => {
                tracing::error!("Error testing connection to Accubid API: {}", e);
                ConnectionTestResult {
                    success: false,
                    message: format!("Error connecting to Accubid API: {}", e),
                    status_code: 500,
                }
            }
        }
    }
}

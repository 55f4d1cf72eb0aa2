//! Client settings and deployment environments.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{RetryPolicy, DEFAULT_MAX_RETRIES};
use crate::Error;

/// Transport settings fixed at client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiClientConfig {
    /// Retries after the first attempt for failed requests.
    pub max_retries: u32,
    /// Per-attempt request timeout.
    pub timeout_seconds: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_seconds: 30,
        }
    }
}

impl ApiClientConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Accubid Anywhere deployment the connector talks to.
///
/// Deserialization goes through [`FromStr`], so config files accept the same
/// spellings as the environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Environment {
    Production,
    Test,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://cloud.api.trimble.com",
            Environment::Test => "https://cloud.test.api.trimble.com",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(Error::Config(format!(
                "Invalid connection environment selected: {:?}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Test => write!(f, "test"),
        }
    }
}

//! Typed, resilient client for the Accubid Anywhere REST API.
//!
//! Requests flow through bearer-token injection ([`auth`]), bounded retry
//! with jittered exponential backoff ([`retry`]) and end up as a typed
//! [`ApiResponse`] envelope. [`ApiClient`] exposes one method per catalog
//! [`Endpoint`] on top of generic GET, POST and paginated-list primitives.

pub mod auth;
mod client;
mod config;
mod connection;
pub mod endpoints;
mod errors;
pub mod response;
pub mod retry;
pub mod types;

pub use self::auth::{ClientAuthentication, OAuth2CodeFlow, OAuth2Settings, StaticToken, TokenProvider};
pub use self::client::{build_query, ApiClient};
pub use self::config::{ApiClientConfig, Environment};
pub use self::connection::{ConnectionTestResult, ConnectionTester};
pub use self::endpoints::{Endpoint, Module};
pub use self::errors::Error;
pub use self::response::{ApiResponse, ErrorDetails, ResponseStatus};
pub use self::retry::{RetryOutcome, RetryPolicy};
pub use tokio_util::sync::CancellationToken;

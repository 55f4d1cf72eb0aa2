//! Typed response envelope returned by every [`ApiClient`](crate::ApiClient) call.
//!
//! Success is classified purely from the HTTP status category. A successful
//! envelope carries the decoded payload (or `None` when the body was empty or
//! could not be decoded); a failed one keeps the raw body and a best-effort
//! parse of the API's structured error.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Structured error body returned by the Accubid API on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(alias = "Code")]
    pub code: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
    #[serde(alias = "Details")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetails {
    /// Parses an error body, returning `None` when it is empty or not a JSON object.
    pub fn parse(body: &[u8]) -> Option<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        serde_json::from_slice(body).ok()
    }
}

/// Returns true for any status in the 2xx range.
pub fn is_success_status(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}

/// Status view shared by every envelope regardless of its payload type.
pub trait ResponseStatus {
    fn status_code(&self) -> u16;

    fn is_successful(&self) -> bool {
        is_success_status(self.status_code())
    }

    fn has_status(&self, status: StatusCode) -> bool {
        self.status_code() == status.as_u16()
    }
}

/// Body of an [`ApiResponse`], split by outcome.
#[derive(Debug, Clone)]
pub enum ResponseBody<T> {
    Success {
        data: Option<T>,
    },
    Failure {
        raw_body: Vec<u8>,
        error_details: Option<ErrorDetails>,
    },
}

/// Result of a single logical API call.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    status_code: u16,
    body: ResponseBody<T>,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Builds an envelope from a status code and the complete response body.
    pub fn from_parts(status_code: u16, body: &[u8]) -> Self {
        let body = if is_success_status(status_code) {
            ResponseBody::Success {
                data: decode_body(body),
            }
        } else {
            ResponseBody::Failure {
                raw_body: body.to_vec(),
                error_details: ErrorDetails::parse(body),
            }
        };
        Self { status_code, body }
    }

    /// Consumes a transport response, reading its body exactly once.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, Error> {
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::Transport(e)
        })?;
        Ok(Self::from_parts(status, &body))
    }
}

impl<T> ApiResponse<T> {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn is_successful(&self) -> bool {
        is_success_status(self.status_code)
    }

    pub fn has_status(&self, status: StatusCode) -> bool {
        self.status_code == status.as_u16()
    }

    pub fn body(&self) -> &ResponseBody<T> {
        &self.body
    }

    /// Decoded payload. `None` on failure, and on success when there was no content.
    pub fn data(&self) -> Option<&T> {
        match &self.body {
            ResponseBody::Success { data } => data.as_ref(),
            ResponseBody::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self.body {
            ResponseBody::Success { data } => data,
            ResponseBody::Failure { .. } => None,
        }
    }

    /// Raw body of a failed response, kept for diagnostics.
    pub fn raw_error_body(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Failure { raw_body, .. } => Some(raw_body.as_slice()),
            ResponseBody::Success { .. } => None,
        }
    }

    pub fn error_details(&self) -> Option<&ErrorDetails> {
        match &self.body {
            ResponseBody::Failure { error_details, .. } => error_details.as_ref(),
            ResponseBody::Success { .. } => None,
        }
    }

    /// Returns [`Error::Api`] when the response was not successful.
    pub fn ensure_success(&self) -> Result<(), Error> {
        if self.is_successful() {
            return Ok(());
        }
        let details = self.error_details().cloned();
        let message = details
            .as_ref()
            .and_then(|d| d.message.clone())
            .unwrap_or_else(|| format!("Request failed with status code {}", self.status_code));
        Err(Error::Api {
            status: self.status_code,
            message,
            details,
        })
    }

    /// Unwraps the payload, failing on a non-2xx status or a missing payload.
    pub fn into_data_or_err(self) -> Result<T, Error> {
        self.ensure_success()?;
        self.into_data().ok_or_else(|| Error::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: "Response data was null".to_string(),
            details: None,
        })
    }

    /// Payload on success, `default` otherwise.
    pub fn data_or_default(self, default: T) -> T {
        self.into_data().unwrap_or(default)
    }

    /// Transforms the payload while keeping status and error information.
    pub fn map<U, F>(self, f: F) -> ApiResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        let body = match self.body {
            ResponseBody::Success { data } => ResponseBody::Success { data: data.map(f) },
            ResponseBody::Failure {
                raw_body,
                error_details,
            } => ResponseBody::Failure {
                raw_body,
                error_details,
            },
        };
        ApiResponse {
            status_code: self.status_code,
            body,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List payload, or an empty list on failure or missing content.
    pub fn into_data_or_empty(self) -> Vec<T> {
        self.into_data().unwrap_or_default()
    }
}

impl<T> ResponseStatus for ApiResponse<T> {
    fn status_code(&self) -> u16 {
        self.status_code
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Option<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<T>(body) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::warn!(
                "Failed to parse response body: {} | body: {}",
                e,
                truncate_body(&String::from_utf8_lossy(body))
            );
            None
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        token: String,
    }

    #[test]
    fn success_only_for_2xx() {
        for code in 100u16..600 {
            let resp = ApiResponse::<serde_json::Value>::from_parts(code, b"");
            assert_eq!(resp.is_successful(), (200..=299).contains(&code), "{}", code);
        }
    }

    #[test]
    fn success_decodes_payload() {
        let resp = ApiResponse::<Database>::from_parts(200, br#"{"token":"abc"}"#);
        assert_eq!(
            resp.data(),
            Some(&Database {
                token: "abc".to_string()
            })
        );
        assert!(resp.raw_error_body().is_none());
        assert!(resp.error_details().is_none());
    }

    #[test]
    fn empty_success_body_is_no_content() {
        let resp = ApiResponse::<Database>::from_parts(204, b"");
        assert!(resp.is_successful());
        assert!(resp.data().is_none());
    }

    #[test]
    fn undecodable_success_body_is_no_content() {
        let resp = ApiResponse::<Database>::from_parts(200, b"{not valid json}");
        assert!(resp.is_successful());
        assert!(resp.data().is_none());
        assert!(resp.ensure_success().is_ok());
    }

    #[test]
    fn failure_keeps_raw_body_and_parses_details() {
        let body = br#"{"code":"E42","message":"Database token not found","details":{"field":"token"}}"#;
        let resp = ApiResponse::<Database>::from_parts(404, body);
        assert!(!resp.is_successful());
        assert!(resp.has_status(StatusCode::NOT_FOUND));
        assert_eq!(resp.raw_error_body(), Some(&body[..]));
        let details = resp.error_details().unwrap();
        assert_eq!(details.code.as_deref(), Some("E42"));
        assert_eq!(details.message.as_deref(), Some("Database token not found"));
        assert_eq!(details.details, Some(serde_json::json!({"field": "token"})));
    }

    #[test]
    fn pascal_case_error_details_are_accepted() {
        let details = ErrorDetails::parse(br#"{"Code":"X","Message":"nope"}"#).unwrap();
        assert_eq!(details.code.as_deref(), Some("X"));
        assert_eq!(details.message.as_deref(), Some("nope"));
    }

    #[test]
    fn unparseable_error_body_leaves_details_empty() {
        let resp = ApiResponse::<Database>::from_parts(500, b"Internal Server Error");
        assert!(resp.error_details().is_none());
        assert_eq!(resp.raw_error_body(), Some(&b"Internal Server Error"[..]));
    }

    #[test]
    fn into_data_or_err_uses_parsed_message() {
        let resp = ApiResponse::<Database>::from_parts(400, br#"{"message":"bad token"}"#);
        match resp.into_data_or_err() {
            Err(Error::Api {
                status, message, ..
            }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad token");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn into_data_or_err_falls_back_to_status_message() {
        let resp = ApiResponse::<Database>::from_parts(503, b"");
        let err = resp.into_data_or_err().unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status code 503");
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn into_data_or_err_rejects_missing_payload() {
        let resp = ApiResponse::<Database>::from_parts(200, b"");
        let err = resp.into_data_or_err().unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.to_string(), "Response data was null");
    }

    #[test]
    fn list_helpers() {
        let ok = ApiResponse::<Vec<u32>>::from_parts(200, b"[1,2,3]");
        assert_eq!(ok.into_data_or_empty(), vec![1, 2, 3]);

        let failed = ApiResponse::<Vec<u32>>::from_parts(500, b"[1]");
        assert!(failed.into_data_or_empty().is_empty());

        let failed = ApiResponse::<u32>::from_parts(401, b"");
        assert_eq!(failed.data_or_default(7), 7);
    }

    #[test]
    fn map_preserves_failure() {
        let resp = ApiResponse::<u32>::from_parts(418, br#"{"code":"teapot"}"#).map(|n| n * 2);
        assert_eq!(resp.status_code(), 418);
        assert_eq!(
            resp.error_details().and_then(|d| d.code.as_deref()),
            Some("teapot")
        );
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(1500);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("...[truncated]"));
    }
}

//! Bounded retry with exponential backoff and jitter.
//!
//! Every attempt that ends in a non-2xx response or a transport error is
//! retried after `2^attempt` seconds scaled by a random factor in
//! `[0.5, 1.0)`, up to `max_retries` extra attempts. The two failure channels
//! stay distinct once retries run out: a failing response is handed back as
//! [`RetryOutcome::FailedResponse`], a transport error as
//! [`RetryOutcome::Exhausted`]. Cancellation aborts both the in-flight
//! attempt and any pending backoff sleep.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::response::is_success_status;

/// Retry count used when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Anything an attempt can return that carries an HTTP status.
pub trait AttemptStatus {
    fn status_code(&self) -> u16;
}

impl AttemptStatus for reqwest::Response {
    fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<R, E> {
    /// An attempt returned a 2xx response.
    Success(R),
    /// Every attempt returned a non-2xx response; this is the last one.
    FailedResponse(R),
    /// Every attempt failed at the transport level; this is the last error.
    Exhausted(E),
    /// The cancellation token fired before the operation finished.
    Cancelled,
}

/// Immutable retry settings, fixed when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Runs `op` until it succeeds, retries run out, or `cancel` fires.
    ///
    /// `op` receives the 0-based attempt number.
    pub async fn execute<R, E, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> RetryOutcome<R, E>
    where
        R: AttemptStatus,
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return RetryOutcome::Cancelled;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return RetryOutcome::Cancelled,
                result = op(attempt) => result,
            };

            match result {
                Ok(resp) if is_success_status(resp.status_code()) => {
                    if attempt > 0 {
                        tracing::info!("Request succeeded after {} attempts", attempt + 1);
                    }
                    return RetryOutcome::Success(resp);
                }
                Ok(resp) => {
                    if attempt >= self.max_retries {
                        tracing::error!(
                            "Request failed permanently after {} attempts with status code {}",
                            max_attempts,
                            resp.status_code()
                        );
                        return RetryOutcome::FailedResponse(resp);
                    }
                    tracing::warn!(
                        "Request failed with status code {}. Attempt {} of {}",
                        resp.status_code(),
                        attempt + 1,
                        max_attempts
                    );
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        tracing::error!(
                            "Request failed permanently after {} attempts: {}",
                            max_attempts,
                            e
                        );
                        return RetryOutcome::Exhausted(e);
                    }
                    tracing::warn!(
                        "Request failed: {}. Attempt {} of {}",
                        e,
                        attempt + 1,
                        max_attempts
                    );
                }
            }

            let delay = backoff_delay(attempt);
            tracing::debug!("Retrying in {:.2}s", delay.as_secs_f64());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return RetryOutcome::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

/// Backoff before the retry that follows `attempt`, with fresh jitter.
pub fn backoff_delay(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.5..1.0);
    scaled_delay(attempt, jitter)
}

/// `2^attempt` seconds scaled by `jitter`.
pub fn scaled_delay(attempt: u32, jitter: f64) -> Duration {
    let base = 2f64.powi(attempt.min(30) as i32);
    Duration::from_secs_f64(base * jitter)
}

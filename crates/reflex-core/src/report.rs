//! Delivery of the final results to the Session/Results service.
//!
//! Wire contract: `POST /finish/{session_id}/` with body
//! `{"hits": int, "combos": int, "duration": float}` and the anti-forgery
//! token in `X-CSRFToken`. Success is a JSON body carrying `redirect_url`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hit::ScoreState;
use crate::session::SessionId;

/// Snapshot of the score at game over. Sent exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub hits: u32,
    pub combos: u32,
    /// True elapsed seconds, not the clamped countdown.
    pub duration: f64,
}

impl ResultPayload {
    pub fn snapshot(score: &ScoreState, elapsed_secs: f64) -> Self {
        Self {
            hits: score.hits,
            combos: score.combos,
            duration: elapsed_secs,
        }
    }
}

/// Path of the finish endpoint for a session.
pub fn finish_path(session_id: &SessionId) -> String {
    format!("/finish/{session_id}/")
}

/// A fully-formed finish request, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRequest {
    pub path: String,
    pub csrf_token: Option<String>,
    pub payload: ResultPayload,
}

impl FinishRequest {
    pub fn body(&self) -> Result<String, ReportError> {
        serde_json::to_string(&self.payload)
            .map_err(|e| ReportError::Transport(format!("encode payload: {e}")))
    }
}

/// Raw answer from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct FinishResponse {
    redirect_url: Option<String>,
}

impl ServiceResponse {
    /// Extract the post-game redirect. 5xx answers are reported as
    /// [`ReportError::Status`] so they can be retried.
    pub fn redirect_target(&self) -> Result<String, ReportError> {
        if self.status >= 500 {
            return Err(ReportError::Status(self.status));
        }
        let parsed: FinishResponse = serde_json::from_str(&self.body)
            .map_err(|e| ReportError::MalformedResponse(format!("invalid JSON: {e}")))?;
        match parsed.redirect_url {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(ReportError::MalformedResponse(
                "response has no redirect_url".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The request could not be completed.
    Transport(String),
    /// The service answered with a server error.
    Status(u16),
    /// The body is not JSON or carries no usable redirect.
    MalformedResponse(String),
}

impl ReportError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status(_))
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(m) => write!(f, "transport failure: {m}"),
            Self::Status(code) => write!(f, "results service returned HTTP {code}"),
            Self::MalformedResponse(m) => write!(f, "malformed response: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

/// Transport to the results service.
///
/// Implementations are single-shot; retries are driven by
/// [`SessionReporter`].
pub trait ResultsService {
    fn submit(
        &self,
        request: &FinishRequest,
    ) -> impl Future<Output = Result<ServiceResponse, ReportError>>;

    /// Wait between attempts. Defaults to not waiting.
    fn backoff(&self, delay: Duration) -> impl Future<Output = ()> {
        let _ = delay;
        std::future::ready(())
    }
}

/// Bounded exponential backoff for failed deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total delivery attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 250,
            multiplier: 2.0,
            max_backoff_ms: 4000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(30) as i32;
        let ms = self.initial_backoff_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        Duration::from_millis(ms.min(self.max_backoff_ms as f64) as u64)
    }
}

/// What the page should do once reporting is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Navigate(String),
    /// Fallback after any failure. Discards the just-played result from the
    /// player's view.
    Reload,
}

/// Hands the final results to the service. Consumed by [`report`], so a
/// session can submit at most once.
///
/// [`report`]: SessionReporter::report
#[derive(Debug, Clone)]
pub struct SessionReporter {
    session_id: SessionId,
    csrf_token: Option<String>,
    policy: RetryPolicy,
}

impl SessionReporter {
    pub fn new(session_id: SessionId, csrf_token: Option<String>, policy: RetryPolicy) -> Self {
        Self {
            session_id,
            csrf_token,
            policy,
        }
    }

    pub fn request(&self, payload: ResultPayload) -> FinishRequest {
        FinishRequest {
            path: finish_path(&self.session_id),
            csrf_token: self.csrf_token.clone(),
            payload,
        }
    }

    pub async fn report<S: ResultsService>(self, service: &S, payload: ResultPayload) -> ReportOutcome {
        let request = self.request(payload);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = match service.submit(&request).await {
                Ok(response) => response.redirect_target(),
                Err(e) => Err(e),
            };
            match result {
                Ok(url) => {
                    tracing::info!(
                        session = %self.session_id,
                        hits = payload.hits,
                        combos = payload.combos,
                        redirect = %url,
                        "Results delivered"
                    );
                    return ReportOutcome::Navigate(url);
                },
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        session = %self.session_id,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Results delivery failed, retrying"
                    );
                    service.backoff(delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    tracing::warn!(
                        session = %self.session_id,
                        attempt,
                        error = %e,
                        "Results delivery failed, falling back to reload"
                    );
                    return ReportOutcome::Reload;
                },
            }
        }
    }
}

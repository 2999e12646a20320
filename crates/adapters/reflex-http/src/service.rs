use std::time::Duration;

use reflex_core::csrf::CSRF_HEADER;
use reflex_core::report::{FinishRequest, ReportError, ResultsService, ServiceResponse};

use crate::config::HttpServiceConfig;

/// Results service reached over HTTP with `reqwest`.
pub struct HttpResultsService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpResultsService {
    pub fn new(config: HttpServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Absolute URL for a finish path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(context: &str, err: reqwest::Error) -> ReportError {
    ReportError::Transport(format!("{context}: {err}"))
}

impl ResultsService for HttpResultsService {
    async fn submit(&self, request: &FinishRequest) -> Result<ServiceResponse, ReportError> {
        let url = self.url_for(&request.path);
        let mut builder = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request.body()?);
        if let Some(token) = &request.csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }

        let resp = builder.send().await.map_err(|e| transport("send", e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| transport("body", e))?;
        tracing::debug!(url, status, "Finish request answered");
        Ok(ServiceResponse { status, body })
    }

    async fn backoff(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

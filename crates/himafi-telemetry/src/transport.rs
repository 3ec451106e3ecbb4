//! HTTP delivery for error batches, log lines, and analytics events

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::TelemetryConfig;
use crate::events::EventPayload;
use crate::records::{ErrorRecord, LogRecord};

/// Delivery failure. Swallowed inside the pipeline; callers of the logging
/// and tracking APIs never see it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(u16),
}

/// Where telemetry payloads go. Production uses [`HttpTransport`]; tests
/// inject in-memory fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver a FIFO batch of queued error records as one payload.
    async fn send_error_batch(&self, errors: &[ErrorRecord]) -> Result<(), TransportError>;

    /// Deliver a single info/warn log line.
    async fn send_log(&self, record: &LogRecord) -> Result<(), TransportError>;

    /// Deliver a single enriched analytics event.
    async fn send_event(&self, event: &EventPayload) -> Result<(), TransportError>;
}

/// Transport posting JSON to the site's collection endpoints.
///
/// The logs endpoint accepts two shapes: `{"errors": [...]}` for batched
/// error flushes and a bare record object for single log lines.
pub struct HttpTransport {
    client: Client,
    logs_url: String,
    analytics_url: String,
}

impl HttpTransport {
    pub fn new(config: &TelemetryConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            client,
            logs_url: config.logs_url.clone(),
            analytics_url: config.analytics_url.clone(),
        }
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<(), TransportError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_error_batch(&self, errors: &[ErrorRecord]) -> Result<(), TransportError> {
        self.post_json(&self.logs_url, &serde_json::json!({ "errors": errors }))
            .await
    }

    async fn send_log(&self, record: &LogRecord) -> Result<(), TransportError> {
        self.post_json(&self.logs_url, record).await
    }

    async fn send_event(&self, event: &EventPayload) -> Result<(), TransportError> {
        self.post_json(&self.analytics_url, event).await
    }
}

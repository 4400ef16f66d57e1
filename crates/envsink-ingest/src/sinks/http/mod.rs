//! HTTP sink
//!
//! Posts each batch to `{api_url}/telemetry` as a JSON array grouped by
//! measurement type. Only the send step is retried: 5xx responses, timeouts
//! and connection failures back off exponentially. Client errors are logged
//! and dropped. A batch that exhausts its retries is logged and dropped too,
//! so delivery problems never stop the pipeline.

pub mod config;
pub mod payload;
pub mod retry;

pub use config::{parse_sensor_names, HttpSinkConfig};
pub use payload::{build_payload, DataPoint, SensorId, TelemetryPayload, TelemetryType};
pub use retry::RetryPolicy;

use super::Sink;
use crate::batcher::Batch;
use crate::error::{HttpSendError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct HttpSink {
    client: Client,
    config: HttpSinkConfig,
    endpoint: String,
    retry: RetryPolicy,
}

impl HttpSink {
    /// Build the sink and its HTTP client
    pub fn new(config: HttpSinkConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("envsink/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            retry: RetryPolicy::new(config.max_retries, config.initial_backoff),
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One POST; `Err` only for outcomes worth retrying
    async fn send_once(
        &self,
        payload: &[TelemetryPayload],
        attempt: u32,
    ) -> std::result::Result<(), HttpSendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if status == StatusCode::CREATED {
            info!(sink = "http", attempt, "Telemetry accepted");
            self.log_body(response).await;
            return Ok(());
        }

        if status.is_server_error() {
            self.log_body(response).await;
            return Err(HttpSendError::Server {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            warn!(
                sink = "http",
                status = status.as_u16(),
                body = %text,
                "Telemetry rejected by server, dropping batch"
            );
        } else {
            warn!(
                sink = "http",
                status = status.as_u16(),
                body = %text,
                "Unexpected response status, dropping batch"
            );
        }
        Ok(())
    }

    fn classify(&self, e: reqwest::Error) -> HttpSendError {
        if e.is_timeout() {
            HttpSendError::Timeout {
                url: self.endpoint.clone(),
                timeout: self.config.timeout,
            }
        } else {
            HttpSendError::Transport {
                url: self.endpoint.clone(),
                source: e,
            }
        }
    }

    async fn log_body(&self, response: reqwest::Response) {
        if self.config.debug {
            let text = response.text().await.unwrap_or_default();
            debug!(sink = "http", body = %text, "Response body");
        }
    }
}

#[async_trait]
impl Sink for HttpSink {
    fn name(&self) -> &'static str {
        "http"
    }

    fn desired_batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn desired_max_batch_latency(&self) -> Duration {
        self.config.batch_latency
    }

    async fn consume(&mut self, batch: Batch) -> Result<()> {
        let built = build_payload(&batch, &self.config.sensor_names);

        for (sequence, e) in &built.rejected {
            warn!(
                sink = "http",
                sequence,
                error = %e,
                "Skipping record with invalid MAC address"
            );
        }

        if built.payload.is_empty() {
            debug!(sink = "http", records = batch.len(), "Nothing to send");
            return Ok(());
        }

        if self.config.debug {
            let body = serde_json::to_string(&built.payload)?;
            debug!(sink = "http", payload = %body, "Request payload");
        }

        let this = &*self;
        let payload = built.payload.as_slice();
        let outcome = this
            .retry
            .run(move |attempt| this.send_once(payload, attempt))
            .await;

        if let Err(e) = outcome {
            error!(
                sink = "http",
                records = built.accepted,
                attempts = self.retry.max_attempts(),
                error = %e,
                "Giving up on batch after retries"
            );
        }

        Ok(())
    }
}

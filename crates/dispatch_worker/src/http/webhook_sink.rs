use anyhow::Context;
use async_trait::async_trait;
use common::{DomainError, DomainResult, RowSink};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct WebhookSinkConfig {
    /// Sink endpoint the batch POST goes to
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebhookSinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP sink client: one batch, one POST of a JSON array.
///
/// Success is any 2xx. A non-2xx response captures the body text into the
/// error; a 2xx body is advisory and only logged.
pub struct WebhookSink {
    client: reqwest::Client,
    config: WebhookSinkConfig,
}

impl WebhookSink {
    pub fn new(config: WebhookSinkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build webhook sink http client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RowSink for WebhookSink {
    async fn post_rows(&self, rows: &[serde_json::Value]) -> DomainResult<()> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&rows)
            .send()
            .await
            .context("failed to post batch to sink")?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DomainError::SinkRejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            status = status.as_u16(),
            response_body = %body,
            row_count = rows.len(),
            "sink accepted batch"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WebhookSinkConfig::default();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_sink_construction() {
        let sink = WebhookSink::new(WebhookSinkConfig {
            url: "http://sink.example/hook".to_string(),
            timeout_secs: 5,
        });
        assert!(sink.is_ok());
    }
}

use common::{DomainError, DomainResult, RowSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Total attempts against the sink, including the first one
    pub max_attempts: u32,
    /// Base delay for linear backoff; attempt N waits N × base before N+1
    pub retry_base_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

impl DispatchConfig {
    /// Delay before the attempt following `attempt` (linear: 1×, 2×, …)
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * attempt
    }
}

/// What one dispatch invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Rows included in the successful POST (0 when nothing decoded)
    pub delivered: usize,
    /// Messages dropped because their body did not decode
    pub dropped: usize,
}

/// Delivers one bounded batch of queued messages to the sink as a single
/// POST.
///
/// Undecodable message bodies are dropped from the outbound batch and never
/// abort it. The POST is retried as a whole with linear backoff; once the
/// attempts are exhausted the error propagates so the queue redelivers the
/// whole original batch. Duplicate deliveries to the sink are possible and
/// are the sink's concern, not this component's.
pub struct DispatchService {
    sink: Arc<dyn RowSink>,
    config: DispatchConfig,
}

impl DispatchService {
    pub fn new(sink: Arc<dyn RowSink>, config: DispatchConfig) -> Self {
        Self { sink, config }
    }

    #[instrument(skip(self, payloads), fields(message_count = payloads.len()))]
    pub async fn dispatch(&self, payloads: &[Vec<u8>]) -> DomainResult<DispatchOutcome> {
        let mut rows = Vec::with_capacity(payloads.len());
        let mut dropped = 0;

        for (idx, payload) in payloads.iter().enumerate() {
            match serde_json::from_slice::<serde_json::Value>(payload) {
                Ok(value) => rows.push(value),
                Err(e) => {
                    warn!(
                        error = %e,
                        index = idx,
                        "dropping message with undecodable body"
                    );
                    dropped += 1;
                }
            }
        }

        if rows.is_empty() {
            info!(dropped, "no decodable messages in batch, nothing to send");
            return Ok(DispatchOutcome {
                delivered: 0,
                dropped,
            });
        }

        let delivered = rows.len();
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_attempts {
            match self.sink.post_rows(&rows).await {
                Ok(()) => {
                    info!(
                        delivered,
                        dropped, attempt, "delivered batch to sink"
                    );
                    return Ok(DispatchOutcome { delivered, dropped });
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.config.max_attempts {
                        let delay = self.config.retry_delay(attempt);
                        warn!(
                            error = %e,
                            attempt,
                            delay_ms = delay.as_millis(),
                            "sink attempt failed, retrying whole batch"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        debug!(error = %e, attempt, "final sink attempt failed");
                    }
                }
            }
        }

        Err(DomainError::DispatchFailed {
            attempts: self.config.max_attempts,
            reason: last_error,
        })
    }
}

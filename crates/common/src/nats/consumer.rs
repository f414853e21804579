use crate::nats::traits::{JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self, Message};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Indices into the fetched batch to acknowledge or reject.
///
/// `ack` entries are removed from the stream; `nak` entries are redelivered
/// later, optionally with a reason that is logged.
#[derive(Debug, Default)]
pub struct ProcessingResult {
    pub ack: Vec<usize>,
    pub nak: Vec<(usize, Option<String>)>,
}

/// Processes one fetched batch of messages and decides ack/nak per index
pub type BatchProcessor = Box<
    dyn Fn(&[Message]) -> Pin<Box<dyn Future<Output = Result<ProcessingResult>> + Send>>
        + Send
        + Sync,
>;

/// A NATS JetStream pull consumer that hands fetched batches to a
/// `BatchProcessor`.
///
/// The consumer fetches up to `batch_size` messages, waiting at most
/// `max_wait` for the batch to fill, so the processor sees bounded batches
/// with a bounded hold time. Delivery is at-least-once: messages are only
/// removed after an explicit ack.
pub struct NatsConsumer {
    consumer: Box<dyn PullConsumer>,
    stream_name: String,
    consumer_name: String,
    batch_size: usize,
    max_wait: Duration,
    processor: BatchProcessor,
}

impl NatsConsumer {
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        batch_wait_secs: u64,
        processor: BatchProcessor,
    ) -> Result<Self> {
        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            filter_subject = %subject_filter,
            "creating nats batch consumer"
        );

        let config = jetstream::consumer::pull::Config {
            name: Some(consumer_name.to_string()),
            durable_name: Some(consumer_name.to_string()),
            filter_subject: subject_filter.to_string(),
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            ..Default::default()
        };

        let consumer = jetstream
            .create_consumer(config, stream_name)
            .await
            .context("failed to create consumer")?;

        Ok(Self {
            consumer,
            stream_name: stream_name.to_string(),
            consumer_name: consumer_name.to_string(),
            batch_size,
            max_wait: Duration::from_secs(batch_wait_secs),
            processor,
        })
    }

    /// Run the consumer loop until cancellation
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        debug!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "starting nats batch consumer"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(
                        stream = %self.stream_name,
                        consumer = %self.consumer_name,
                        "received shutdown signal, stopping consumer"
                    );
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(
                            stream = %self.stream_name,
                            consumer = %self.consumer_name,
                            error = %e,
                            "error processing batch"
                        );
                        // Continue processing despite errors
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        debug!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "consumer stopped gracefully"
        );
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        let messages = self
            .consumer
            .fetch_messages(self.batch_size, self.max_wait)
            .await?;

        if messages.is_empty() {
            debug!("no messages in batch");
            return Ok(());
        }

        debug!(message_count = messages.len(), "received message batch");

        let result = (self.processor)(&messages).await?;

        for idx in result.ack {
            let Some(msg) = messages.get(idx) else {
                warn!(index = idx, "ack index out of range, skipping");
                continue;
            };
            if let Err(e) = msg.ack().await {
                error!(
                    subject = %msg.subject,
                    error = %e,
                    "failed to acknowledge message"
                );
            }
        }

        for (idx, reason) in result.nak {
            let Some(msg) = messages.get(idx) else {
                warn!(index = idx, "nak index out of range, skipping");
                continue;
            };
            match reason {
                Some(ref r) => warn!(subject = %msg.subject, reason = %r, "rejecting message"),
                None => warn!(subject = %msg.subject, "rejecting message"),
            }
            if let Err(e) = msg.ack_with(jetstream::AckKind::Nak(None)).await {
                error!(
                    subject = %msg.subject,
                    error = %e,
                    "failed to reject message"
                );
            }
        }

        Ok(())
    }
}

use anyhow::Context;
use async_trait::async_trait;
use common::{DispatchMessageProducer, DomainResult, JetStreamPublisher, ResultRow};
use std::sync::Arc;
use tracing::debug;

/// Publishes one dispatch message per result row to the dispatch stream.
///
/// Subject layout is `{base_subject}.{sensor_id}`; rows with a missing
/// sensor id land under `{base_subject}.unknown` so they are still
/// delivered.
pub struct NatsDispatchMessageProducer {
    publisher: Arc<dyn JetStreamPublisher>,
    base_subject: String,
}

impl NatsDispatchMessageProducer {
    pub fn new(publisher: Arc<dyn JetStreamPublisher>, base_subject: String) -> Self {
        debug!(
            base_subject = %base_subject,
            "initialized NatsDispatchMessageProducer"
        );

        Self {
            publisher,
            base_subject,
        }
    }
}

#[async_trait]
impl DispatchMessageProducer for NatsDispatchMessageProducer {
    async fn enqueue(&self, row: &ResultRow) -> DomainResult<()> {
        let payload = serde_json::to_vec(row).context("failed to encode dispatch message")?;

        let subject = format!(
            "{}.{}",
            self.base_subject,
            row.sensor_id.as_deref().unwrap_or("unknown")
        );

        self.publisher
            .publish(subject, payload.into())
            .await
            .context("failed to enqueue dispatch message")?;

        Ok(())
    }
}

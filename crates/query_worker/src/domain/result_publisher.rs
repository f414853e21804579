use common::{DispatchMessageProducer, ResultRow};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Count of rows handed to the queue vs. rows available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    pub published: usize,
    pub total: usize,
}

/// Converts result rows into individual queue messages, one per row.
///
/// Each row gets a single enqueue attempt; a failed enqueue is logged and
/// the remaining rows are still published. Delivery guarantees beyond that
/// single attempt belong to the queue collaborator.
pub struct ResultPublisher {
    producer: Arc<dyn DispatchMessageProducer>,
}

impl ResultPublisher {
    pub fn new(producer: Arc<dyn DispatchMessageProducer>) -> Self {
        Self { producer }
    }

    #[instrument(skip(self, rows), fields(total = rows.len()))]
    pub async fn publish_rows(&self, rows: &[ResultRow]) -> PublishSummary {
        let mut published = 0;

        for (idx, row) in rows.iter().enumerate() {
            match self.producer.enqueue(row).await {
                Ok(()) => published += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        index = idx,
                        sensor_id = row.sensor_id.as_deref().unwrap_or("unknown"),
                        "failed to enqueue result row, continuing"
                    );
                }
            }
        }

        let summary = PublishSummary {
            published,
            total: rows.len(),
        };

        info!(
            published = summary.published,
            total = summary.total,
            "published result rows"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MockDispatchMessageProducer;

    fn row(sensor_id: &str) -> ResultRow {
        ResultRow {
            sensor_id: Some(sensor_id.to_string()),
            temperature_celsius: Some("22.0".to_string()),
            raw_humidity: Some("40.0".to_string()),
            timestamp: Some("2025-02-10T12:00:00Z".to_string()),
            object_key: Some("key-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_publish_rows_enqueues_one_message_per_row() {
        let mut mock_producer = MockDispatchMessageProducer::new();

        mock_producer
            .expect_enqueue()
            .times(3)
            .returning(|_| Ok(()));

        let publisher = ResultPublisher::new(Arc::new(mock_producer));

        let summary = publisher
            .publish_rows(&[row("sensor-1"), row("sensor-2"), row("sensor-3")])
            .await;

        assert_eq!(summary, PublishSummary { published: 3, total: 3 });
    }

    #[tokio::test]
    async fn test_publish_rows_continues_past_enqueue_failure() {
        let mut mock_producer = MockDispatchMessageProducer::new();

        mock_producer
            .expect_enqueue()
            .withf(|row: &ResultRow| row.sensor_id.as_deref() == Some("sensor-2"))
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("queue unavailable").into()));

        mock_producer
            .expect_enqueue()
            .withf(|row: &ResultRow| row.sensor_id.as_deref() != Some("sensor-2"))
            .times(2)
            .returning(|_| Ok(()));

        let publisher = ResultPublisher::new(Arc::new(mock_producer));

        let summary = publisher
            .publish_rows(&[row("sensor-1"), row("sensor-2"), row("sensor-3")])
            .await;

        assert_eq!(summary, PublishSummary { published: 2, total: 3 });
    }

    #[tokio::test]
    async fn test_publish_rows_empty_input_publishes_nothing() {
        let mut mock_producer = MockDispatchMessageProducer::new();
        mock_producer.expect_enqueue().times(0);

        let publisher = ResultPublisher::new(Arc::new(mock_producer));

        let summary = publisher.publish_rows(&[]).await;

        assert_eq!(summary, PublishSummary { published: 0, total: 0 });
    }
}

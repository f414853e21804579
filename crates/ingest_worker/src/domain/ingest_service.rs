use crate::domain::BatchLocation;
use anyhow::Context;
use bytes::Bytes;
use common::{DomainResult, ObjectStoreWriter, SensorRecord};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of one stored batch
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBatch {
    pub object_key: String,
    pub record_count: usize,
}

/// Domain service that lands one batch of sensor readings in the object
/// store.
///
/// Flow:
/// 1. Derive the batch's partition and id from the first record
/// 2. Inject the resulting object key into every record
/// 3. Encode the batch as newline-delimited JSON
/// 4. Write one object via the store trait
pub struct IngestService {
    object_store: Arc<dyn ObjectStoreWriter>,
}

impl IngestService {
    pub fn new(object_store: Arc<dyn ObjectStoreWriter>) -> Self {
        Self { object_store }
    }

    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub async fn store_batch(&self, mut records: Vec<SensorRecord>) -> DomainResult<StoredBatch> {
        let location = BatchLocation::derive(&records);
        let object_key = location.object_key();

        for record in &mut records {
            record.object_key = Some(object_key.clone());
        }

        debug!(
            object_key = %object_key,
            record_count = records.len(),
            "writing sensor batch"
        );

        // One record per line: the query engine parses the object
        // line-by-line, a JSON array would not be valid input
        let body = encode_ndjson(&records)?;

        self.object_store
            .put(&object_key, Bytes::from(body), "application/json")
            .await?;

        info!(
            object_key = %object_key,
            record_count = records.len(),
            "stored sensor batch"
        );

        Ok(StoredBatch {
            object_key,
            record_count: records.len(),
        })
    }
}

fn encode_ndjson(records: &[SensorRecord]) -> DomainResult<String> {
    let lines = records
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to encode sensor record")?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MockObjectStoreWriter;

    fn record(sensor_id: &str, timestamp: &str) -> SensorRecord {
        SensorRecord {
            sensor_id: sensor_id.to_string(),
            raw_temperature: 71.6,
            raw_humidity: 40.0,
            timestamp: timestamp.to_string(),
            object_key: None,
        }
    }

    #[tokio::test]
    async fn test_store_batch_writes_ndjson_under_partition_key() {
        let mut mock_store = MockObjectStoreWriter::new();

        mock_store
            .expect_put()
            .withf(|key: &str, body: &Bytes, content_type: &str| {
                let text = std::str::from_utf8(body).unwrap();
                let lines: Vec<&str> = text.split('\n').collect();

                key.starts_with("raw/year=2025/month=02/day=10/")
                    && content_type == "application/json"
                    && lines.len() == 2
                    && lines.iter().all(|line| {
                        // each line is a standalone JSON object, not an array element
                        serde_json::from_str::<serde_json::Value>(line)
                            .map(|v| v.is_object())
                            .unwrap_or(false)
                    })
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = IngestService::new(Arc::new(mock_store));

        let result = service
            .store_batch(vec![
                record("sensor-1", "2025-02-10T12:00:00Z"),
                record("sensor-2", "2025-02-10T12:00:05Z"),
            ])
            .await
            .unwrap();

        assert_eq!(result.record_count, 2);
        assert!(result.object_key.starts_with("raw/year=2025/month=02/day=10/"));
    }

    #[tokio::test]
    async fn test_store_batch_injects_object_key_into_every_record() {
        let mut mock_store = MockObjectStoreWriter::new();

        mock_store
            .expect_put()
            .withf(|key: &str, body: &Bytes, _| {
                let text = std::str::from_utf8(body).unwrap();
                text.split('\n').all(|line| {
                    let value: serde_json::Value = serde_json::from_str(line).unwrap();
                    value["objectKey"].as_str() == Some(key)
                })
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = IngestService::new(Arc::new(mock_store));

        service
            .store_batch(vec![
                record("sensor-1", "2025-02-10T12:00:00Z"),
                record("sensor-2", "2025-02-10T12:00:05Z"),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_batch_empty_batch_still_writes() {
        let mut mock_store = MockObjectStoreWriter::new();

        mock_store
            .expect_put()
            .withf(|_, body: &Bytes, _| body.is_empty())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = IngestService::new(Arc::new(mock_store));

        let result = service.store_batch(vec![]).await.unwrap();
        assert_eq!(result.record_count, 0);
    }

    #[tokio::test]
    async fn test_store_batch_propagates_store_error() {
        let mut mock_store = MockObjectStoreWriter::new();

        mock_store
            .expect_put()
            .times(1)
            .returning(|_, _, _| Err(anyhow::anyhow!("bucket unavailable").into()));

        let service = IngestService::new(Arc::new(mock_store));

        let result = service
            .store_batch(vec![record("sensor-1", "2025-02-10T12:00:00Z")])
            .await;

        assert!(result.is_err());
    }
}

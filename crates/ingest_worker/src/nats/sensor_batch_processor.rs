use crate::domain::IngestService;
use async_nats::jetstream::Message;
use common::{BatchProcessor, ProcessingResult, SensorRecord};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Create a BatchProcessor for ingress messages.
///
/// One queue message carries one batch of sensor readings as a JSON array.
/// Payloads that are not an array of record objects are rejected here,
/// before the partition deriver ever runs.
pub fn create_sensor_batch_processor(service: Arc<IngestService>) -> BatchProcessor {
    Box::new(move |messages: &[Message]| {
        let service = Arc::clone(&service);

        // Extract payloads and subjects before moving into the async block;
        // Message borrows from the slice
        let message_data: Vec<(usize, Vec<u8>, String)> = messages
            .iter()
            .enumerate()
            .map(|(idx, msg)| (idx, msg.payload.to_vec(), msg.subject.to_string()))
            .collect();

        Box::pin(async move {
            let mut ack = Vec::new();
            let mut nak = Vec::new();

            for (idx, payload, subject) in message_data {
                let records: Vec<SensorRecord> = match serde_json::from_slice(&payload) {
                    Ok(records) => records,
                    Err(e) => {
                        error!(
                            error = %e,
                            subject = %subject,
                            "failed to decode ingress batch payload"
                        );
                        nak.push((idx, Some(format!("Decode error: {}", e))));
                        continue;
                    }
                };

                match service.store_batch(records).await {
                    Ok(stored) => {
                        debug!(
                            index = idx,
                            object_key = %stored.object_key,
                            record_count = stored.record_count,
                            "successfully stored sensor batch"
                        );
                        ack.push(idx);
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            index = idx,
                            "failed to store sensor batch"
                        );
                        nak.push((idx, Some(e.to_string())));
                    }
                }
            }

            Ok(ProcessingResult { ack, nak })
        })
    })
}

// Note: Unit tests for the processor are challenging because we cannot easily
// create actual NATS Message objects without a real NATS connection. The
// decode and storage paths are covered through the domain service tests and
// the pipeline test in the all-in-one crate.

use crate::domain::DispatchService;
use async_nats::jetstream::Message;
use common::{BatchProcessor, ProcessingResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Create a BatchProcessor that hands each fetched batch to the dispatch
/// service as one unit.
///
/// On success every message is acked, including the ones whose bodies were
/// dropped as undecodable (redelivering those would only drop them again).
/// On failure every message is nak'd so the queue redelivers the whole
/// original batch.
pub fn create_dispatch_batch_processor(service: Arc<DispatchService>) -> BatchProcessor {
    Box::new(move |messages: &[Message]| {
        let service = Arc::clone(&service);

        // Extract payloads before moving into the async block; Message
        // borrows from the slice
        let payloads: Vec<Vec<u8>> = messages.iter().map(|msg| msg.payload.to_vec()).collect();

        Box::pin(async move {
            let count = payloads.len();

            match service.dispatch(&payloads).await {
                Ok(outcome) => {
                    debug!(
                        delivered = outcome.delivered,
                        dropped = outcome.dropped,
                        "dispatch batch completed"
                    );
                    Ok(ProcessingResult {
                        ack: (0..count).collect(),
                        nak: Vec::new(),
                    })
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        message_count = count,
                        "dispatch batch failed, batch will be redelivered"
                    );
                    let reason = e.to_string();
                    Ok(ProcessingResult {
                        ack: Vec::new(),
                        nak: (0..count).map(|idx| (idx, Some(reason.clone()))).collect(),
                    })
                }
            }
        })
    })
}

// Note: Unit tests for the processor are challenging because we cannot easily
// create actual NATS Message objects without a real NATS connection. The
// dispatch paths are covered through the domain service tests and the
// pipeline test in the all-in-one crate.

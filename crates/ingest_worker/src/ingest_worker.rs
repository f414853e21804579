use crate::domain::IngestService;
use crate::nats::create_sensor_batch_processor;
use common::{NatsClient, NatsConsumer, ObjectStoreWriter};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct IngestWorkerConfig {
    pub ingest_stream: String,
    pub ingest_subject: String,
    pub nats_batch_size: usize,
    pub nats_batch_wait_secs: u64,
}

/// Ingestion stage: consumes parsed sensor batches from the ingress stream
/// and lands each one as a partitioned object.
pub struct IngestWorker {
    consumer: NatsConsumer,
}

impl IngestWorker {
    pub async fn new(
        object_store: Arc<dyn ObjectStoreWriter>,
        nats_client: Arc<NatsClient>,
        config: IngestWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing ingest worker");

        let service = Arc::new(IngestService::new(object_store));
        let processor = create_sensor_batch_processor(service);

        let consumer_client = nats_client.create_consumer_client();
        let consumer = NatsConsumer::new(
            consumer_client,
            &config.ingest_stream,
            "sensorlake-ingest",
            &config.ingest_subject,
            config.nats_batch_size,
            config.nats_batch_wait_secs,
            processor,
        )
        .await?;

        info!("Ingest worker initialized");

        Ok(Self { consumer })
    }

    #[allow(clippy::type_complexity)]
    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            )
                -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>
            + Send,
    > {
        Box::new({
            let consumer = self.consumer;
            move |ctx| Box::pin(async move { consumer.run(ctx).await })
        })
    }
}

use crate::domain::{DispatchConfig, DispatchService};
use crate::nats::create_dispatch_batch_processor;
use common::{NatsClient, NatsConsumer, RowSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct DispatchWorkerConfig {
    pub dispatch_stream: String,
    pub dispatch_subject: String,
    /// Max messages per fetched batch; bounds the outbound POST size
    pub nats_batch_size: usize,
    /// Max seconds a partial batch is held before it is handed over
    pub nats_batch_wait_secs: u64,
    pub dispatch: DispatchConfig,
}

/// Delivery stage: consumes bounded batches of dispatch messages and posts
/// each batch to the external sink.
pub struct DispatchWorker {
    consumer: NatsConsumer,
}

impl DispatchWorker {
    pub async fn new(
        sink: Arc<dyn RowSink>,
        nats_client: Arc<NatsClient>,
        config: DispatchWorkerConfig,
    ) -> anyhow::Result<Self> {
        info!("Initializing dispatch worker");

        let service = Arc::new(DispatchService::new(sink, config.dispatch.clone()));
        let processor = create_dispatch_batch_processor(service);

        let consumer_client = nats_client.create_consumer_client();
        let consumer = NatsConsumer::new(
            consumer_client,
            &config.dispatch_stream,
            "sensorlake-dispatch",
            &config.dispatch_subject,
            config.nats_batch_size,
            config.nats_batch_wait_secs,
            processor,
        )
        .await?;

        info!("Dispatch worker initialized");

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

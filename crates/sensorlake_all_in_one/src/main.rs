mod config;

use common::{
    init_telemetry, shutdown_telemetry, NatsClient, NatsObjectStoreClient, TelemetryConfig,
    TelemetryProviders,
};
use config::ServiceConfig;
use dispatch_worker::dispatch_worker::{DispatchWorker, DispatchWorkerConfig};
use dispatch_worker::domain::DispatchConfig;
use dispatch_worker::http::{WebhookSink, WebhookSinkConfig};
use ingest_worker::ingest_worker::{IngestWorker, IngestWorkerConfig};
use query_worker::http::{HttpQueryServiceClient, QueryServiceClientConfig};
use query_worker::nats::NatsDispatchMessageProducer;
use query_worker::query_worker::{QueryWorker, QueryWorkerConfig};
use sensorlake_runner::Runner;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Initialize configuration and tracing
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry (tracing + OpenTelemetry for traces and logs)
    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        otel_endpoint = %config.otel_endpoint,
        "Starting sensorlake-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    // NATS initialization
    let nats_client = match initialize_nats(&config).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize NATS: {}", e);
            std::process::exit(1);
        }
    };

    // Object store for raw sensor batches
    let object_store = match NatsObjectStoreClient::new(
        nats_client.jetstream(),
        &config.object_store_bucket,
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to initialize object store: {}", e);
            std::process::exit(1);
        }
    };

    // Ingest worker: ingress batches → partitioned objects
    let ingest_worker = match IngestWorker::new(
        object_store,
        nats_client.clone(),
        IngestWorkerConfig {
            ingest_stream: config.ingest_stream.clone(),
            ingest_subject: config.ingest_subject.clone(),
            nats_batch_size: config.nats_batch_size,
            nats_batch_wait_secs: config.nats_batch_wait_secs,
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize ingest worker: {}", e);
            std::process::exit(1);
        }
    };

    // Query worker: scheduled query lifecycle → dispatch messages
    let query_service = match HttpQueryServiceClient::new(QueryServiceClientConfig {
        base_url: config.query_service_url.clone(),
        timeout_secs: config.startup_timeout_secs,
    }) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to initialize query service client: {}", e);
            std::process::exit(1);
        }
    };

    let producer = Arc::new(NatsDispatchMessageProducer::new(
        nats_client.create_publisher_client(),
        config.dispatch_stream.clone(),
    ));

    let query_worker = QueryWorker::new(
        query_service,
        producer,
        QueryWorkerConfig {
            database: config.query_database.clone(),
            table: config.query_table.clone(),
            output_location: config.query_output_location.clone(),
            partition_year: config.partition_year.clone(),
            partition_month: config.partition_month.clone(),
            partition_day: config.partition_day.clone(),
            poll_interval_ms: config.query_poll_interval_ms,
            max_poll_secs: config.query_max_poll_secs,
            run_interval_secs: config.query_run_interval_secs,
        },
    );

    // Dispatch worker: queued rows → sink batches
    let sink = match WebhookSink::new(WebhookSinkConfig {
        url: config.sink_url.clone(),
        timeout_secs: config.sink_timeout_secs,
    }) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!("Failed to initialize webhook sink: {}", e);
            std::process::exit(1);
        }
    };

    let dispatch_worker = match DispatchWorker::new(
        sink,
        nats_client.clone(),
        DispatchWorkerConfig {
            dispatch_stream: config.dispatch_stream.clone(),
            dispatch_subject: config.dispatch_subject.clone(),
            nats_batch_size: config.nats_batch_size,
            nats_batch_wait_secs: config.nats_batch_wait_secs,
            dispatch: DispatchConfig {
                max_attempts: config.dispatch_max_attempts,
                retry_base_delay: Duration::from_millis(config.dispatch_retry_base_delay_ms),
            },
        },
    )
    .await
    {
        Ok(worker) => worker,
        Err(e) => {
            error!("Failed to initialize dispatch worker: {}", e);
            std::process::exit(1);
        }
    };

    // Build runner with all processes
    let runner = Runner::new()
        .with_named_process("ingest_worker", ingest_worker.into_runner_process())
        .with_named_process("query_worker", query_worker.into_runner_process())
        .with_named_process("dispatch_worker", dispatch_worker.into_runner_process())
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || {
                Box::pin(async move {
                    info!("Running cleanup tasks...");
                    if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                        client.close().await;
                    }

                    // Shutdown telemetry and flush pending traces and logs
                    shutdown_telemetry(telemetry_providers);

                    info!("Cleanup complete");
                    Ok(())
                })
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    // Run the service
    runner.run().await;
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<Arc<NatsClient>> {
    info!("Initializing NATS...");
    let nats_client = Arc::new(
        NatsClient::connect(
            &config.nats_url,
            Duration::from_secs(config.startup_timeout_secs),
        )
        .await?,
    );

    nats_client.ensure_stream(&config.ingest_stream).await?;
    nats_client.ensure_stream(&config.dispatch_stream).await?;

    Ok(nats_client)
}

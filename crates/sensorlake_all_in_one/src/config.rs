use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// NATS JetStream stream name for ingress sensor batches
    #[serde(default = "default_ingest_stream")]
    pub ingest_stream: String,

    /// NATS subject pattern for the ingest consumer filter
    #[serde(default = "default_ingest_subject")]
    pub ingest_subject: String,

    /// NATS JetStream stream name for dispatch messages
    #[serde(default = "default_dispatch_stream")]
    pub dispatch_stream: String,

    /// NATS subject pattern for the dispatch consumer filter
    #[serde(default = "default_dispatch_subject")]
    pub dispatch_subject: String,

    /// NATS Object Store bucket name for raw sensor batches
    #[serde(default = "default_object_store_bucket")]
    pub object_store_bucket: String,

    /// Batch size for consumers; also bounds the outbound sink POST
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Query service configuration
    /// Base URL of the managed query service
    #[serde(default = "default_query_service_url")]
    pub query_service_url: String,

    /// Database the partition query runs against
    #[serde(default = "default_query_database")]
    pub query_database: String,

    /// Table the partition query reads
    #[serde(default = "default_query_table")]
    pub query_table: String,

    /// Output location URI handed to the query engine
    #[serde(default = "default_query_output_location")]
    pub query_output_location: String,

    /// Date-partition selectors; leave unset to scope each run to the
    /// current UTC date
    #[serde(default)]
    pub partition_year: Option<String>,

    #[serde(default)]
    pub partition_month: Option<String>,

    #[serde(default)]
    pub partition_day: Option<String>,

    /// Delay between query poll attempts in milliseconds
    #[serde(default = "default_query_poll_interval_ms")]
    pub query_poll_interval_ms: u64,

    /// Wall-clock budget for one query poll loop in seconds
    #[serde(default = "default_query_max_poll_secs")]
    pub query_max_poll_secs: u64,

    /// Seconds between scheduled query runs
    #[serde(default = "default_query_run_interval_secs")]
    pub query_run_interval_secs: u64,

    // Sink configuration
    /// URL of the external HTTP sink
    #[serde(default = "default_sink_url")]
    pub sink_url: String,

    /// Sink request timeout in seconds
    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,

    /// Total sink attempts per batch, including the first
    #[serde(default = "default_dispatch_max_attempts")]
    pub dispatch_max_attempts: u32,

    /// Base delay for linear dispatch backoff in milliseconds
    #[serde(default = "default_dispatch_retry_base_delay_ms")]
    pub dispatch_retry_base_delay_ms: u64,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    /// Enable OpenTelemetry export
    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    /// Service name for OpenTelemetry resource
    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_ingest_stream() -> String {
    "sensor_batches".to_string()
}

fn default_ingest_subject() -> String {
    "sensor_batches.>".to_string()
}

fn default_dispatch_stream() -> String {
    "dispatch_messages".to_string()
}

fn default_dispatch_subject() -> String {
    "dispatch_messages.>".to_string()
}

fn default_object_store_bucket() -> String {
    "sensorlake-raw".to_string()
}

fn default_nats_batch_size() -> usize {
    30
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_startup_timeout_secs() -> u64 {
    30
}

// Query service defaults
fn default_query_service_url() -> String {
    "http://localhost:8230".to_string()
}

fn default_query_database() -> String {
    "sensor_lake".to_string()
}

fn default_query_table() -> String {
    "readings".to_string()
}

fn default_query_output_location() -> String {
    "results/".to_string()
}

fn default_query_poll_interval_ms() -> u64 {
    2000
}

fn default_query_max_poll_secs() -> u64 {
    600
}

fn default_query_run_interval_secs() -> u64 {
    300
}

// Sink defaults
fn default_sink_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_sink_timeout_secs() -> u64 {
    30
}

fn default_dispatch_max_attempts() -> u32 {
    3
}

fn default_dispatch_retry_base_delay_ms() -> u64 {
    1000
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "sensorlake-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SENSORLAKE"))
            .build()?
            .try_deserialize()
    }
}

use crate::domain::{DomainResult, ObjectStoreWriter};
use anyhow::{Context, Result};
use async_nats::jetstream;
use async_trait::async_trait;
use tracing::debug;

/// Object store client bound to one bucket.
///
/// The bucket is created on first use; writes overwrite idempotently, which
/// matches the at-least-once ingestion contract (re-writing a batch under
/// the same key is harmless).
pub struct NatsObjectStoreClient {
    store: jetstream::object_store::ObjectStore,
    bucket: String,
}

impl NatsObjectStoreClient {
    pub async fn new(jetstream: &jetstream::Context, bucket_name: &str) -> Result<Self> {
        debug!(bucket = %bucket_name, "initializing object store client");

        let store = match jetstream.get_object_store(bucket_name).await {
            Ok(store) => {
                debug!(bucket = %bucket_name, "object store bucket already exists");
                store
            }
            Err(_) => {
                debug!(bucket = %bucket_name, "creating object store bucket");
                jetstream
                    .create_object_store(jetstream::object_store::Config {
                        bucket: bucket_name.to_string(),
                        ..Default::default()
                    })
                    .await
                    .context("failed to create object store bucket")?
            }
        };

        Ok(Self {
            store,
            bucket: bucket_name.to_string(),
        })
    }
}

#[async_trait]
impl ObjectStoreWriter for NatsObjectStoreClient {
    async fn put(&self, key: &str, body: bytes::Bytes, content_type: &str) -> DomainResult<()> {
        debug!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size = body.len(),
            "writing object"
        );

        let mut reader = &body[..];
        self.store
            .put(key, &mut reader)
            .await
            .context("failed to upload object")?;
        Ok(())
    }
}

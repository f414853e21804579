use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Durable write interface of the raw-data object store.
///
/// Implementations should:
/// - Bind the target bucket at construction
/// - Overwrite idempotently when the key already exists
/// - Not retry internally; the caller owns retry policy
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStoreWriter: Send + Sync {
    /// Write one object under `key`
    async fn put(&self, key: &str, body: bytes::Bytes, content_type: &str) -> DomainResult<()>;
}

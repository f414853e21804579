use crate::domain::record::ResultRow;
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Trait for enqueueing dispatch messages to the durable queue
///
/// Implementations should:
/// - Serialize the row as one self-contained JSON message
/// - Publish one message per row and await the broker acknowledgment
/// - Return error if the enqueue fails
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DispatchMessageProducer: Send + Sync {
    /// Enqueue a single result row
    ///
    /// # Arguments
    /// * `row` - ResultRow to enqueue
    ///
    /// # Returns
    /// () on success, DomainError on failure
    async fn enqueue(&self, row: &ResultRow) -> DomainResult<()>;
}

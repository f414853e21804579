use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Outbound interface of the external HTTP sink.
///
/// One call posts one batch: a JSON array of decoded row objects. Any 2xx
/// response is success; everything else is an error carrying the response
/// body text. Implementations perform a single attempt; retry policy
/// belongs to the dispatcher.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Post one batch of rows to the sink
    async fn post_rows(&self, rows: &[serde_json::Value]) -> DomainResult<()>;
}

use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Lifecycle state of one query execution as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Submitted,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }
}

/// One poll response: current state plus the engine's failure reason, if any
#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatus {
    pub state: QueryState,
    pub reason: Option<String>,
}

impl QueryStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn with_reason(state: QueryState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: Some(reason.into()),
        }
    }
}

/// Execution context passed alongside the query text on submission
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Database the query runs against
    pub database: String,
    /// URI the engine writes its result set under
    pub output_location: String,
}

/// A row as fetched from the engine: ordered, nullable text cells
pub type FetchedRow = Vec<Option<String>>;

/// Asynchronous long-running-operation interface of the query engine.
///
/// Implementations should:
/// - Start exactly one execution per `submit` call and return its id
/// - Report the current lifecycle state on `poll`
/// - Return the tabular result on `fetch`, header row first
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query for asynchronous execution
    async fn submit(&self, sql: &str, ctx: &QueryContext) -> DomainResult<String>;

    /// Poll the current state of an execution
    async fn poll(&self, execution_id: &str) -> DomainResult<QueryStatus>;

    /// Fetch the result rows of a succeeded execution.
    /// The first row is the column-name header row.
    async fn fetch(&self, execution_id: &str) -> DomainResult<Vec<FetchedRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(QueryState::Succeeded.is_terminal());
        assert!(QueryState::Failed.is_terminal());
        assert!(QueryState::Cancelled.is_terminal());
        assert!(!QueryState::Submitted.is_terminal());
        assert!(!QueryState::Queued.is_terminal());
        assert!(!QueryState::Running.is_terminal());
    }

    #[test]
    fn test_status_with_reason() {
        let status = QueryStatus::with_reason(QueryState::Failed, "table not found");
        assert_eq!(status.state, QueryState::Failed);
        assert_eq!(status.reason.as_deref(), Some("table not found"));
    }
}

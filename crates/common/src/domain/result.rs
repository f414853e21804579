use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Query execution {0} failed: {1}")]
    QueryFailed(String, String),

    #[error("Query execution {0} cancelled: {1}")]
    QueryCancelled(String, String),

    #[error("Query execution {0} exceeded its poll budget")]
    QueryTimedOut(String),

    #[error("Sink returned status {status}: {body}")]
    SinkRejected { status: u16, body: String },

    #[error("Dispatch failed after {attempts} attempts: {reason}")]
    DispatchFailed { attempts: u32, reason: String },

    #[error("Invalid batch payload: {0}")]
    InvalidBatchPayload(String),

    #[error("Collaborator error: {0}")]
    CollaboratorError(#[from] anyhow::Error),
}

impl DomainError {
    /// Terminal query-lifecycle failures, including the added poll budget
    pub fn is_query_terminal_failure(&self) -> bool {
        matches!(
            self,
            DomainError::QueryFailed(_, _)
                | DomainError::QueryCancelled(_, _)
                | DomainError::QueryTimedOut(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failed_carries_reason() {
        let err = DomainError::QueryFailed("exec-1".to_string(), "syntax error".to_string());
        assert!(err.to_string().contains("exec-1"));
        assert!(err.to_string().contains("syntax error"));
        assert!(err.is_query_terminal_failure());
    }

    #[test]
    fn test_collaborator_error_from_anyhow() {
        let err: DomainError = anyhow::anyhow!("connection refused").into();
        assert!(matches!(err, DomainError::CollaboratorError(_)));
        assert!(!err.is_query_terminal_failure());
    }
}

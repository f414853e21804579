use common::{DomainError, DomainResult, QueryContext, QueryService, QueryState, ResultRow};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct QueryOrchestratorConfig {
    /// Delay between poll attempts
    pub poll_interval: Duration,
    /// Wall-clock budget for the whole poll loop. Expiry is treated like a
    /// FAILED terminal state so an engine that never terminates cannot block
    /// the invocation forever.
    pub max_poll_duration: Duration,
}

impl Default for QueryOrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_poll_duration: Duration::from_secs(600),
        }
    }
}

/// Runs one query execution to completion and extracts its result rows.
///
/// Exactly one submit, N ≥ 1 polls and at most one fetch per invocation.
/// Terminal failure is surfaced with the engine's reason; retrying is the
/// caller's decision, never this component's. Nothing is cached across
/// invocations.
pub struct QueryLifecycleOrchestrator {
    query_service: Arc<dyn QueryService>,
    config: QueryOrchestratorConfig,
}

impl QueryLifecycleOrchestrator {
    pub fn new(query_service: Arc<dyn QueryService>, config: QueryOrchestratorConfig) -> Self {
        Self {
            query_service,
            config,
        }
    }

    #[instrument(skip(self, sql, ctx), fields(database = %ctx.database))]
    pub async fn run(&self, sql: &str, ctx: &QueryContext) -> DomainResult<Vec<ResultRow>> {
        let execution_id = self.query_service.submit(sql, ctx).await?;
        info!(execution_id = %execution_id, "submitted query execution");

        let deadline = tokio::time::Instant::now() + self.config.max_poll_duration;

        loop {
            let status = self.query_service.poll(&execution_id).await?;
            debug!(
                execution_id = %execution_id,
                state = ?status.state,
                "polled query execution"
            );

            match status.state {
                QueryState::Succeeded => break,
                QueryState::Failed => {
                    let reason = status.reason.unwrap_or_else(|| "unknown".to_string());
                    warn!(
                        execution_id = %execution_id,
                        reason = %reason,
                        "query execution failed"
                    );
                    return Err(DomainError::QueryFailed(execution_id, reason));
                }
                QueryState::Cancelled => {
                    let reason = status.reason.unwrap_or_else(|| "unknown".to_string());
                    warn!(
                        execution_id = %execution_id,
                        reason = %reason,
                        "query execution cancelled"
                    );
                    return Err(DomainError::QueryCancelled(execution_id, reason));
                }
                QueryState::Submitted | QueryState::Queued | QueryState::Running => {
                    if tokio::time::Instant::now() >= deadline {
                        warn!(
                            execution_id = %execution_id,
                            budget_secs = self.config.max_poll_duration.as_secs(),
                            "query execution exceeded poll budget"
                        );
                        return Err(DomainError::QueryTimedOut(execution_id));
                    }
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }

        let fetched = self.query_service.fetch(&execution_id).await?;

        // The first row is always the column-name header, whatever its
        // content; an empty result set therefore yields zero data rows
        let rows: Vec<ResultRow> = fetched
            .into_iter()
            .skip(1)
            .map(ResultRow::from_cells)
            .collect();

        info!(
            execution_id = %execution_id,
            row_count = rows.len(),
            "query execution completed"
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{FetchedRow, MockQueryService, QueryStatus};
    use mockall::Sequence;

    fn test_config() -> QueryOrchestratorConfig {
        QueryOrchestratorConfig {
            poll_interval: Duration::from_millis(1),
            max_poll_duration: Duration::from_secs(60),
        }
    }

    fn test_ctx() -> QueryContext {
        QueryContext {
            database: "sensor_lake".to_string(),
            output_location: "results/".to_string(),
        }
    }

    fn cells(values: &[&str]) -> FetchedRow {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_run_polls_until_succeeded_and_discards_header_row() {
        let mut mock_service = MockQueryService::new();
        let mut seq = Sequence::new();

        mock_service
            .expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("exec-1".to_string()));

        mock_service
            .expect_poll()
            .withf(|id: &str| id == "exec-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(QueryStatus::new(QueryState::Submitted)));

        mock_service
            .expect_poll()
            .withf(|id: &str| id == "exec-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(QueryStatus::new(QueryState::Running)));

        mock_service
            .expect_poll()
            .withf(|id: &str| id == "exec-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(QueryStatus::new(QueryState::Succeeded)));

        mock_service
            .expect_fetch()
            .withf(|id: &str| id == "exec-1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![
                    cells(&[
                        "sensorid",
                        "temperaturecelsius",
                        "rawhumidity",
                        "timestamp",
                        "objectkey",
                    ]),
                    cells(&["sensor-1", "22.0", "40.0", "2025-02-10T12:00:00Z", "key-1"]),
                    cells(&["sensor-2", "23.5", "41.0", "2025-02-10T12:00:05Z", "key-1"]),
                ])
            });

        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), test_config());

        let rows = orchestrator.run("SELECT 1", &test_ctx()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sensor_id.as_deref(), Some("sensor-1"));
        assert_eq!(rows[1].sensor_id.as_deref(), Some("sensor-2"));
        // the header row's content never appears in the output
        assert!(rows
            .iter()
            .all(|row| row.sensor_id.as_deref() != Some("sensorid")));
    }

    #[tokio::test]
    async fn test_run_header_row_discarded_even_when_it_looks_like_data() {
        let mut mock_service = MockQueryService::new();

        mock_service
            .expect_submit()
            .times(1)
            .returning(|_, _| Ok("exec-1".to_string()));
        mock_service
            .expect_poll()
            .times(1)
            .returning(|_| Ok(QueryStatus::new(QueryState::Succeeded)));
        mock_service.expect_fetch().times(1).returning(|_| {
            // header row indistinguishable from data; must still be dropped
            Ok(vec![cells(&[
                "sensor-9",
                "99.9",
                "99.9",
                "2025-01-01T00:00:00Z",
                "key-9",
            ])])
        });

        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), test_config());

        let rows = orchestrator.run("SELECT 1", &test_ctx()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_run_failed_on_second_poll_surfaces_reason_without_fetch() {
        let mut mock_service = MockQueryService::new();
        let mut seq = Sequence::new();

        mock_service
            .expect_submit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("exec-2".to_string()));

        mock_service
            .expect_poll()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(QueryStatus::new(QueryState::Running)));

        mock_service
            .expect_poll()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(QueryStatus::with_reason(
                    QueryState::Failed,
                    "SYNTAX_ERROR: line 1",
                ))
            });

        mock_service.expect_fetch().times(0);

        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), test_config());

        let err = orchestrator.run("SELECT 1", &test_ctx()).await.unwrap_err();

        assert!(matches!(err, DomainError::QueryFailed(_, _)));
        assert!(err.to_string().contains("SYNTAX_ERROR: line 1"));
    }

    #[tokio::test]
    async fn test_run_cancelled_is_terminal() {
        let mut mock_service = MockQueryService::new();

        mock_service
            .expect_submit()
            .times(1)
            .returning(|_, _| Ok("exec-3".to_string()));
        mock_service.expect_poll().times(1).returning(|_| {
            Ok(QueryStatus::with_reason(
                QueryState::Cancelled,
                "cancelled by operator",
            ))
        });
        mock_service.expect_fetch().times(0);

        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), test_config());

        let err = orchestrator.run("SELECT 1", &test_ctx()).await.unwrap_err();

        assert!(matches!(err, DomainError::QueryCancelled(_, _)));
        assert!(err.to_string().contains("cancelled by operator"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out_when_poll_budget_is_exhausted() {
        let mut mock_service = MockQueryService::new();

        mock_service
            .expect_submit()
            .times(1)
            .returning(|_, _| Ok("exec-4".to_string()));
        mock_service
            .expect_poll()
            .returning(|_| Ok(QueryStatus::new(QueryState::Running)));
        mock_service.expect_fetch().times(0);

        let config = QueryOrchestratorConfig {
            poll_interval: Duration::from_secs(2),
            max_poll_duration: Duration::from_secs(5),
        };
        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), config);

        let err = orchestrator.run("SELECT 1", &test_ctx()).await.unwrap_err();

        assert!(matches!(err, DomainError::QueryTimedOut(_)));
    }

    #[tokio::test]
    async fn test_run_propagates_submit_error() {
        let mut mock_service = MockQueryService::new();

        mock_service
            .expect_submit()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("engine unreachable").into()));
        mock_service.expect_poll().times(0);
        mock_service.expect_fetch().times(0);

        let orchestrator = QueryLifecycleOrchestrator::new(Arc::new(mock_service), test_config());

        let result = orchestrator.run("SELECT 1", &test_ctx()).await;
        assert!(result.is_err());
    }
}

use crate::domain::{
    build_partition_query, PartitionFilter, PublishSummary, QueryLifecycleOrchestrator,
    QueryOrchestratorConfig, ResultPublisher,
};
use common::{DispatchMessageProducer, DomainResult, QueryContext, QueryService};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct QueryWorkerConfig {
    pub database: String,
    pub table: String,
    pub output_location: String,
    /// Partition selectors; all three must be set to pin a date, otherwise
    /// each run scopes to the current UTC date
    pub partition_year: Option<String>,
    pub partition_month: Option<String>,
    pub partition_day: Option<String>,
    pub poll_interval_ms: u64,
    pub max_poll_secs: u64,
    /// Seconds between scheduled runs
    pub run_interval_secs: u64,
}

/// Scheduled stage: one query lifecycle per tick, matching rows fanned out
/// onto the dispatch stream.
pub struct QueryWorker {
    orchestrator: QueryLifecycleOrchestrator,
    publisher: ResultPublisher,
    config: QueryWorkerConfig,
}

impl QueryWorker {
    pub fn new(
        query_service: Arc<dyn QueryService>,
        producer: Arc<dyn DispatchMessageProducer>,
        config: QueryWorkerConfig,
    ) -> Self {
        info!("Initializing query worker");

        let orchestrator = QueryLifecycleOrchestrator::new(
            query_service,
            QueryOrchestratorConfig {
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                max_poll_duration: Duration::from_secs(config.max_poll_secs),
            },
        );
        let publisher = ResultPublisher::new(producer);

        Self {
            orchestrator,
            publisher,
            config,
        }
    }

    fn partition_filter(&self) -> PartitionFilter {
        match (
            &self.config.partition_year,
            &self.config.partition_month,
            &self.config.partition_day,
        ) {
            (Some(year), Some(month), Some(day)) => PartitionFilter {
                year: year.clone(),
                month: month.clone(),
                day: day.clone(),
            },
            _ => PartitionFilter::for_today(),
        }
    }

    /// One self-contained invocation: submit, poll to terminal, fetch,
    /// publish. Nothing is carried over to the next run.
    pub async fn run_once(&self) -> DomainResult<PublishSummary> {
        let filter = self.partition_filter();
        let sql = build_partition_query(&self.config.table, &filter);
        let ctx = QueryContext {
            database: self.config.database.clone(),
            output_location: self.config.output_location.clone(),
        };

        info!(
            year = %filter.year,
            month = %filter.month,
            day = %filter.day,
            "starting query run"
        );

        let rows = self.orchestrator.run(&sql, &ctx).await?;
        let summary = self.publisher.publish_rows(&rows).await;

        Ok(summary)
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
        Box::new(move |ctx| {
            Box::pin(async move {
                let mut interval =
                    tokio::time::interval(Duration::from_secs(self.config.run_interval_secs));
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => {
                            info!("query worker received shutdown signal");
                            break;
                        }
                        _ = interval.tick() => {
                            // dropping the run future on cancellation also
                            // cancels the poll sleep inside it
                            tokio::select! {
                                _ = ctx.cancelled() => {
                                    info!("query worker cancelled mid-run");
                                    break;
                                }
                                result = self.run_once() => {
                                    if let Err(e) = result {
                                        error!(error = %e, "query run failed");
                                    }
                                }
                            }
                        }
                    }
                }

                Ok(())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        FetchedRow, MockDispatchMessageProducer, MockQueryService, QueryState, QueryStatus,
    };

    fn test_config() -> QueryWorkerConfig {
        QueryWorkerConfig {
            database: "sensor_lake".to_string(),
            table: "readings".to_string(),
            output_location: "results/".to_string(),
            partition_year: Some("2025".to_string()),
            partition_month: Some("02".to_string()),
            partition_day: Some("10".to_string()),
            poll_interval_ms: 1,
            max_poll_secs: 60,
            run_interval_secs: 3600,
        }
    }

    fn cells(values: &[&str]) -> FetchedRow {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[tokio::test]
    async fn test_run_once_publishes_every_data_row() {
        let mut mock_service = MockQueryService::new();
        let mut mock_producer = MockDispatchMessageProducer::new();

        mock_service
            .expect_submit()
            .withf(|sql: &str, ctx: &QueryContext| {
                sql.contains("year = '2025'")
                    && sql.contains("FROM readings")
                    && ctx.database == "sensor_lake"
            })
            .times(1)
            .returning(|_, _| Ok("exec-1".to_string()));
        mock_service
            .expect_poll()
            .times(1)
            .returning(|_| Ok(QueryStatus::new(QueryState::Succeeded)));
        mock_service.expect_fetch().times(1).returning(|_| {
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

        mock_producer
            .expect_enqueue()
            .times(2)
            .returning(|_| Ok(()));

        let worker = QueryWorker::new(
            Arc::new(mock_service),
            Arc::new(mock_producer),
            test_config(),
        );

        let summary = worker.run_once().await.unwrap();
        assert_eq!(summary, PublishSummary { published: 2, total: 2 });
    }

    #[tokio::test]
    async fn test_run_once_surfaces_lifecycle_failure() {
        let mut mock_service = MockQueryService::new();
        let mut mock_producer = MockDispatchMessageProducer::new();

        mock_service
            .expect_submit()
            .times(1)
            .returning(|_, _| Ok("exec-1".to_string()));
        mock_service.expect_poll().times(1).returning(|_| {
            Ok(QueryStatus::with_reason(
                QueryState::Failed,
                "partition not found",
            ))
        });
        mock_service.expect_fetch().times(0);
        mock_producer.expect_enqueue().times(0);

        let worker = QueryWorker::new(
            Arc::new(mock_service),
            Arc::new(mock_producer),
            test_config(),
        );

        let err = worker.run_once().await.unwrap_err();
        assert!(err.to_string().contains("partition not found"));
    }

    #[test]
    fn test_partition_filter_defaults_to_today_when_unpinned() {
        let mock_service = MockQueryService::new();
        let mock_producer = MockDispatchMessageProducer::new();

        let mut config = test_config();
        config.partition_day = None;

        let worker = QueryWorker::new(Arc::new(mock_service), Arc::new(mock_producer), config);

        assert_eq!(worker.partition_filter(), PartitionFilter::for_today());
    }
}

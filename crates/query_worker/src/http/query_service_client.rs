use anyhow::{anyhow, Context};
use async_trait::async_trait;
use common::{DomainResult, FetchedRow, QueryContext, QueryService, QueryState, QueryStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the HTTP query-service client
#[derive(Debug, Clone)]
pub struct QueryServiceClientConfig {
    /// Base URL of the query service (e.g. "http://localhost:8230")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QueryServiceClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8230".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP client for the managed query service.
///
/// The service exposes the asynchronous lifecycle over REST:
/// - `POST /v1/queries` submits and returns the execution id
/// - `GET /v1/queries/{id}` reports the current state
/// - `GET /v1/queries/{id}/results` returns the tabular rows, header first
pub struct HttpQueryServiceClient {
    client: reqwest::Client,
    config: QueryServiceClientConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    query: &'a str,
    database: &'a str,
    output_location: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    execution_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    state: String,
    #[serde(default)]
    state_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResultsResponse {
    rows: Vec<FetchedRow>,
}

impl HttpQueryServiceClient {
    pub fn new(config: QueryServiceClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build query service http client")?;

        Ok(Self { client, config })
    }

    async fn read_success_body(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("query service returned {}: {}", status, body));
        }
        Ok(response)
    }
}

fn parse_state(state: &str) -> anyhow::Result<QueryState> {
    match state {
        "SUBMITTED" => Ok(QueryState::Submitted),
        "QUEUED" => Ok(QueryState::Queued),
        "RUNNING" => Ok(QueryState::Running),
        "SUCCEEDED" => Ok(QueryState::Succeeded),
        "FAILED" => Ok(QueryState::Failed),
        "CANCELLED" => Ok(QueryState::Cancelled),
        other => Err(anyhow!("unknown query state: {}", other)),
    }
}

#[async_trait]
impl QueryService for HttpQueryServiceClient {
    async fn submit(&self, sql: &str, ctx: &QueryContext) -> DomainResult<String> {
        let url = format!("{}/v1/queries", self.config.base_url);
        debug!(url = %url, database = %ctx.database, "submitting query");

        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest {
                query: sql,
                database: &ctx.database,
                output_location: &ctx.output_location,
            })
            .send()
            .await
            .context("failed to submit query")?;

        let response = Self::read_success_body(response).await?;
        let body: SubmitResponse = response
            .json()
            .await
            .context("failed to decode submit response")?;

        Ok(body.execution_id)
    }

    async fn poll(&self, execution_id: &str) -> DomainResult<QueryStatus> {
        let url = format!("{}/v1/queries/{}", self.config.base_url, execution_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to poll query execution")?;

        let response = Self::read_success_body(response).await?;
        let body: StatusResponse = response
            .json()
            .await
            .context("failed to decode status response")?;

        Ok(QueryStatus {
            state: parse_state(&body.state)?,
            reason: body.state_reason,
        })
    }

    async fn fetch(&self, execution_id: &str) -> DomainResult<Vec<FetchedRow>> {
        let url = format!(
            "{}/v1/queries/{}/results",
            self.config.base_url, execution_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to fetch query results")?;

        let response = Self::read_success_body(response).await?;
        let body: ResultsResponse = response
            .json()
            .await
            .context("failed to decode results response")?;

        Ok(body.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_known_values() {
        assert_eq!(parse_state("SUBMITTED").unwrap(), QueryState::Submitted);
        assert_eq!(parse_state("QUEUED").unwrap(), QueryState::Queued);
        assert_eq!(parse_state("RUNNING").unwrap(), QueryState::Running);
        assert_eq!(parse_state("SUCCEEDED").unwrap(), QueryState::Succeeded);
        assert_eq!(parse_state("FAILED").unwrap(), QueryState::Failed);
        assert_eq!(parse_state("CANCELLED").unwrap(), QueryState::Cancelled);
    }

    #[test]
    fn test_parse_state_unknown_value_is_error() {
        assert!(parse_state("EXPLODED").is_err());
    }

    #[test]
    fn test_status_response_tolerates_missing_reason() {
        let body: StatusResponse = serde_json::from_str(r#"{"state":"RUNNING"}"#).unwrap();
        assert_eq!(body.state, "RUNNING");
        assert!(body.state_reason.is_none());
    }

    #[test]
    fn test_results_response_decodes_nullable_cells() {
        let body: ResultsResponse =
            serde_json::from_str(r#"{"rows":[["sensorid",null],["sensor-1","22.0"]]}"#).unwrap();
        assert_eq!(body.rows.len(), 2);
        assert_eq!(body.rows[0][1], None);
        assert_eq!(body.rows[1][0].as_deref(), Some("sensor-1"));
    }
}

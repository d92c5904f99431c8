use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// Status recorded when a request never produced a response.
pub const TRANSPORT_FAILURE_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

const IDEMPOTENCY_MARKERS: [&str; 2] = ["already exists", "duplicate"];

/// Which remote procedure receives each statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointStrategy {
    /// `POST /rest/v1/rpc/<function>`
    Rpc { function: String },
    /// `POST /rest/v1/?select=*`
    Rest,
}

impl EndpointStrategy {
    pub fn path(&self) -> String {
        match self {
            EndpointStrategy::Rpc { function } => format!("/rest/v1/rpc/{function}"),
            EndpointStrategy::Rest => "/rest/v1/?select=*".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    AlreadyExists,
    Failure,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        !matches!(self, Outcome::Failure)
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub outcome: Outcome,
    pub status: StatusCode,
    pub body: String,
}

pub fn classify(status: StatusCode, body: &str) -> Outcome {
    if status.is_success() {
        Outcome::Success
    } else if IDEMPOTENCY_MARKERS.iter().any(|marker| body.contains(marker)) {
        Outcome::AlreadyExists
    } else {
        Outcome::Failure
    }
}

#[derive(Clone)]
pub struct SqlClient {
    client: reqwest::Client,
    url: String,
    sql_field: String,
    service_key: String,
    api_key: String,
}

impl SqlClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            url: config.endpoint_url(),
            sql_field: config.sql_field.clone(),
            service_key: config.service_key.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one statement. Transport errors become a failed submission
    /// carrying [`TRANSPORT_FAILURE_STATUS`] and the error text.
    pub async fn submit(&self, sql: &str) -> Submission {
        let (status, body) = match self.execute(sql).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(error = %err, "statement request failed");
                (TRANSPORT_FAILURE_STATUS, err.to_string())
            }
        };

        let outcome = classify(status, &body);
        debug!(%status, ?outcome, "statement submitted");
        Submission {
            outcome,
            status,
            body,
        }
    }

    pub async fn execute(&self, sql: &str) -> Result<(StatusCode, String), ClientError> {
        let mut payload = Map::new();
        payload.insert(self.sql_field.clone(), Value::String(sql.to_string()));

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.service_key)
            .header("apikey", self.api_key.as_str())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success_range() {
        assert_eq!(classify(StatusCode::OK, ""), Outcome::Success);
        assert_eq!(classify(StatusCode::NO_CONTENT, ""), Outcome::Success);
        assert_eq!(
            classify(StatusCode::CREATED, "duplicate key"),
            Outcome::Success
        );
    }

    #[test]
    fn test_classify_idempotency_markers() {
        assert_eq!(
            classify(StatusCode::CONFLICT, r#"{"message":"relation \"habits\" already exists"}"#),
            Outcome::AlreadyExists
        );
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, "duplicate key value violates unique constraint"),
            Outcome::AlreadyExists
        );
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, "Already Exists"),
            Outcome::Failure
        );
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, "syntax error at or near \"CREAT\""),
            Outcome::Failure
        );
        assert_eq!(classify(TRANSPORT_FAILURE_STATUS, "timed out"), Outcome::Failure);
        assert!(!Outcome::Failure.is_success());
        assert!(Outcome::AlreadyExists.is_success());
    }

    #[test]
    fn test_endpoint_paths() {
        let rpc = EndpointStrategy::Rpc {
            function: "sql_exec".into(),
        };
        assert_eq!(rpc.path(), "/rest/v1/rpc/sql_exec");
        assert_eq!(EndpointStrategy::Rest.path(), "/rest/v1/?select=*");
    }
}

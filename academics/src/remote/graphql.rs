//! Minimal GraphQL-over-HTTP client shared by the service adapters.

use super::{RemoteError, RemoteResult, RemoteService};
use crate::types::SubjectId;
use crate::metrics::REMOTE_QUERIES_TOTAL;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Serialize)]
struct GraphqlRequest<'a, V: Serialize> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// GraphQL endpoint bound to one remote service.
#[derive(Clone, Debug)]
pub struct GraphqlClient {
    http: Client,
    endpoint: String,
    service: RemoteService,
}

impl GraphqlClient {
    /// Client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Unreachable`] if the HTTP client cannot be built.
    pub fn new(
        service: RemoteService,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unreachable {
                service,
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            service,
        })
    }

    /// Service this client talks to
    #[must_use]
    pub const fn service(&self) -> RemoteService {
        self.service
    }

    /// Endpoint URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run `query` and decode `data` into `T`.
    ///
    /// # Errors
    ///
    /// Any [`RemoteError`] kind, classified as described in the module docs.
    #[tracing::instrument(
        skip(self, subject, query, variables),
        fields(service = self.service.label(), subject = %subject)
    )]
    pub async fn query<T, V>(
        &self,
        operation: &'static str,
        subject: &SubjectId,
        query: &str,
        variables: V,
    ) -> RemoteResult<T>
    where
        T: DeserializeOwned,
        V: Serialize + Send,
    {
        let started = Instant::now();
        let result = self.execute(query, variables).await;
        let elapsed_ms = started.elapsed().as_millis();

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        metrics::counter!(
            REMOTE_QUERIES_TOTAL,
            "service" => self.service.label(),
            "outcome" => outcome
        )
        .increment(1);

        match &result {
            Ok(_) => tracing::debug!(operation, elapsed_ms, "remote query succeeded"),
            Err(e) => tracing::warn!(operation, elapsed_ms, outcome, error = %e, "remote query failed"),
        }

        result
    }

    async fn execute<T, V>(&self, query: &str, variables: V) -> RemoteResult<T>
    where
        T: DeserializeOwned,
        V: Serialize + Send,
    {
        let service = self.service;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| RemoteError::Unreachable {
                service,
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| RemoteError::Unreachable {
            service,
            detail: e.to_string(),
        })?;

        let parsed: GraphqlResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if status.is_server_error() => {
                return Err(RemoteError::Unreachable {
                    service,
                    detail: format!("HTTP {status}"),
                });
            },
            Err(e) => {
                return Err(RemoteError::MalformedResponse {
                    service,
                    detail: format!("HTTP {status}: {e}"),
                });
            },
        };

        if let Some(first) = parsed.errors.into_iter().next() {
            return Err(RemoteError::ApplicationRejected {
                service,
                message: first.message,
            });
        }

        if status.is_server_error() {
            return Err(RemoteError::Unreachable {
                service,
                detail: format!("HTTP {status}"),
            });
        }

        let data = parsed.data.ok_or_else(|| RemoteError::MalformedResponse {
            service,
            detail: "response carries neither data nor errors".to_string(),
        })?;

        serde_json::from_value(data).map_err(|e| RemoteError::MalformedResponse {
            service,
            detail: e.to_string(),
        })
    }
}

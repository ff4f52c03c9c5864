//! Finance service adapter: tuition payment status.

use super::{GraphqlClient, RemoteResult, TuitionLookup};
use crate::types::{SubjectId, TuitionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CHECK_TUITION: &str = r"
query CheckTuitionStatus($nim: String!) {
  checkTuitionStatus(nim: $nim) {
    status
  }
}";

#[derive(Serialize)]
struct Variables<'a> {
    nim: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    check_tuition_status: TuitionPayload,
}

#[derive(Deserialize)]
struct TuitionPayload {
    status: String,
}

/// [`TuitionLookup`] backed by the finance GraphQL API
#[derive(Clone, Debug)]
pub struct FinanceClient {
    graphql: GraphqlClient,
}

impl FinanceClient {
    /// Wrap a GraphQL client pointed at the finance service
    #[must_use]
    pub const fn new(graphql: GraphqlClient) -> Self {
        Self { graphql }
    }
}

#[async_trait]
impl TuitionLookup for FinanceClient {
    async fn tuition_status(&self, subject: &SubjectId) -> RemoteResult<TuitionStatus> {
        let data: Data = self
            .graphql
            .query(
                "checkTuitionStatus",
                subject,
                CHECK_TUITION,
                Variables {
                    nim: subject.as_str(),
                },
            )
            .await?;

        Ok(TuitionStatus::from_remote(&data.check_tuition_status.status))
    }
}

//! Library adapter: clearance ("bebas pustaka") state.

use super::{ClearanceLookup, GraphqlClient, RemoteResult};
use crate::types::{LibraryClearance, SubjectId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CHECK_CLEARANCE: &str = r"
query CheckLibraryClearance($nim: String!) {
  checkLibraryClearance(nim: $nim) {
    isClearanceApproved
    reason
  }
}";

#[derive(Serialize)]
struct Variables<'a> {
    nim: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Data {
    check_library_clearance: Option<ClearancePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearancePayload {
    #[serde(default)]
    is_clearance_approved: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
}

/// [`ClearanceLookup`] backed by the library GraphQL API
#[derive(Clone, Debug)]
pub struct LibraryClient {
    graphql: GraphqlClient,
}

impl LibraryClient {
    /// Wrap a GraphQL client pointed at the library service
    #[must_use]
    pub const fn new(graphql: GraphqlClient) -> Self {
        Self { graphql }
    }
}

#[async_trait]
impl ClearanceLookup for LibraryClient {
    async fn library_clearance(
        &self,
        subject: &SubjectId,
    ) -> RemoteResult<Option<LibraryClearance>> {
        let data: Data = self
            .graphql
            .query(
                "checkLibraryClearance",
                subject,
                CHECK_CLEARANCE,
                Variables {
                    nim: subject.as_str(),
                },
            )
            .await?;

        Ok(data.check_library_clearance.map(|c| LibraryClearance {
            approved: c.is_clearance_approved.unwrap_or(false),
            reason: c.reason,
        }))
    }
}

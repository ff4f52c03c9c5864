//! Student service adapter: profile and academic standing.

use super::{GraphqlClient, RemoteError, RemoteResult, StandingLookup};
use crate::types::{AcademicStanding, StudentProfile, SubjectId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const STUDENT_BY_NIM: &str = r"
query StudentByNim($nim: String!) {
  studentByNim(nim: $nim) {
    nim
    fullName
    major
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
    student_by_nim: Option<StudentPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentPayload {
    nim: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    major: String,
    status: String,
}

/// [`StandingLookup`] backed by the student GraphQL API
#[derive(Clone, Debug)]
pub struct StudentClient {
    graphql: GraphqlClient,
}

impl StudentClient {
    /// Wrap a GraphQL client pointed at the student service
    #[must_use]
    pub const fn new(graphql: GraphqlClient) -> Self {
        Self { graphql }
    }
}

#[async_trait]
impl StandingLookup for StudentClient {
    async fn student_profile(&self, subject: &SubjectId) -> RemoteResult<StudentProfile> {
        let data: Data = self
            .graphql
            .query(
                "studentByNim",
                subject,
                STUDENT_BY_NIM,
                Variables {
                    nim: subject.as_str(),
                },
            )
            .await?;

        // A null student is the service saying it has no such record.
        let student = data
            .student_by_nim
            .ok_or_else(|| RemoteError::ApplicationRejected {
                service: self.graphql.service(),
                message: format!("{subject} not found in {}", self.graphql.service()),
            })?;

        Ok(StudentProfile {
            subject: SubjectId::new(student.nim),
            name: student.full_name,
            program: student.major,
            standing: AcademicStanding::from_remote(&student.status),
        })
    }
}

//! Remote capability lookups.
//!
//! Three independently-owned services decide parts of a student's
//! eligibility. Each is reached through a narrow trait so the orchestrator can
//! run against GraphQL clients in production and scripted doubles in tests.
//!
//! Every failure is classified into one of three kinds:
//!
//! - [`RemoteError::Unreachable`]: transport failure, timeout or 5xx
//! - [`RemoteError::ApplicationRejected`]: the service answered with an
//!   application error; its message is surfaced verbatim
//! - [`RemoteError::MalformedResponse`]: the answer could not be understood
//!
//! None of them is ever treated as a pass.

use crate::types::{LibraryClearance, StudentProfile, SubjectId, TuitionStatus};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

mod finance;
mod graphql;
mod library;
mod student;

pub use finance::FinanceClient;
pub use graphql::GraphqlClient;
pub use library::LibraryClient;
pub use student::StudentClient;

/// Which remote service a call went to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteService {
    /// Tuition payments
    Finance,
    /// Student master data
    Student,
    /// Library clearance
    Library,
}

impl RemoteService {
    /// Metric/log label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Finance => "finance",
            Self::Student => "student",
            Self::Library => "library",
        }
    }
}

impl fmt::Display for RemoteService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finance => f.write_str("Finance Service"),
            Self::Student => f.write_str("Student Service"),
            Self::Library => f.write_str("Library Service"),
        }
    }
}

/// A remote lookup that did not produce usable data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transport failure, timeout or server-side failure
    #[error("{service} is unavailable: {detail}")]
    Unreachable {
        /// Service that failed
        service: RemoteService,
        /// Underlying cause
        detail: String,
    },

    /// The service reported an application error
    #[error("{message}")]
    ApplicationRejected {
        /// Service that rejected
        service: RemoteService,
        /// First error message as returned by the service
        message: String,
    },

    /// The response shape was not understood
    #[error("{service} returned a malformed response: {detail}")]
    MalformedResponse {
        /// Service that answered
        service: RemoteService,
        /// What was wrong
        detail: String,
    },
}

impl RemoteError {
    /// Service the error came from
    #[must_use]
    pub const fn service(&self) -> RemoteService {
        match self {
            Self::Unreachable { service, .. }
            | Self::ApplicationRejected { service, .. }
            | Self::MalformedResponse { service, .. } => *service,
        }
    }

    /// Outcome label for metrics
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "unreachable",
            Self::ApplicationRejected { .. } => "rejected",
            Self::MalformedResponse { .. } => "malformed",
        }
    }
}

/// Result alias for remote lookups
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Tuition payment status for a student
#[async_trait]
pub trait TuitionLookup: Send + Sync {
    /// Current tuition status
    async fn tuition_status(&self, subject: &SubjectId) -> RemoteResult<TuitionStatus>;
}

/// Student profile and academic standing
#[async_trait]
pub trait StandingLookup: Send + Sync {
    /// Profile including academic standing
    async fn student_profile(&self, subject: &SubjectId) -> RemoteResult<StudentProfile>;
}

/// Library clearance state
#[async_trait]
pub trait ClearanceLookup: Send + Sync {
    /// Clearance, or `None` when the library holds no data for the student
    async fn library_clearance(&self, subject: &SubjectId)
    -> RemoteResult<Option<LibraryClearance>>;
}

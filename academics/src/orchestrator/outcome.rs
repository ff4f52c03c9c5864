//! Terminal results of a transaction.

use crate::access::AccessDenied;
use crate::records::RecordError;
use crate::remote::RemoteError;
use crate::rules::{GateDenial, ValidationError};
use crate::types::{CommittedRecord, RecordId, RecordKind};
use thiserror::Error;

/// How a transaction ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every gate passed and the record was written
    Succeeded(CommittedRecord),
    /// The caller or the data did not qualify
    Denied(Denial),
    /// Infrastructure prevented a decision
    Failed(Failure),
}

impl Outcome {
    /// Metric label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Denied(_) => "denied",
            Self::Failed(_) => "failed",
        }
    }

    /// Committed record, if the transaction succeeded
    #[must_use]
    pub const fn record(&self) -> Option<&CommittedRecord> {
        match self {
            Self::Succeeded(record) => Some(record),
            _ => None,
        }
    }

    /// Whether the transaction succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Reason a transaction was refused
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Denial {
    /// No identity
    #[error("authentication required")]
    Unauthenticated,

    /// Identity lacks the required role
    #[error("administrator role required")]
    Forbidden,

    /// Malformed input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A precondition gate refused
    #[error(transparent)]
    Precondition(#[from] GateDenial),

    /// Uniqueness or revision conflict at commit
    #[error("{0}")]
    Conflict(String),

    /// Admin update named a record that does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of record
        kind: RecordKind,
        /// Requested identifier
        id: RecordId,
    },
}

impl From<AccessDenied> for Denial {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::Unauthenticated => Self::Unauthenticated,
            AccessDenied::Forbidden => Self::Forbidden,
        }
    }
}

/// Infrastructure failure
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Failure {
    /// A remote service could not produce usable data
    #[error(transparent)]
    DependencyUnavailable(#[from] RemoteError),

    /// Local storage failed
    #[error("storage failure: {0}")]
    Storage(String),

    /// The orchestration deadline expired
    #[error("the transaction did not complete in time")]
    Timeout,

    /// The orchestrator is not accepting work
    #[error("orchestrator unavailable: {0}")]
    Unavailable(String),
}

impl Outcome {
    pub(crate) fn from_commit(result: Result<CommittedRecord, RecordError>) -> Self {
        match result {
            Ok(record) => Self::Succeeded(record),
            Err(RecordError::Conflict(message)) => Self::Denied(Denial::Conflict(message)),
            Err(RecordError::Backend(message)) => Self::Failed(Failure::Storage(message)),
        }
    }
}

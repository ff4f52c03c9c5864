//! Commands, step results and terminal actions of the transaction saga.

use super::Outcome;
use crate::access::AccessContext;
use crate::records::RecordResult;
use crate::remote::RemoteResult;
use crate::types::{
    CommittedRecord, CorrelationId, CourseLoad, CourseLoadDraftItem, ExamRegistration,
    LibraryClearance, RecordId, RecordKind, RunId, StudentProfile, TransactionKind,
    TuitionStatus,
};

/// Everything the transaction reducer reacts to
#[derive(Clone, Debug)]
pub enum TransactionAction {
    // ========== Commands ==========
    /// Register the caller for the final exam
    RegisterExam {
        /// Run identifier
        run: RunId,
        /// Request id for logs
        cid: CorrelationId,
        /// Caller
        access: AccessContext,
        /// Thesis title
        title: String,
    },

    /// Register the caller for graduation in a period
    RegisterGraduation {
        /// Run identifier
        run: RunId,
        /// Request id for logs
        cid: CorrelationId,
        /// Caller
        access: AccessContext,
        /// Graduation period
        period: String,
    },

    /// Submit or replace the caller's course load for a term
    SubmitCourseLoad {
        /// Run identifier
        run: RunId,
        /// Request id for logs
        cid: CorrelationId,
        /// Caller
        access: AccessContext,
        /// Academic term
        term: String,
        /// Courses as submitted
        items: Vec<CourseLoadDraftItem>,
    },

    /// Administrator status change on a record
    UpdateStatus {
        /// Run identifier
        run: RunId,
        /// Request id for logs
        cid: CorrelationId,
        /// Caller
        access: AccessContext,
        /// Kind of record
        kind: RecordKind,
        /// Record to update
        id: RecordId,
        /// New status, unparsed
        status: String,
    },

    // ========== Step results ==========
    /// Student service answered
    StandingFetched {
        /// Run identifier
        run: RunId,
        /// Profile or failure
        result: RemoteResult<StudentProfile>,
    },

    /// Finance service answered
    TuitionFetched {
        /// Run identifier
        run: RunId,
        /// Status or failure
        result: RemoteResult<TuitionStatus>,
    },

    /// Library answered
    ClearanceFetched {
        /// Run identifier
        run: RunId,
        /// Clearance (possibly absent) or failure
        result: RemoteResult<Option<LibraryClearance>>,
    },

    /// Exam registrations of the subject were read
    ExamsLoaded {
        /// Run identifier
        run: RunId,
        /// Registrations, most recent first
        result: RecordResult<Vec<ExamRegistration>>,
    },

    /// Current course load for the term was read
    CourseLoadLoaded {
        /// Run identifier
        run: RunId,
        /// Existing course load, if any
        result: RecordResult<Option<CourseLoad>>,
    },

    /// The write finished; `None` means the record to update was not found
    Committed {
        /// Run identifier
        run: RunId,
        /// Written record
        result: RecordResult<Option<CommittedRecord>>,
    },

    // ========== Terminal ==========
    /// The run's deadline passed
    Expired {
        /// Run identifier
        run: RunId,
    },

    /// The run produced its outcome
    Finished {
        /// Run identifier
        run: RunId,
        /// Request id for logs
        cid: CorrelationId,
        /// Transaction that finished
        kind: TransactionKind,
        /// Result
        outcome: Outcome,
    },
}

impl TransactionAction {
    /// Run this action belongs to
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        match self {
            Self::RegisterExam { run, .. }
            | Self::RegisterGraduation { run, .. }
            | Self::SubmitCourseLoad { run, .. }
            | Self::UpdateStatus { run, .. }
            | Self::StandingFetched { run, .. }
            | Self::TuitionFetched { run, .. }
            | Self::ClearanceFetched { run, .. }
            | Self::ExamsLoaded { run, .. }
            | Self::CourseLoadLoaded { run, .. }
            | Self::Committed { run, .. }
            | Self::Expired { run }
            | Self::Finished { run, .. } => *run,
        }
    }

    /// Request id carried by commands and the terminal action
    #[must_use]
    pub const fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Self::RegisterExam { cid, .. }
            | Self::RegisterGraduation { cid, .. }
            | Self::SubmitCourseLoad { cid, .. }
            | Self::UpdateStatus { cid, .. }
            | Self::Finished { cid, .. } => Some(*cid),
            _ => None,
        }
    }

    /// Whether this is the terminal action of `run`
    #[must_use]
    pub fn finishes(&self, run: RunId) -> bool {
        matches!(self, Self::Finished { run: r, .. } if *r == run)
    }
}

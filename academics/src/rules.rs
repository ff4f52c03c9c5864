//! Eligibility rules.
//!
//! Pure functions over already-fetched remote snapshots and locally read
//! records. No I/O happens here; the orchestrator decides what to fetch and in
//! which order, and stops at the first `Err`.

use crate::types::{
    AcademicStanding, CourseLoadDraftItem, CourseLoadItem, ExamRegistration, ExamStatus,
    LibraryClearance, RecordKind, StudentProfile, TransactionKind, TuitionStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Exam statuses that allow a graduation registration, compared upper-case.
pub const ACCEPTED_EXAM_STATUSES: [&str; 3] = ["PASSED", "APPROVED", "LULUS"];

/// Credit limits applied to course loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Ceiling on the summed credits of one course load
    pub max_total_credits: u32,
    /// Ceiling on the credits of a single course
    pub max_credits_per_course: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_total_credits: 24,
            max_credits_per_course: 6,
        }
    }
}

/// A named gate refused the transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateDenial {
    /// Tuition status is anything but PAID
    #[error("tuition has not been paid (status: {observed})")]
    TuitionNotPaid {
        /// Status reported by the finance service
        observed: TuitionStatus,
    },

    /// The library system returned no clearance data
    #[error("library clearance data not found; clearance is required")]
    ClearanceMissing,

    /// The library system refused clearance
    #[error("library clearance rejected: {}", reason.as_deref().unwrap_or("does not meet library clearance requirements"))]
    ClearanceRejected {
        /// Reason given by the library, if any
        reason: Option<String>,
    },

    /// Academic standing is not ACTIVE
    #[error("{}", standing_message(*transaction, observed))]
    StandingNotActive {
        /// Standing reported by the student service
        observed: AcademicStanding,
        /// Transaction that required the standing
        transaction: TransactionKind,
    },

    /// Graduation attempted without any exam registration
    #[error("no final exam registration found; register for the final exam first")]
    ExamNotRegistered,

    /// Latest exam registration has not reached an accepted status
    #[error("final exam status is not passed or approved (status: {observed}); contact the academic office")]
    ExamNotAccepted {
        /// Status of the most recent exam registration
        observed: ExamStatus,
    },
}

fn standing_message(transaction: TransactionKind, observed: &AcademicStanding) -> String {
    match transaction {
        TransactionKind::SubmitCourseLoad => {
            format!("cannot submit a course load while academic status is {observed}")
        },
        _ => format!("academic status is not active (status: {observed})"),
    }
}

impl GateDenial {
    /// Short gate name for logs and metric labels
    #[must_use]
    pub const fn gate(&self) -> &'static str {
        match self {
            Self::TuitionNotPaid { .. } => "tuition",
            Self::ClearanceMissing | Self::ClearanceRejected { .. } => "clearance",
            Self::StandingNotActive { .. } => "standing",
            Self::ExamNotRegistered | Self::ExamNotAccepted { .. } => "precedence",
        }
    }
}

/// Malformed transaction input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is empty after trimming
    #[error("{field} must not be empty")]
    Blank {
        /// Name of the field
        field: &'static str,
    },

    /// Course load without any course
    #[error("course load is empty; add at least one course")]
    EmptyCourseLoad,

    /// A course code is empty after trimming
    #[error("course code is required (item {position})")]
    EmptyCourseCode {
        /// 1-based position of the item
        position: usize,
    },

    /// The same course appears twice
    #[error("duplicate course in course load: {code}")]
    DuplicateCourseCode {
        /// Normalized course code
        code: String,
    },

    /// Credits outside `1..=max`
    #[error("invalid credits for {code}: {credits} (must be between 1 and {max})")]
    InvalidCredits {
        /// Normalized course code
        code: String,
        /// Credits as submitted
        credits: i64,
        /// Per-course ceiling
        max: u32,
    },

    /// Summed credits over the ceiling
    #[error("total credits ({total}) exceed the maximum ({ceiling})")]
    CreditCeilingExceeded {
        /// Computed total
        total: u64,
        /// Configured ceiling
        ceiling: u32,
    },

    /// Status text the record kind does not know
    #[error("unknown {kind} status: {value}")]
    UnknownStatus {
        /// Record kind being updated
        kind: RecordKind,
        /// Status as submitted
        value: String,
    },
}

/// Passes iff the tuition status is PAID.
///
/// # Errors
///
/// [`GateDenial::TuitionNotPaid`] carrying the observed status.
pub fn tuition_gate(status: &TuitionStatus) -> Result<(), GateDenial> {
    match status {
        TuitionStatus::Paid => Ok(()),
        other => Err(GateDenial::TuitionNotPaid {
            observed: other.clone(),
        }),
    }
}

/// Passes iff clearance data exists and is approved. Missing data is a denial.
///
/// # Errors
///
/// [`GateDenial::ClearanceMissing`] or [`GateDenial::ClearanceRejected`].
pub fn clearance_gate(clearance: Option<&LibraryClearance>) -> Result<(), GateDenial> {
    match clearance {
        None => Err(GateDenial::ClearanceMissing),
        Some(LibraryClearance { approved: true, .. }) => Ok(()),
        Some(LibraryClearance { reason, .. }) => Err(GateDenial::ClearanceRejected {
            reason: reason.clone().filter(|r| !r.trim().is_empty()),
        }),
    }
}

/// Passes iff the academic standing is ACTIVE.
///
/// # Errors
///
/// [`GateDenial::StandingNotActive`] carrying the observed standing.
pub fn standing_gate(
    profile: &StudentProfile,
    transaction: TransactionKind,
) -> Result<(), GateDenial> {
    if profile.standing == AcademicStanding::Active {
        Ok(())
    } else {
        Err(GateDenial::StandingNotActive {
            observed: profile.standing.clone(),
            transaction,
        })
    }
}

/// The most recent exam registration by registration time.
///
/// Ties keep the later element of the slice.
#[must_use]
pub fn latest_exam(exams: &[ExamRegistration]) -> Option<&ExamRegistration> {
    exams.iter().max_by_key(|exam| exam.registered_at)
}

/// Passes iff the latest exam registration has an accepted status.
///
/// # Errors
///
/// [`GateDenial::ExamNotRegistered`] without any exam,
/// [`GateDenial::ExamNotAccepted`] otherwise.
pub fn precedence_gate(latest: Option<&ExamRegistration>) -> Result<(), GateDenial> {
    let Some(exam) = latest else {
        return Err(GateDenial::ExamNotRegistered);
    };

    let normalized = exam.status.as_str().trim().to_uppercase();
    if ACCEPTED_EXAM_STATUSES.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(GateDenial::ExamNotAccepted {
            observed: exam.status.clone(),
        })
    }
}

/// Trimmed value of a required text field.
///
/// # Errors
///
/// [`ValidationError::Blank`] when nothing is left after trimming.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Blank { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Normalize and check a submitted course list, returning items and total.
///
/// Codes are trimmed and upper-cased before the duplicate check. Checks run
/// item by item in submission order, then the total is compared with the
/// ceiling.
///
/// # Errors
///
/// The first [`ValidationError`] found.
pub fn validate_course_load(
    draft: &[CourseLoadDraftItem],
    rules: &RulesConfig,
) -> Result<(Vec<CourseLoadItem>, u32), ValidationError> {
    if draft.is_empty() {
        return Err(ValidationError::EmptyCourseLoad);
    }

    let mut seen = HashSet::with_capacity(draft.len());
    let mut items = Vec::with_capacity(draft.len());
    let mut total: u64 = 0;

    for (index, item) in draft.iter().enumerate() {
        let code = item.course_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::EmptyCourseCode {
                position: index + 1,
            });
        }
        if !seen.insert(code.clone()) {
            return Err(ValidationError::DuplicateCourseCode { code });
        }

        let credits = u32::try_from(item.credits)
            .ok()
            .filter(|c| (1..=rules.max_credits_per_course).contains(c))
            .ok_or_else(|| ValidationError::InvalidCredits {
                code: code.clone(),
                credits: item.credits,
                max: rules.max_credits_per_course,
            })?;

        total += u64::from(credits);
        items.push(CourseLoadItem {
            course_code: code,
            course_name: item
                .course_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            credits,
        });
    }

    if total > u64::from(rules.max_total_credits) {
        return Err(ValidationError::CreditCeilingExceeded {
            total,
            ceiling: rules.max_total_credits,
        });
    }

    let total = u32::try_from(total).map_err(|_| ValidationError::CreditCeilingExceeded {
        total,
        ceiling: rules.max_total_credits,
    })?;

    Ok((items, total))
}

//! Domain types for the academics service.
//!
//! Local records (exam registrations, graduation registrations, course loads)
//! are owned by this service. Remote snapshots (standing, tuition, clearance)
//! are read fresh for every run and never persisted.

use crate::rules::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Student number identifying the subject of a transaction
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a `SubjectId`, trimming surrounding whitespace
    #[must_use]
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    /// The student number
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty after trimming
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a locally stored record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random `RecordId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RecordId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied request identifier, carried through logs only
///
/// Taken from the `X-Correlation-ID` header, so two requests may share one.
/// Runs are keyed by [`RunId`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Creates a new random `CorrelationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `CorrelationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of one orchestration run, generated per command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random `RunId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Record kinds and transactions
// ============================================================================

/// The three kinds of locally owned records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    /// Final exam (sidang) registration
    Exam,
    /// Graduation (wisuda) registration
    Graduation,
    /// Course load (KRS)
    CourseLoad,
}

impl RecordKind {
    /// Stable lowercase name, used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exam => "exam",
            Self::Graduation => "graduation",
            Self::CourseLoad => "course_load",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exam => "exam registration",
            Self::Graduation => "graduation registration",
            Self::CourseLoad => "course load",
        })
    }
}

/// Transaction types handled by the orchestrator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    /// Register for the final exam
    RegisterExam,
    /// Register for graduation in a period
    RegisterGraduation,
    /// Submit or resubmit the course load for a term
    SubmitCourseLoad,
    /// Administrative status change on an existing record
    UpdateStatus(RecordKind),
}

impl TransactionKind {
    /// Stable name, used in logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RegisterExam => "register_exam",
            Self::RegisterGraduation => "register_graduation",
            Self::SubmitCourseLoad => "submit_course_load",
            Self::UpdateStatus(RecordKind::Exam) => "update_exam_status",
            Self::UpdateStatus(RecordKind::Graduation) => "update_graduation_status",
            Self::UpdateStatus(RecordKind::CourseLoad) => "update_course_load_status",
        }
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Exam registration status
///
/// Free text set by administrators, stored upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamStatus(String);

impl ExamStatus {
    /// Status of a freshly created registration
    pub const REGISTERED: &'static str = "REGISTERED";

    /// The initial status
    #[must_use]
    pub fn registered() -> Self {
        Self(Self::REGISTERED.to_string())
    }

    /// Normalized (upper-case) status text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExamStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Blank { field: "status" });
        }
        Ok(Self(trimmed.to_uppercase()))
    }
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Graduation registration status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraduationStatus {
    /// Registered, awaiting review
    Registered,
    /// Approved by the academic office
    Approved,
    /// Rejected by the academic office
    Rejected,
    /// Ceremony completed
    Finished,
}

impl GraduationStatus {
    /// Upper-case wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Finished => "FINISHED",
        }
    }
}

impl FromStr for GraduationStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_uppercase().as_str() {
            "REGISTERED" => Ok(Self::Registered),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "FINISHED" => Ok(Self::Finished),
            "" => Err(ValidationError::Blank { field: "status" }),
            _ => Err(ValidationError::UnknownStatus {
                kind: RecordKind::Graduation,
                value: raw.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for GraduationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Course load status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseLoadStatus {
    /// Submitted by the student, awaiting advisor review
    Submitted,
    /// Approved by the advisor
    Approved,
    /// Rejected by the advisor
    Rejected,
}

impl CourseLoadStatus {
    /// Upper-case wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for CourseLoadStatus {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_uppercase().as_str() {
            "SUBMITTED" => Ok(Self::Submitted),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "" => Err(ValidationError::Blank { field: "status" }),
            _ => Err(ValidationError::UnknownStatus {
                kind: RecordKind::CourseLoad,
                value: raw.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for CourseLoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated status for any record kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordStatus {
    /// Exam registration status
    Exam(ExamStatus),
    /// Graduation registration status
    Graduation(GraduationStatus),
    /// Course load status
    CourseLoad(CourseLoadStatus),
}

impl RecordStatus {
    /// Parse raw admin input for the given record kind
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for blank input or a status the record kind
    /// does not know.
    pub fn parse(kind: RecordKind, raw: &str) -> Result<Self, ValidationError> {
        match kind {
            RecordKind::Exam => raw.parse().map(Self::Exam),
            RecordKind::Graduation => raw.parse().map(Self::Graduation),
            RecordKind::CourseLoad => raw.parse().map(Self::CourseLoad),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exam(status) => status.fmt(f),
            Self::Graduation(status) => status.fmt(f),
            Self::CourseLoad(status) => status.fmt(f),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Final exam registration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRegistration {
    /// Record identifier
    pub id: RecordId,
    /// Registering student
    pub subject: SubjectId,
    /// Thesis or exam title
    pub title: String,
    /// Current status
    pub status: ExamStatus,
    /// When the registration was created
    pub registered_at: DateTime<Utc>,
}

/// Graduation registration, unique per (subject, period)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationRegistration {
    /// Record identifier
    pub id: RecordId,
    /// Registering student
    pub subject: SubjectId,
    /// Graduation period, e.g. `2025/2026-Genap`
    pub period: String,
    /// Current status
    pub status: GraduationStatus,
    /// When the registration was created
    pub registered_at: DateTime<Utc>,
}

/// One course within a course load
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLoadItem {
    /// Normalized (trimmed, upper-case) course code
    pub course_code: String,
    /// Course name, empty when not given
    pub course_name: String,
    /// Credit units (SKS)
    pub credits: u32,
}

/// Course load for one term, unique per (subject, term)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLoad {
    /// Record identifier
    pub id: RecordId,
    /// Submitting student
    pub subject: SubjectId,
    /// Academic term, e.g. `2025/2026-Ganjil`
    pub term: String,
    /// Courses in submission order
    pub items: Vec<CourseLoadItem>,
    /// Sum of item credits
    pub total_credits: u32,
    /// Current status
    pub status: CourseLoadStatus,
    /// Last (re)submission time
    pub submitted_at: DateTime<Utc>,
    /// First creation time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, 1 on creation
    pub revision: i64,
}

/// Course load item as submitted, before validation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseLoadDraftItem {
    /// Course code as typed
    pub course_code: String,
    /// Optional course name
    #[serde(default)]
    pub course_name: Option<String>,
    /// Credits as typed
    pub credits: i64,
}

/// Validated course load content ready to be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseLoadSubmission {
    /// Submitting student
    pub subject: SubjectId,
    /// Academic term
    pub term: String,
    /// Normalized items
    pub items: Vec<CourseLoadItem>,
    /// Sum of item credits
    pub total_credits: u32,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
}

/// A record committed by a transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "kebab-case")]
pub enum CommittedRecord {
    /// Exam registration
    Exam(ExamRegistration),
    /// Graduation registration
    Graduation(GraduationRegistration),
    /// Course load
    CourseLoad(CourseLoad),
}

impl CommittedRecord {
    /// Identifier of the committed record
    #[must_use]
    pub const fn id(&self) -> RecordId {
        match self {
            Self::Exam(r) => r.id,
            Self::Graduation(r) => r.id,
            Self::CourseLoad(r) => r.id,
        }
    }

    /// Kind of the committed record
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Exam(_) => RecordKind::Exam,
            Self::Graduation(_) => RecordKind::Graduation,
            Self::CourseLoad(_) => RecordKind::CourseLoad,
        }
    }
}

// ============================================================================
// Remote snapshots
// ============================================================================

/// Academic standing reported by the student service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcademicStanding {
    /// Enrolled and active
    Active,
    /// Already graduated
    Graduated,
    /// Dropped out
    Dropout,
    /// On leave
    Leave,
    /// A value this service does not recognise
    Other(String),
}

impl AcademicStanding {
    /// Map the remote status text
    ///
    /// Only the exact upper-case names are recognised. Anything else is kept
    /// verbatim in [`AcademicStanding::Other`] and never counts as active.
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim() {
            "ACTIVE" => Self::Active,
            "GRADUATED" => Self::Graduated,
            "DROPOUT" => Self::Dropout,
            "LEAVE" => Self::Leave,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for AcademicStanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::Graduated => f.write_str("GRADUATED"),
            Self::Dropout => f.write_str("DROPOUT"),
            Self::Leave => f.write_str("LEAVE"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Student profile from the student service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Student number
    pub subject: SubjectId,
    /// Full name
    pub name: String,
    /// Study program (major)
    pub program: String,
    /// Academic standing
    pub standing: AcademicStanding,
}

/// Tuition payment status reported by the finance service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TuitionStatus {
    /// No payment recorded
    Unpaid,
    /// Payment submitted, not yet verified
    Pending,
    /// Payment verified
    Paid,
    /// Payment proof rejected
    Rejected,
    /// A value this service does not recognise
    Other(String),
}

impl TuitionStatus {
    /// Map the remote status text
    ///
    /// Matching is exact, so `"paid"` is [`TuitionStatus::Other`] and fails
    /// the tuition gate.
    #[must_use]
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim() {
            "UNPAID" => Self::Unpaid,
            "PENDING" => Self::Pending,
            "PAID" => Self::Paid,
            "REJECTED" => Self::Rejected,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for TuitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unpaid => f.write_str("UNPAID"),
            Self::Pending => f.write_str("PENDING"),
            Self::Paid => f.write_str("PAID"),
            Self::Rejected => f.write_str("REJECTED"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// Library clearance reported by the library system
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryClearance {
    /// Whether the library approved clearance
    pub approved: bool,
    /// Reason given by the library, usually on rejection
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_status_is_normalized() {
        let status: ExamStatus = "  approved ".parse().unwrap_or_else(|_| ExamStatus::registered());
        assert_eq!(status.as_str(), "APPROVED");
        assert!(matches!(
            "   ".parse::<ExamStatus>(),
            Err(ValidationError::Blank { field: "status" })
        ));
    }

    #[test]
    fn graduation_status_rejects_unknown_values() {
        assert_eq!("finished".parse::<GraduationStatus>().ok(), Some(GraduationStatus::Finished));
        assert!(matches!(
            "PASSED".parse::<GraduationStatus>(),
            Err(ValidationError::UnknownStatus { kind: RecordKind::Graduation, .. })
        ));
    }

    #[test]
    fn remote_values_match_exactly() {
        assert_eq!(AcademicStanding::from_remote(" ACTIVE "), AcademicStanding::Active);
        assert_eq!(
            AcademicStanding::from_remote("active"),
            AcademicStanding::Other("active".to_string())
        );
        assert_eq!(TuitionStatus::from_remote("PAID"), TuitionStatus::Paid);
        assert_eq!(
            TuitionStatus::from_remote("Paid"),
            TuitionStatus::Other("Paid".to_string())
        );
        assert_eq!(TuitionStatus::from_remote("lunas").to_string(), "lunas");
    }

    #[test]
    fn record_status_parses_per_kind() {
        assert_eq!(
            RecordStatus::parse(RecordKind::CourseLoad, "approved").ok(),
            Some(RecordStatus::CourseLoad(CourseLoadStatus::Approved))
        );
        assert!(RecordStatus::parse(RecordKind::Exam, "lulus").is_ok());
        assert!(RecordStatus::parse(RecordKind::CourseLoad, "FINISHED").is_err());
    }

    #[test]
    fn subject_id_is_trimmed() {
        assert_eq!(SubjectId::new("  A123 ").as_str(), "A123");
        assert!(SubjectId::new("   ").is_empty());
    }
}

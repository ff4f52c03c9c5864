//! Transaction saga reducer.
//!
//! Each command opens a run keyed by a fresh [`RunId`]; the caller's
//! correlation id only travels along for logging. A run walks a fixed
//! sequence of steps; every step is one effect whose result comes back as an
//! action, is checked by the matching gate, and either advances the run or
//! ends it. The first denial or failure wins and later steps never execute.
//!
//! | Transaction  | Steps                                                      |
//! |--------------|------------------------------------------------------------|
//! | Exam         | tuition → clearance → commit                               |
//! | Graduation   | standing → tuition → clearance → exams → commit            |
//! | Course load  | standing → tuition → (validate) → current load → commit    |
//! | Status       | commit                                                     |
//!
//! Every run also schedules an [`TransactionAction::Expired`] after the
//! configured deadline. A run that is still waiting on a lookup when it
//! fires fails with [`Failure::Timeout`]; a run already committing is left to
//! finish, because the write may have landed.

use super::environment::OrchestratorEnvironment;
use super::{Denial, Failure, Outcome, TransactionAction};
use crate::metrics::{GATE_DENIALS_TOTAL, TRANSACTION_DURATION_SECONDS, TRANSACTIONS_TOTAL};
use crate::rules::{
    clearance_gate, latest_exam, precedence_gate, required_text, standing_gate, tuition_gate,
    validate_course_load, GateDenial,
};
use crate::types::{
    CommittedRecord, CorrelationId, CourseLoadDraftItem, CourseLoadItem, CourseLoadSubmission,
    ExamRegistration, ExamStatus, GraduationRegistration, GraduationStatus, RecordId,
    RecordStatus, RunId, SubjectId, TransactionKind,
};
use academic_gate_core::{effect::Effect, reducer::Reducer, smallvec, DateTime, SmallVec, Utc};
use std::collections::HashMap;

// ============================================================================
// State
// ============================================================================

/// Step a run is waiting on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Student service lookup
    Standing,
    /// Finance service lookup
    Tuition,
    /// Library lookup
    Clearance,
    /// Exam history read
    Exams,
    /// Current course load read
    CourseLoad,
    /// Local write
    Commit,
}

/// What the run will write once every gate passed
#[derive(Clone, Debug)]
pub enum Request {
    /// New exam registration
    Exam {
        /// Trimmed title
        title: String,
    },
    /// New graduation registration
    Graduation {
        /// Trimmed period
        period: String,
    },
    /// Course load for a term
    CourseLoad {
        /// Trimmed term
        term: String,
        /// Items as submitted
        draft: Vec<CourseLoadDraftItem>,
        /// Normalized items and total, once validated
        validated: Option<(Vec<CourseLoadItem>, u32)>,
        /// Revision read before the write, `None` when no record existed
        observed_revision: Option<i64>,
    },
    /// Status change
    Status {
        /// Record to update
        id: RecordId,
        /// Parsed status
        status: RecordStatus,
    },
}

/// One in-flight transaction
#[derive(Clone, Debug)]
pub struct Run {
    /// Request id of the command that opened the run
    pub cid: CorrelationId,
    /// Transaction type
    pub kind: TransactionKind,
    /// Subject the transaction acts on, or the administrator for updates
    pub subject: SubjectId,
    /// Pending write
    pub request: Request,
    /// Step awaited
    pub step: Step,
    /// When the command arrived
    pub started_at: DateTime<Utc>,
}

/// Runs currently in flight
#[derive(Clone, Debug, Default)]
pub struct OrchestratorState {
    /// Active runs
    pub runs: HashMap<RunId, Run>,
}

impl OrchestratorState {
    /// Number of runs in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.runs.len()
    }

    /// Whether `run` is still active
    #[must_use]
    pub fn is_running(&self, run: &RunId) -> bool {
        self.runs.contains_key(run)
    }

    /// Step `run` is waiting on, `None` once it concluded
    #[must_use]
    pub fn step_of(&self, run: &RunId) -> Option<Step> {
        self.runs.get(run).map(|r| r.step)
    }
}

// ============================================================================
// Reducer
// ============================================================================

type Effects = SmallVec<[Effect<TransactionAction>; 4]>;

/// Saga coordinator for the four transaction types
#[derive(Clone, Debug, Default)]
pub struct TransactionReducer;

impl TransactionReducer {
    /// Creates a new `TransactionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// First step of each transaction type
    const fn first_step(kind: TransactionKind) -> Step {
        match kind {
            TransactionKind::RegisterExam => Step::Tuition,
            TransactionKind::RegisterGraduation | TransactionKind::SubmitCourseLoad => {
                Step::Standing
            },
            TransactionKind::UpdateStatus(_) => Step::Commit,
        }
    }

    /// Step following `step` for `kind`
    const fn next_step(kind: TransactionKind, step: Step) -> Step {
        match (kind, step) {
            (TransactionKind::RegisterGraduation | TransactionKind::SubmitCourseLoad, Step::Standing) => {
                Step::Tuition
            },
            (TransactionKind::RegisterExam | TransactionKind::RegisterGraduation, Step::Tuition) => {
                Step::Clearance
            },
            (TransactionKind::SubmitCourseLoad, Step::Tuition) => Step::CourseLoad,
            (TransactionKind::RegisterGraduation, Step::Clearance) => Step::Exams,
            _ => Step::Commit,
        }
    }

    /// Terminal effect: hand the outcome to the waiter, then log it
    fn finish(
        env: &OrchestratorEnvironment,
        run: RunId,
        cid: CorrelationId,
        kind: TransactionKind,
        outcome: Outcome,
    ) -> Effects {
        let completions = env.completions.clone();
        smallvec![Effect::Future(Box::pin(async move {
            if !completions.complete(run, outcome.clone()) {
                tracing::debug!(%run, %cid, "outcome produced with no waiter");
            }
            Some(TransactionAction::Finished {
                run,
                cid,
                kind,
                outcome,
            })
        }))]
    }

    /// Open a run and start its first step together with its deadline
    fn begin(
        state: &mut OrchestratorState,
        env: &OrchestratorEnvironment,
        id: RunId,
        cid: CorrelationId,
        kind: TransactionKind,
        subject: SubjectId,
        request: Request,
    ) -> Effects {
        // Run ids are minted per command; a repeat is a replayed action.
        if state.runs.contains_key(&id) {
            tracing::warn!(run = %id, %cid, kind = kind.as_str(), "replayed command ignored");
            return SmallVec::new();
        }

        let run = Run {
            cid,
            kind,
            subject,
            request,
            step: Self::first_step(kind),
            started_at: env.clock.now(),
        };
        tracing::debug!(run = %id, %cid, kind = kind.as_str(), subject = %run.subject, "transaction started");

        let first = Self::perform(env, id, &run);
        state.runs.insert(id, run);

        smallvec![
            first,
            Effect::Delay {
                duration: env.deadline,
                action: Box::new(TransactionAction::Expired { run: id }),
            }
        ]
    }

    /// Kind of `run` if it is waiting on `step`
    fn awaiting(state: &OrchestratorState, run: RunId, step: Step) -> Option<TransactionKind> {
        match state.runs.get(&run) {
            Some(r) if r.step == step => Some(r.kind),
            Some(r) => {
                tracing::warn!(%run, cid = %r.cid, expected = ?r.step, got = ?step, "out-of-order step result ignored");
                None
            },
            None => {
                tracing::debug!(%run, step = ?step, "result for finished run ignored");
                None
            },
        }
    }

    /// Remove the run and emit its outcome
    fn conclude(
        state: &mut OrchestratorState,
        env: &OrchestratorEnvironment,
        id: RunId,
        outcome: Outcome,
    ) -> Effects {
        let Some(run) = state.runs.remove(&id) else {
            return SmallVec::new();
        };

        if let Ok(elapsed) = (env.clock.now() - run.started_at).to_std() {
            metrics::histogram!(TRANSACTION_DURATION_SECONDS, "kind" => run.kind.as_str())
                .record(elapsed.as_secs_f64());
        }

        Self::finish(env, id, run.cid, run.kind, outcome)
    }

    /// Conclude with a gate denial
    fn deny(
        state: &mut OrchestratorState,
        env: &OrchestratorEnvironment,
        id: RunId,
        denial: GateDenial,
    ) -> Effects {
        Self::conclude(state, env, id, Outcome::Denied(Denial::Precondition(denial)))
    }

    /// Move `id` to its next step and start it
    fn advance(
        state: &mut OrchestratorState,
        env: &OrchestratorEnvironment,
        id: RunId,
    ) -> Effects {
        let Some(run) = state.runs.get_mut(&id) else {
            return SmallVec::new();
        };

        let next = Self::next_step(run.kind, run.step);

        // Course-load content is checked once the remote gates passed.
        if next == Step::CourseLoad {
            if let Request::CourseLoad { draft, validated, .. } = &mut run.request {
                match validate_course_load(draft, &env.rules) {
                    Ok(valid) => *validated = Some(valid),
                    Err(error) => {
                        return Self::conclude(state, env, id, Outcome::Denied(error.into()));
                    },
                }
            }
        }

        run.step = next;
        smallvec![Self::perform(env, id, run)]
    }

    /// Effect executing the current step of `run`
    fn perform(env: &OrchestratorEnvironment, id: RunId, run: &Run) -> Effect<TransactionAction> {
        let subject = run.subject.clone();

        match run.step {
            Step::Standing => {
                let standing = env.standing.clone();
                Effect::Future(Box::pin(async move {
                    let result = standing.student_profile(&subject).await;
                    Some(TransactionAction::StandingFetched { run: id, result })
                }))
            },
            Step::Tuition => {
                let tuition = env.tuition.clone();
                Effect::Future(Box::pin(async move {
                    let result = tuition.tuition_status(&subject).await;
                    Some(TransactionAction::TuitionFetched { run: id, result })
                }))
            },
            Step::Clearance => {
                let clearance = env.clearance.clone();
                Effect::Future(Box::pin(async move {
                    let result = clearance.library_clearance(&subject).await;
                    Some(TransactionAction::ClearanceFetched { run: id, result })
                }))
            },
            Step::Exams => {
                let records = env.records.clone();
                Effect::Future(Box::pin(async move {
                    let result = records.list_exams(&subject).await;
                    Some(TransactionAction::ExamsLoaded { run: id, result })
                }))
            },
            Step::CourseLoad => {
                let records = env.records.clone();
                let term = match &run.request {
                    Request::CourseLoad { term, .. } => term.clone(),
                    _ => String::new(),
                };
                Effect::Future(Box::pin(async move {
                    let result = records.find_course_load(&subject, &term).await;
                    Some(TransactionAction::CourseLoadLoaded { run: id, result })
                }))
            },
            Step::Commit => Self::commit(env, id, subject, run.request.clone()),
        }
    }

    /// Effect writing the record described by `request`
    fn commit(
        env: &OrchestratorEnvironment,
        id: RunId,
        subject: SubjectId,
        request: Request,
    ) -> Effect<TransactionAction> {
        let records = env.records.clone();
        let now = env.clock.now();

        Effect::Future(Box::pin(async move {
            let result = match request {
                Request::Exam { title } => records
                    .insert_exam(ExamRegistration {
                        id: RecordId::new(),
                        subject,
                        title,
                        status: ExamStatus::registered(),
                        registered_at: now,
                    })
                    .await
                    .map(|r| Some(CommittedRecord::Exam(r))),
                Request::Graduation { period } => records
                    .create_graduation(GraduationRegistration {
                        id: RecordId::new(),
                        subject,
                        period,
                        status: GraduationStatus::Registered,
                        registered_at: now,
                    })
                    .await
                    .map(|r| Some(CommittedRecord::Graduation(r))),
                Request::CourseLoad {
                    term,
                    validated: Some((items, total_credits)),
                    observed_revision,
                    ..
                } => records
                    .upsert_course_load(
                        CourseLoadSubmission {
                            subject,
                            term,
                            items,
                            total_credits,
                            submitted_at: now,
                        },
                        observed_revision,
                    )
                    .await
                    .map(|r| Some(CommittedRecord::CourseLoad(r))),
                Request::CourseLoad { validated: None, .. } => {
                    Err(crate::records::RecordError::Backend(
                        "course load reached commit without validation".to_string(),
                    ))
                },
                Request::Status { id: record, status } => match status {
                    RecordStatus::Exam(status) => records
                        .set_exam_status(record, status)
                        .await
                        .map(|r| r.map(CommittedRecord::Exam)),
                    RecordStatus::Graduation(status) => records
                        .set_graduation_status(record, status)
                        .await
                        .map(|r| r.map(CommittedRecord::Graduation)),
                    RecordStatus::CourseLoad(status) => records
                        .set_course_load_status(record, status, now)
                        .await
                        .map(|r| r.map(CommittedRecord::CourseLoad)),
                },
            };
            Some(TransactionAction::Committed { run: id, result })
        }))
    }

    fn record_finish(run: RunId, cid: CorrelationId, kind: TransactionKind, outcome: &Outcome) {
        metrics::counter!(
            TRANSACTIONS_TOTAL,
            "kind" => kind.as_str(),
            "outcome" => outcome.label()
        )
        .increment(1);

        match outcome {
            Outcome::Succeeded(record) => {
                tracing::info!(%run, %cid, kind = kind.as_str(), record = %record.id(), "transaction committed");
            },
            Outcome::Denied(denial) => {
                if let Denial::Precondition(gate) = denial {
                    metrics::counter!(GATE_DENIALS_TOTAL, "gate" => gate.gate()).increment(1);
                }
                tracing::info!(%run, %cid, kind = kind.as_str(), reason = %denial, "transaction denied");
            },
            Outcome::Failed(failure) => {
                tracing::warn!(%run, %cid, kind = kind.as_str(), error = %failure, "transaction failed");
            },
        }
    }
}

impl Reducer for TransactionReducer {
    type State = OrchestratorState;
    type Action = TransactionAction;
    type Environment = OrchestratorEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per saga action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TransactionAction::RegisterExam { run, cid, access, title } => {
                let kind = TransactionKind::RegisterExam;
                let subject = match access.require_subject() {
                    Ok(subject) => subject.clone(),
                    Err(denied) => {
                        return Self::finish(env, run, cid, kind, Outcome::Denied(denied.into()));
                    },
                };
                match required_text("title", &title) {
                    Ok(title) => {
                        Self::begin(state, env, run, cid, kind, subject, Request::Exam { title })
                    },
                    Err(error) => Self::finish(env, run, cid, kind, Outcome::Denied(error.into())),
                }
            },

            TransactionAction::RegisterGraduation { run, cid, access, period } => {
                let kind = TransactionKind::RegisterGraduation;
                let subject = match access.require_subject() {
                    Ok(subject) => subject.clone(),
                    Err(denied) => {
                        return Self::finish(env, run, cid, kind, Outcome::Denied(denied.into()));
                    },
                };
                match required_text("period", &period) {
                    Ok(period) => Self::begin(
                        state,
                        env,
                        run,
                        cid,
                        kind,
                        subject,
                        Request::Graduation { period },
                    ),
                    Err(error) => Self::finish(env, run, cid, kind, Outcome::Denied(error.into())),
                }
            },

            TransactionAction::SubmitCourseLoad {
                run,
                cid,
                access,
                term,
                items,
            } => {
                let kind = TransactionKind::SubmitCourseLoad;
                let subject = match access.require_subject() {
                    Ok(subject) => subject.clone(),
                    Err(denied) => {
                        return Self::finish(env, run, cid, kind, Outcome::Denied(denied.into()));
                    },
                };
                match required_text("term", &term) {
                    Ok(term) => Self::begin(
                        state,
                        env,
                        run,
                        cid,
                        kind,
                        subject,
                        Request::CourseLoad {
                            term,
                            draft: items,
                            validated: None,
                            observed_revision: None,
                        },
                    ),
                    Err(error) => Self::finish(env, run, cid, kind, Outcome::Denied(error.into())),
                }
            },

            TransactionAction::UpdateStatus {
                run,
                cid,
                access,
                kind: record_kind,
                id,
                status,
            } => {
                let kind = TransactionKind::UpdateStatus(record_kind);
                let admin = match access.require_admin() {
                    Ok(identity) => identity.subject.clone(),
                    Err(denied) => {
                        return Self::finish(env, run, cid, kind, Outcome::Denied(denied.into()));
                    },
                };
                match RecordStatus::parse(record_kind, &status) {
                    Ok(status) => Self::begin(
                        state,
                        env,
                        run,
                        cid,
                        kind,
                        admin,
                        Request::Status { id, status },
                    ),
                    Err(error) => Self::finish(env, run, cid, kind, Outcome::Denied(error.into())),
                }
            },

            // ========== Step results ==========
            TransactionAction::StandingFetched { run, result } => {
                let Some(kind) = Self::awaiting(state, run, Step::Standing) else {
                    return SmallVec::new();
                };
                match result {
                    Err(error) => Self::conclude(state, env, run, Outcome::Failed(error.into())),
                    Ok(profile) => match standing_gate(&profile, kind) {
                        Ok(()) => Self::advance(state, env, run),
                        Err(denial) => Self::deny(state, env, run, denial),
                    },
                }
            },

            TransactionAction::TuitionFetched { run, result } => {
                if Self::awaiting(state, run, Step::Tuition).is_none() {
                    return SmallVec::new();
                }
                match result {
                    Err(error) => Self::conclude(state, env, run, Outcome::Failed(error.into())),
                    Ok(status) => match tuition_gate(&status) {
                        Ok(()) => Self::advance(state, env, run),
                        Err(denial) => Self::deny(state, env, run, denial),
                    },
                }
            },

            TransactionAction::ClearanceFetched { run, result } => {
                if Self::awaiting(state, run, Step::Clearance).is_none() {
                    return SmallVec::new();
                }
                match result {
                    Err(error) => Self::conclude(state, env, run, Outcome::Failed(error.into())),
                    Ok(clearance) => match clearance_gate(clearance.as_ref()) {
                        Ok(()) => Self::advance(state, env, run),
                        Err(denial) => Self::deny(state, env, run, denial),
                    },
                }
            },

            TransactionAction::ExamsLoaded { run, result } => {
                if Self::awaiting(state, run, Step::Exams).is_none() {
                    return SmallVec::new();
                }
                match result {
                    Err(error) => Self::conclude(
                        state,
                        env,
                        run,
                        Outcome::Failed(Failure::Storage(error.to_string())),
                    ),
                    Ok(exams) => match precedence_gate(latest_exam(&exams)) {
                        Ok(()) => Self::advance(state, env, run),
                        Err(denial) => Self::deny(state, env, run, denial),
                    },
                }
            },

            TransactionAction::CourseLoadLoaded { run, result } => {
                if Self::awaiting(state, run, Step::CourseLoad).is_none() {
                    return SmallVec::new();
                }
                match result {
                    Err(error) => Self::conclude(
                        state,
                        env,
                        run,
                        Outcome::Failed(Failure::Storage(error.to_string())),
                    ),
                    Ok(existing) => {
                        if let Some(Run {
                            request: Request::CourseLoad { observed_revision, .. },
                            ..
                        }) = state.runs.get_mut(&run)
                        {
                            *observed_revision = existing.map(|load| load.revision);
                        }
                        Self::advance(state, env, run)
                    },
                }
            },

            TransactionAction::Committed { run, result } => {
                let Some(kind) = Self::awaiting(state, run, Step::Commit) else {
                    return SmallVec::new();
                };
                let outcome = match (result, kind, state.runs.get(&run).map(|r| &r.request)) {
                    (Ok(None), TransactionKind::UpdateStatus(record_kind), Some(Request::Status { id, .. })) => {
                        Outcome::Denied(Denial::NotFound {
                            kind: record_kind,
                            id: *id,
                        })
                    },
                    (Ok(None), _, _) => Outcome::Failed(Failure::Storage(
                        "write returned no record".to_string(),
                    )),
                    (Ok(Some(record)), _, _) => Outcome::from_commit(Ok(record)),
                    (Err(error), _, _) => Outcome::from_commit(Err(error)),
                };
                Self::conclude(state, env, run, outcome)
            },

            // ========== Terminal ==========
            TransactionAction::Expired { run } => {
                let pending = match state.runs.get(&run) {
                    Some(r) if r.step != Step::Commit => Some((r.cid, r.kind, r.step)),
                    _ => None,
                };
                let Some((cid, kind, step)) = pending else {
                    return SmallVec::new();
                };
                tracing::warn!(%run, %cid, kind = kind.as_str(), step = ?step, "transaction deadline expired");
                Self::conclude(state, env, run, Outcome::Failed(Failure::Timeout))
            },

            TransactionAction::Finished { run, cid, kind, outcome } => {
                state.runs.remove(&run);
                Self::record_finish(run, cid, kind, &outcome);
                SmallVec::new()
            },
        }
    }
}

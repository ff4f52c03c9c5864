//! Transaction orchestrator.
//!
//! [`TransactionReducer`] holds the saga logic; [`Orchestrator`] wraps it in a
//! [`Store`] and turns each command into a request/response call that resolves
//! to exactly one [`Outcome`]. Every command gets its own [`RunId`] and its
//! own reply slot in [`Completions`].

use crate::access::AccessContext;
use crate::types::{CorrelationId, CourseLoadDraftItem, RecordId, RecordKind, RunId};
use academic_gate_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

mod actions;
mod completion;
mod environment;
mod outcome;
mod reducer;

pub use actions::TransactionAction;
pub use completion::Completions;
pub use environment::OrchestratorEnvironment;
pub use outcome::{Denial, Failure, Outcome};
pub use reducer::{OrchestratorState, Request, Run, Step, TransactionReducer};

/// Store running the transaction saga
pub type TransactionStore =
    Store<OrchestratorState, TransactionAction, OrchestratorEnvironment, TransactionReducer>;

/// Slack on top of the run deadline so the reducer's own timeout normally
/// reaches the caller first.
const WAIT_GRACE: Duration = Duration::from_secs(1);

/// Request/response entry point for the four transactions
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<TransactionStore>,
    completions: Completions,
    wait: Duration,
}

impl Orchestrator {
    /// Orchestrator with an empty run table
    #[must_use]
    pub fn new(environment: OrchestratorEnvironment) -> Self {
        let wait = environment.deadline + WAIT_GRACE;
        let completions = environment.completions.clone();
        let store = Store::new(
            OrchestratorState::default(),
            TransactionReducer::new(),
            environment,
        );

        Self {
            store: Arc::new(store),
            completions,
            wait,
        }
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    /// Runs currently in flight
    pub async fn in_flight(&self) -> usize {
        self.store.state(OrchestratorState::in_flight).await
    }

    /// Register the caller for the final exam
    pub async fn register_exam(
        &self,
        cid: CorrelationId,
        access: AccessContext,
        title: impl Into<String>,
    ) -> Outcome {
        self.execute(TransactionAction::RegisterExam {
            run: RunId::new(),
            cid,
            access,
            title: title.into(),
        })
        .await
    }

    /// Register the caller for graduation in `period`
    pub async fn register_graduation(
        &self,
        cid: CorrelationId,
        access: AccessContext,
        period: impl Into<String>,
    ) -> Outcome {
        self.execute(TransactionAction::RegisterGraduation {
            run: RunId::new(),
            cid,
            access,
            period: period.into(),
        })
        .await
    }

    /// Submit or replace the caller's course load for `term`
    pub async fn submit_course_load(
        &self,
        cid: CorrelationId,
        access: AccessContext,
        term: impl Into<String>,
        items: Vec<CourseLoadDraftItem>,
    ) -> Outcome {
        self.execute(TransactionAction::SubmitCourseLoad {
            run: RunId::new(),
            cid,
            access,
            term: term.into(),
            items,
        })
        .await
    }

    /// Administrator status change
    pub async fn update_status(
        &self,
        cid: CorrelationId,
        access: AccessContext,
        kind: RecordKind,
        id: RecordId,
        status: impl Into<String>,
    ) -> Outcome {
        self.execute(TransactionAction::UpdateStatus {
            run: RunId::new(),
            cid,
            access,
            kind,
            id,
            status: status.into(),
        })
        .await
    }

    /// Send a command and wait for the outcome of its run
    ///
    /// The waiter gives up after the run deadline plus a grace period, unless
    /// the run is committing or has just concluded: a write that may have
    /// landed is always reported as it finished.
    #[tracing::instrument(skip(self, command), fields(run = %command.run_id(), cid = ?command.correlation_id()))]
    pub async fn execute(&self, command: TransactionAction) -> Outcome {
        let run = command.run_id();
        let reply = self.completions.register(run);

        if let Err(error) = self.store.send(command).await {
            self.completions.abandon(run);
            return Outcome::Failed(Failure::Unavailable(error.to_string()));
        }

        self.await_outcome(run, reply).await
    }

    async fn await_outcome(&self, run: RunId, mut reply: oneshot::Receiver<Outcome>) -> Outcome {
        loop {
            match tokio::time::timeout(self.wait, &mut reply).await {
                Ok(Ok(outcome)) => return outcome,
                Ok(Err(_)) => {
                    return Outcome::Failed(Failure::Unavailable(
                        "run ended without an outcome".to_string(),
                    ));
                },
                Err(_) => {},
            }

            match self.store.state(|s| s.step_of(&run)).await {
                Some(Step::Commit) => {
                    tracing::warn!(%run, "run past its deadline is still committing");
                },
                None => {
                    tracing::debug!(%run, "run concluded, outcome in transit");
                },
                Some(step) => {
                    tracing::warn!(%run, step = ?step, "waiter gave up on stalled run");
                    self.completions.abandon(run);
                    // A delivery that won the race with `abandon` still counts.
                    return reply.try_recv().unwrap_or(Outcome::Failed(Failure::Timeout));
                },
            }
        }
    }

    /// Stop accepting commands and wait for in-flight effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// after `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

//! Per-run reply slots.
//!
//! The orchestrator registers a slot before sending a command; the run's
//! terminal effect fills it. Each waiter hears only about its own run.

use super::Outcome;
use crate::types::RunId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

/// Pending replies keyed by run. Clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct Completions {
    slots: Arc<Mutex<HashMap<RunId, oneshot::Sender<Outcome>>>>,
}

impl Completions {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the slot for `run` and return its receiving end
    pub fn register(&self, run: RunId) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.with_slots(|slots| slots.insert(run, tx));
        rx
    }

    /// Deliver the outcome of `run`. Returns `false` when nobody waits for it.
    pub fn complete(&self, run: RunId, outcome: Outcome) -> bool {
        // Sent under the lock so `abandon` never races a delivery.
        self.with_slots(|slots| {
            slots
                .remove(&run)
                .is_some_and(|reply| reply.send(outcome).is_ok())
        })
    }

    /// Drop the slot of a waiter that gave up
    pub fn abandon(&self, run: RunId) {
        self.with_slots(|slots| slots.remove(&run));
    }

    /// Number of waiters without an outcome yet
    #[must_use]
    pub fn pending(&self) -> usize {
        self.with_slots(|slots| slots.len())
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut HashMap<RunId, oneshot::Sender<Outcome>>) -> T) -> T {
        let mut guard = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::orchestrator::{Denial, Failure};

    #[tokio::test]
    async fn outcome_reaches_only_its_own_run() {
        let completions = Completions::new();
        let first = RunId::new();
        let second = RunId::new();
        let first_rx = completions.register(first);
        let mut second_rx = completions.register(second);

        assert!(completions.complete(first, Outcome::Denied(Denial::Unauthenticated)));

        assert_eq!(first_rx.await.unwrap(), Outcome::Denied(Denial::Unauthenticated));
        assert!(second_rx.try_recv().is_err());
        assert_eq!(completions.pending(), 1);
    }

    #[test]
    fn abandoned_run_is_not_delivered() {
        let completions = Completions::new();
        let run = RunId::new();
        let _rx = completions.register(run);

        completions.abandon(run);

        assert!(!completions.complete(run, Outcome::Failed(Failure::Timeout)));
        assert_eq!(completions.pending(), 0);
    }
}

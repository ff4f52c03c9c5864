//! Dependencies injected into the transaction reducer.

use super::Completions;
use crate::records::RecordStore;
use crate::remote::{ClearanceLookup, StandingLookup, TuitionLookup};
use crate::rules::RulesConfig;
use academic_gate_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Environment of the transaction saga
#[derive(Clone)]
pub struct OrchestratorEnvironment {
    /// Timestamps for new records
    pub clock: Arc<dyn Clock>,
    /// Finance service
    pub tuition: Arc<dyn TuitionLookup>,
    /// Student service
    pub standing: Arc<dyn StandingLookup>,
    /// Library
    pub clearance: Arc<dyn ClearanceLookup>,
    /// Local records
    pub records: Arc<dyn RecordStore>,
    /// Credit limits
    pub rules: RulesConfig,
    /// Time a run may take before it fails with a timeout
    pub deadline: Duration,
    /// Reply slots filled by each run's terminal effect
    pub completions: Completions,
}

impl std::fmt::Debug for OrchestratorEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorEnvironment")
            .field("rules", &self.rules)
            .field("deadline", &self.deadline)
            .field("waiting", &self.completions.pending())
            .finish_non_exhaustive()
    }
}

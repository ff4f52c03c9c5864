//! # Academic Gate Testing
//!
//! Testing utilities for reducers built on `academic-gate-core`.
//!
//! This crate provides:
//! - A controllable [`FixedClock`]
//! - A Given-When-Then [`ReducerTest`] builder
//! - Effect assertion and resolution helpers
//!
//! ## Example
//!
//! ```ignore
//! use academic_gate_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(MyReducer)
//!     .with_env(environment_with(test_clock()))
//!     .given_state(MyState::default())
//!     .when_action(MyAction::Start)
//!     .then_effects(|effects| assert_eq!(effects.len(), 1))
//!     .run();
//! ```

use academic_gate_core::environment::Clock;
use chrono::{DateTime, Utc};

pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, Mutex, PoisonError};

    /// Fixed clock for deterministic tests
    ///
    /// Returns the same instant until a test moves it with
    /// [`FixedClock::advance`]. Clones share the same instant.
    ///
    /// # Example
    ///
    /// ```
    /// use academic_gate_testing::mocks::FixedClock;
    /// use academic_gate_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Helpers for driving effects by hand in reducer tests
pub mod helpers {
    use academic_gate_core::effect::Effect;

    /// Resolve a single effect into the action it feeds back, if any
    ///
    /// `Future` effects are awaited, `Delay` effects return their action
    /// without sleeping, and `Parallel` effects resolve to the first action
    /// produced by their children.
    pub async fn resolve<A: Send + 'static>(effect: Effect<A>) -> Option<A> {
        match effect {
            Effect::None => None,
            Effect::Future(fut) => fut.await,
            Effect::Delay { action, .. } => Some(*action),
            Effect::Parallel(effects) => {
                for effect in effects {
                    if let Some(action) = Box::pin(resolve(effect)).await {
                        return Some(action);
                    }
                }
                None
            },
        }
    }
}

pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;
    use academic_gate_core::effect::Effect;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn test_advance_is_shared_between_clones() {
        let clock = test_clock();
        let other = clock.clone();
        let before = clock.now();
        other.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now() - before, chrono::Duration::minutes(5));
    }

    #[tokio::test]
    async fn test_resolve_effects() {
        assert_eq!(helpers::resolve::<u8>(Effect::None).await, None);
        assert_eq!(helpers::resolve(Effect::emit(7_u8)).await, Some(7));
        let delayed = Effect::Delay {
            duration: std::time::Duration::from_secs(3600),
            action: Box::new(1_u8),
        };
        assert_eq!(helpers::resolve(delayed).await, Some(1));
    }
}

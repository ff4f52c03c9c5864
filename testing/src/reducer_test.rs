//! Given-When-Then testing for reducers
//!
//! A [`ReducerTest`] runs a reducer against a starting state, one or more
//! actions, and a set of state/effect assertions, without any runtime.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use academic_gate_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent reducer test
///
/// Actions given through [`ReducerTest::given_actions`] are reduced first and
/// their effects discarded; effect assertions only see the effects of the
/// action under test.
///
/// # Example
///
/// ```ignore
/// use academic_gate_testing::ReducerTest;
///
/// ReducerTest::new(GateReducer)
///     .with_env(test_environment())
///     .given_state(GateState::default())
///     .when_action(GateAction::Open { id: 1 })
///     .then_state(|state| assert!(state.is_open(1)))
///     .then_effects(|effects| assert_eq!(effects.len(), 1))
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    history: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            history: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Reduce these actions before the action under test (Given)
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.history.extend(actions);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the action under test (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and return the effects of the action under test
    ///
    /// The effects are handed back so async tests can resolve them with
    /// [`crate::helpers::resolve`].
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertion fails.
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) -> Vec<Effect<A>> {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");
        let action = self.action.expect("Action must be set with when_action()");
        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for earlier in self.history {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }

        let effects: Vec<Effect<A>> = self.reducer.reduce(&mut state, action, &env).into_vec();

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }

        effects
    }
}

/// Helper assertions for effects
pub mod assertions {
    use academic_gate_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain at least one `Delay` effect
    ///
    /// # Panics
    ///
    /// Panics if no `Delay` effect is found.
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academic_gate_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default)]
    struct TurnstileState {
        passes: u32,
        locked: bool,
    }

    #[derive(Clone, Debug)]
    enum TurnstileAction {
        Pass,
        Lock,
        Alarm,
    }

    struct TurnstileReducer;

    impl Reducer for TurnstileReducer {
        type State = TurnstileState;
        type Action = TurnstileAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut TurnstileState,
            action: TurnstileAction,
            _env: &(),
        ) -> SmallVec<[Effect<TurnstileAction>; 4]> {
            match action {
                TurnstileAction::Pass if state.locked => {
                    smallvec![Effect::emit(TurnstileAction::Alarm)]
                },
                TurnstileAction::Pass => {
                    state.passes += 1;
                    SmallVec::new()
                },
                TurnstileAction::Lock => {
                    state.locked = true;
                    smallvec![Effect::None]
                },
                TurnstileAction::Alarm => SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_open_turnstile_counts_passes() {
        ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(TurnstileState::default())
            .given_actions([TurnstileAction::Pass])
            .when_action(TurnstileAction::Pass)
            .then_state(|state| assert_eq!(state.passes, 2))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_locked_turnstile_raises_alarm() {
        let effects = ReducerTest::new(TurnstileReducer)
            .with_env(())
            .given_state(TurnstileState::default())
            .given_actions([TurnstileAction::Lock])
            .when_action(TurnstileAction::Pass)
            .then_state(|state| assert_eq!(state.passes, 0))
            .then_effects(assertions::assert_has_future_effect)
            .run();
        assertions::assert_effects_count(&effects, 1);
    }

    #[test]
    fn test_assertions_accept_none_effects() {
        assertions::assert_no_effects::<TurnstileAction>(&[Effect::None]);
        assertions::assert_no_effects::<TurnstileAction>(&[]);
        assertions::assert_effects_count(&[Effect::<TurnstileAction>::None], 1);
    }
}

//! Given-When-Then harness for reducers.
//!
//! Actions are applied in order against one state; the effects of every
//! action are collected and flattened into the keys they invalidate, so
//! assertions can look at either.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use ashva_realtime_core::effect::Effect;
use ashva_realtime_core::key::QueryKey;
use ashva_realtime_core::reducer::Reducer;

type Check<T> = Box<dyn FnOnce(&T)>;
type SliceCheck<T> = Box<dyn FnOnce(&[T])>;

/// Fluent reducer scenario.
///
/// State and environment fall back to their `Default` when not given.
///
/// # Example
///
/// ```
/// use ashva_realtime_core::bridge::{BridgeAction, BridgePhase, BridgeReducer, BridgeState};
/// use ashva_realtime_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(BridgeReducer)
///     .given_state(BridgeState::default())
///     .when_action(BridgeAction::Connect)
///     .when_action(BridgeAction::Connected)
///     .then_state(|state| assert_eq!(state.phase, BridgePhase::Streaming))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R: Reducer> {
    reducer: R,
    env: Option<R::Environment>,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_checks: Vec<Check<R::State>>,
    effect_checks: Vec<SliceCheck<Effect>>,
    key_checks: Vec<SliceCheck<QueryKey>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::State: Default,
    R::Environment: Default,
{
    /// Start a scenario for `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            state: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
            key_checks: Vec::new(),
        }
    }

    /// Use this environment instead of the default one.
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Given: the state before the first action.
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// When: apply `action` after the ones already queued.
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Then: inspect the final state.
    #[must_use]
    pub fn then_state(mut self, check: impl FnOnce(&R::State) + 'static) -> Self {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Then: inspect every effect returned, in order.
    #[must_use]
    pub fn then_effects(mut self, check: impl FnOnce(&[Effect]) + 'static) -> Self {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Then: inspect the invalidated keys, flattened in execution order.
    #[must_use]
    pub fn then_keys(mut self, check: impl FnOnce(&[QueryKey]) + 'static) -> Self {
        self.key_checks.push(Box::new(check));
        self
    }

    /// Apply the actions and run the checks.
    ///
    /// # Panics
    ///
    /// Panics if no action was queued or a check fails.
    #[allow(clippy::panic)] // Test code can panic
    pub fn run(self) {
        assert!(!self.actions.is_empty(), "queue at least one action with when_action()");

        let env = self.env.unwrap_or_default();
        let mut state = self.state.unwrap_or_default();
        let effects: Vec<Effect> = self
            .actions
            .into_iter()
            .flat_map(|action| self.reducer.reduce(&mut state, action, &env))
            .collect();
        let keys: Vec<QueryKey> = effects
            .iter()
            .flat_map(Effect::invalidated_keys)
            .cloned()
            .collect();

        self.state_checks.into_iter().for_each(|check| check(&state));
        self.effect_checks.into_iter().for_each(|check| check(&effects));
        self.key_checks.into_iter().for_each(|check| check(&keys));
    }
}

/// Ready-made effect checks.
pub mod assertions {
    use ashva_realtime_core::effect::Effect;
    use ashva_realtime_core::key::QueryKey;
    use std::collections::HashSet;

    fn keys(effects: &[Effect]) -> Vec<QueryKey> {
        effects
            .iter()
            .flat_map(Effect::invalidated_keys)
            .cloned()
            .collect()
    }

    /// The effects invalidate nothing (`Effect::None` is allowed).
    ///
    /// # Panics
    ///
    /// Panics if any key is invalidated.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        let keys = keys(effects);
        assert!(keys.is_empty(), "expected no invalidations, got {keys:?}");
    }

    /// Exactly `expected` effects were returned.
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(effects.len(), expected, "effect count mismatch: {effects:?}");
    }

    /// The invalidated keys equal `expected` as a set.
    ///
    /// # Panics
    ///
    /// Panics if the sets differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_invalidates<I, K>(effects: &[Effect], expected: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<QueryKey>,
    {
        let actual: HashSet<QueryKey> = keys(effects).into_iter().collect();
        let expected: HashSet<QueryKey> = expected.into_iter().map(Into::into).collect();
        assert_eq!(actual, expected, "invalidated keys differ");
    }

    /// The invalidated keys equal `expected` in order.
    ///
    /// # Panics
    ///
    /// Panics if the sequences differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_invalidates_in_order<I, K>(effects: &[Effect], expected: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<QueryKey>,
    {
        let expected: Vec<QueryKey> = expected.into_iter().map(Into::into).collect();
        assert_eq!(keys(effects), expected, "invalidation order differs");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashva_realtime_core::{SmallVec, smallvec};

    /// Counts pings and invalidates `["pings"]` on every other one.
    #[derive(Default)]
    struct PingReducer;

    #[derive(Default, Debug)]
    struct Pings(u32);

    impl Reducer for PingReducer {
        type State = Pings;
        type Action = ();
        type Environment = ();

        fn reduce(&self, state: &mut Pings, _action: (), _env: &()) -> SmallVec<[Effect; 4]> {
            state.0 += 1;
            if state.0 % 2 == 0 {
                smallvec![Effect::Invalidate(QueryKey::from(["pings"]))]
            } else {
                smallvec![Effect::None]
            }
        }
    }

    #[test]
    fn test_defaults_and_accumulated_effects() {
        ReducerTest::new(PingReducer)
            .when_action(())
            .when_action(())
            .when_action(())
            .then_state(|state| assert_eq!(state.0, 3))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 3);
                assertions::assert_invalidates_in_order(effects, [["pings"]]);
            })
            .then_keys(|keys| assert_eq!(keys.len(), 1))
            .run();
    }

    #[test]
    fn test_given_state_is_used() {
        ReducerTest::new(PingReducer)
            .given_state(Pings(1))
            .when_action(())
            .then_effects(|effects| assertions::assert_invalidates(effects, [["pings"]]))
            .run();
    }

    #[test]
    fn test_none_effects_count_as_nothing() {
        assertions::assert_no_effects(&[Effect::None, Effect::chain(vec![])]);
        assertions::assert_no_effects(&[]);
    }
}

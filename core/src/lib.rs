//! # Ashva Realtime Core
//!
//! Pure types and logic for the realtime event bridge.
//!
//! The web portal keeps a client-side cache of server data (tickets,
//! assignments, dashboard counters, subscription and payment views). The
//! gateway pushes a `text/event-stream` of domain events after every write;
//! the bridge reads that stream and invalidates the cached families of
//! queries those events touch.
//!
//! This crate holds everything that does not perform I/O:
//!
//! - [`event`]: the gateway event record and its lenient decoding
//! - [`key`]: hierarchical query keys with prefix matching
//! - [`sse`]: incremental decoding of the event-stream framing
//! - [`policy`]: which keys an event invalidates
//! - [`bridge`]: the bridge state machine as a [`reducer::Reducer`]
//! - [`environment`]: the collaborators the shell injects
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit Effects (no hidden I/O)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use ashva_realtime_core::bridge::{BridgeAction, BridgeEnvironment, BridgeReducer, BridgeState};
//! use ashva_realtime_core::reducer::Reducer;
//! use ashva_realtime_core::sse::FrameDecoder;
//!
//! let env = BridgeEnvironment::default();
//! let mut state = BridgeState::default();
//! BridgeReducer.reduce(&mut state, BridgeAction::Connect, &env);
//! BridgeReducer.reduce(&mut state, BridgeAction::Connected, &env);
//!
//! let mut decoder = FrameDecoder::new();
//! for frame in decoder.push(b"data: {\"service\":\"tickets\"}\n\n") {
//!     let effects = BridgeReducer.reduce(&mut state, BridgeAction::FrameReceived(frame), &env);
//!     assert_eq!(effects.len(), 1);
//! }
//! assert_eq!(state.stats.invalidations, 5);
//! ```

pub use smallvec::{SmallVec, smallvec};

pub mod bridge;
pub mod event;
pub mod key;
pub mod policy;
pub mod sse;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all decision logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for decision logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the shell.
/// They are values (not execution) and can be inspected in tests.
pub mod effect {
    use crate::key::QueryKey;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the bridge.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Effect {
        /// No-op effect
        None,

        /// Invalidate every cached query whose key starts with this prefix
        Invalidate(QueryKey),

        /// Run effects sequentially, in order
        Sequential(Vec<Effect>),
    }

    impl Effect {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect>) -> Effect {
            Effect::Sequential(effects)
        }

        /// All keys this effect invalidates, in execution order.
        #[must_use]
        pub fn invalidated_keys(&self) -> Vec<&QueryKey> {
            match self {
                Effect::None => Vec::new(),
                Effect::Invalidate(key) => vec![key],
                Effect::Sequential(effects) => {
                    effects.iter().flat_map(Effect::invalidated_keys).collect()
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external collaborators are abstracted behind traits and injected by
/// the shell, so tests can substitute recording fakes.
pub mod environment {
    use crate::key::QueryKey;

    /// Client-side query cache with invalidate-by-prefix semantics.
    ///
    /// Invalidation is fire-and-forget and idempotent: invalidating a key
    /// that is already stale is harmless. Matching on key prefixes (and any
    /// refetch that follows) is the cache's responsibility.
    pub trait QueryCache: Send + Sync {
        /// Invalidate every cached query whose key starts with `prefix`.
        fn invalidate(&self, prefix: &QueryKey);
    }

    /// Source of the bearer token used to open the event stream.
    ///
    /// Called once when the bridge is mounted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::environment::TokenProvider;
    ///
    /// let provider = || Some("token".to_string());
    /// assert_eq!(provider.auth_token().as_deref(), Some("token"));
    /// ```
    pub trait TokenProvider: Send + Sync {
        /// Current auth token, or `None` when signed out.
        fn auth_token(&self) -> Option<String>;
    }

    impl<F> TokenProvider for F
    where
        F: Fn() -> Option<String> + Send + Sync,
    {
        fn auth_token(&self) -> Option<String> {
            self()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::key::QueryKey;

    #[test]
    fn test_invalidated_keys_flattens_sequences() {
        let effect = Effect::chain(vec![
            Effect::Invalidate(QueryKey::from(["tickets"])),
            Effect::None,
            Effect::chain(vec![Effect::Invalidate(QueryKey::from(["payments"]))]),
        ]);

        let keys: Vec<String> = effect
            .invalidated_keys()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec![r#"["tickets"]"#, r#"["payments"]"#]);
    }
}

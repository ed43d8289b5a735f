//! Autonomous decision procedures.
//!
//! An `Agent` is handed the legal decisions, its own observation and a
//! `simulate` closure that previews the observation after a decision on a
//! private clone of the match state. It never sees the real state.

use crate::core::error::AgentError;
use crate::core::rng::GameRng;
use crate::rules::RulesEngine;

/// Preview function handed to agents.
///
/// Returns `None` if the engine rejects the previewed decision.
pub type Simulate<'a, E> =
    dyn Fn(&<E as RulesEngine>::Decision) -> Option<<E as RulesEngine>::Observation> + 'a;

/// Decision procedure for an autonomous participant.
pub trait Agent<E: RulesEngine>: Send {
    /// Pick one of `legal` for the current turn.
    fn select_decision(
        &mut self,
        legal: &[E::Decision],
        observation: &E::Observation,
        simulate: &Simulate<'_, E>,
    ) -> Result<E::Decision, AgentError>;

    /// Reward hook, called after every turn (own or opponent's).
    fn on_reward(
        &mut self,
        _old: &E::Observation,
        _new: &E::Observation,
        _was_actor: bool,
        _signal: Option<f64>,
    ) {
    }
}

/// Uniformly random agent. Works with any engine.
#[derive(Clone, Debug)]
pub struct RandomAgent {
    rng: GameRng,
}

impl RandomAgent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
        }
    }
}

impl<E: RulesEngine> Agent<E> for RandomAgent {
    fn select_decision(
        &mut self,
        legal: &[E::Decision],
        _observation: &E::Observation,
        _simulate: &Simulate<'_, E>,
    ) -> Result<E::Decision, AgentError> {
        self.rng.choose(legal).cloned().ok_or(AgentError::NoDecision)
    }
}

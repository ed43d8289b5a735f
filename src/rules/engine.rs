//! Rules engine trait for game implementations.
//!
//! The session layer treats the game as a black box. Games implement
//! `RulesEngine` to define:
//! - Who acts and what they may do
//! - How a decision turns one state into the next
//! - What each seat can see, and how transitions are rewarded
//! - When the game is over

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::error::RulesError;
use crate::core::seat::Seat;

/// Result of a completed game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GameResult {
    /// Single winner.
    Winner(Seat),
    /// Draw (no winner).
    Draw,
}

impl GameResult {
    /// Check if a seat won.
    #[must_use]
    pub fn is_winner(&self, seat: Seat) -> bool {
        match self {
            GameResult::Winner(s) => *s == seat,
            GameResult::Draw => false,
        }
    }
}

/// Rules engine trait.
///
/// ## Implementation Notes
///
/// - `apply` must not mutate its input; it returns the successor state.
/// - `State::clone` must be a deep, independent copy: agents preview
///   decisions on clones while the real state stays untouched.
/// - `legal_decisions` returns empty when the seat cannot act.
pub trait RulesEngine: Send + Sync + 'static {
    /// Complete match state.
    type State: Clone + Send + 'static;

    /// A single move.
    type Decision: Clone + Debug + PartialEq + Send + Serialize + DeserializeOwned + 'static;

    /// What one seat can see of a state.
    type Observation: Clone + Debug + Send + 'static;

    /// Spectator-facing rendering of a state.
    type PublicView: Serialize;

    /// Seat-private rendering of a state.
    type PrivateView: Serialize;

    /// Deal a fresh match.
    fn new_match(&self, seed: u64) -> Self::State;

    /// The seat whose decision is expected next.
    fn actor(&self, state: &Self::State) -> Seat;

    /// Enumerate every legal decision for `seat`.
    fn legal_decisions(&self, seat: Seat, state: &Self::State) -> Vec<Self::Decision>;

    /// Cheap resource-cap validation run before `apply`.
    ///
    /// Lets the request path reject a submission with a precise reason
    /// (e.g. a hand-size cap) without touching the state.
    fn check_limits(
        &self,
        _seat: Seat,
        _state: &Self::State,
        _decision: &Self::Decision,
    ) -> Result<(), RulesError> {
        Ok(())
    }

    /// Apply the actor's decision, producing the next state.
    fn apply(&self, state: &Self::State, decision: &Self::Decision) -> Result<Self::State, RulesError>;

    /// Observation of `state` from `seat`'s point of view.
    fn observe(&self, seat: Seat, state: &Self::State) -> Self::Observation;

    /// Check if the game is over.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Final result, `None` while the game continues.
    fn outcome(&self, state: &Self::State) -> Option<GameResult>;

    /// Reward signal for `seat` on the `prior -> current` transition.
    fn environment_reward(&self, seat: Seat, prior: &Self::State, current: &Self::State) -> Option<f64>;

    /// The decision that produced `state`, if any.
    fn last_decision<'a>(&self, state: &'a Self::State) -> Option<&'a Self::Decision>;

    /// Render `state` for spectators.
    fn public_view(&self, state: &Self::State) -> Self::PublicView;

    /// Render `state` for one seat.
    fn private_view(&self, seat: Seat, state: &Self::State) -> Self::PrivateView;

    /// Short label for logs.
    fn describe(&self, decision: &Self::Decision) -> String {
        format!("{decision:?}")
    }

    // === Convenience Methods ===

    /// Preview the observation `seat` would have after `decision`.
    ///
    /// Works on a private clone; `state` is never modified. Returns
    /// `None` if the engine rejects the decision.
    fn preview(
        &self,
        seat: Seat,
        state: &Self::State,
        decision: &Self::Decision,
    ) -> Option<Self::Observation> {
        let scratch = state.clone();
        self.apply(&scratch, decision)
            .ok()
            .map(|next| self.observe(seat, &next))
    }
}

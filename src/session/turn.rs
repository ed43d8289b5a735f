//! Turn executor: the only writer of match state.

use serde::Serialize;

use super::match_session::MatchSession;
use crate::core::error::TurnError;
use crate::core::seat::Seat;
use crate::rules::RulesEngine;

/// Summary of one executed turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// Round counter after the turn.
    pub round: u32,
    /// Seat that acted.
    pub actor: Seat,
    /// Whether the turn ended the match.
    pub terminal: bool,
}

/// Apply `decision` for the current actor and run the reward pass.
///
/// Takes `&mut MatchSession`, so the caller holds the session lock for
/// the whole turn. On error the session is unchanged.
pub fn execute_turn<E: RulesEngine>(
    session: &mut MatchSession<E>,
    engine: &E,
    decision: &E::Decision,
) -> Result<TurnReport, TurnError> {
    if session.frozen {
        return Err(TurnError::MatchOver);
    }

    let actor = engine.actor(&session.state);
    let next = engine
        .apply(&session.state, decision)
        .map_err(|e| TurnError::IllegalDecision(e.to_string()))?;
    let prior = std::mem::replace(&mut session.state, next);

    // Reward pass, roster order
    for seat in Seat::all() {
        let old_obs = engine.observe(seat, &prior);
        let new_obs = engine.observe(seat, &session.state);
        let signal = engine.environment_reward(seat, &prior, &session.state);
        session.participants[seat].on_reward(&old_obs, &new_obs, seat == actor, signal);
    }

    session.prior = Some(prior);
    session.round += 1;

    let terminal = engine.is_terminal(&session.state);
    if terminal {
        session.freeze();
        log::info!("Match over after {} rounds: {:?}", session.round, engine.outcome(&session.state));
    }

    log::debug!(
        "Round {}: {} played {}",
        session.round,
        session.participants[actor].name(),
        engine.describe(decision)
    );

    Ok(TurnReport {
        round: session.round,
        actor,
        terminal,
    })
}

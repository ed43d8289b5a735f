//! Mode/session coordinator.
//!
//! Runs after every turn (and once at session creation) with the session
//! lock held, and decides who drives next:
//! - all-responsive: publish the new actor as `waiting_for`
//! - mixed: wait for the human, or hand the turn to a chain thread
//! - all-autonomous: nothing, the loop owns sequencing

use std::thread;

use super::match_session::{MatchHandle, MatchMode, MatchSession};
use super::scheduler::{play_autonomous_turn, AutonomousTurn};
use crate::core::error::{FaultReason, MatchFault};
use crate::participants::ParticipantId;
use crate::rules::RulesEngine;

/// Who drives the match after a coordination pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handoff {
    /// The match is frozen; nobody is waited for.
    Finished,
    /// Waiting on a responsive participant's submission.
    AwaitResponsive(ParticipantId),
    /// A chain thread will play the autonomous actor.
    ChainScheduled,
    /// The autonomous loop owns sequencing.
    LoopDriven,
}

/// Recompute `waiting_for` from the current actor.
///
/// Returns the id set, `None` when frozen or the actor is autonomous.
pub fn publish_waiting<E: RulesEngine>(session: &mut MatchSession<E>, engine: &E) -> Option<ParticipantId> {
    session.waiting_for = if session.frozen {
        None
    } else {
        let actor = &session.participants[engine.actor(&session.state)];
        actor.is_responsive().then(|| actor.id().clone())
    };
    session.waiting_for.clone()
}

/// Decide who drives next. Caller holds the session lock.
pub fn coordinate<E: RulesEngine>(handle: &MatchHandle<E>, session: &mut MatchSession<E>) -> Handoff {
    if session.frozen {
        session.waiting_for = None;
        return Handoff::Finished;
    }

    match session.mode {
        MatchMode::AutonomousVsAutonomous => Handoff::LoopDriven,
        MatchMode::ResponsiveVsResponsive | MatchMode::ResponsiveVsAutonomous => {
            if let Some(id) = publish_waiting(session, handle.engine()) {
                return Handoff::AwaitResponsive(id);
            }

            let chain = handle.clone();
            let spawned = thread::Builder::new()
                .name("autonomous-chain".into())
                .spawn(move || run_chain(&chain));
            match spawned {
                Ok(_) => Handoff::ChainScheduled,
                Err(err) => {
                    let seat = handle.engine().actor(&session.state);
                    let name = session.participants[seat].name().to_string();
                    session.record_fault(MatchFault::new(
                        name,
                        seat,
                        FaultReason::DecisionFault(format!("could not start autonomous turn: {err}")),
                    ));
                    Handoff::Finished
                }
            }
        }
    }
}

/// Play autonomous turns until a responsive participant is up.
///
/// Waits `reply_delay` first. Bounded by `max_turns`; running past the
/// bound freezes the match with `ChainLimitExceeded`.
pub fn run_chain<E: RulesEngine>(handle: &MatchHandle<E>) {
    let settings = handle.chain_settings();
    let control = handle.control();
    if !control.sleep(settings.reply_delay) {
        return;
    }

    let mut played = 0;
    loop {
        if !control.is_running() {
            return;
        }

        let mut session = handle.lock();
        if session.frozen {
            return;
        }

        let engine = handle.engine();
        let actor = engine.actor(&session.state);
        if session.participants[actor].is_responsive() {
            publish_waiting(&mut *session, engine);
            return;
        }

        if played >= settings.max_turns {
            log::warn!(
                "Autonomous chain ran {played} turns without reaching a human; the rules engine may be inconsistent"
            );
            let name = session.participants[actor].name().to_string();
            session.record_fault(MatchFault::new(
                name,
                actor,
                FaultReason::ChainLimitExceeded(settings.max_turns),
            ));
            return;
        }

        match play_autonomous_turn(engine, control, &mut *session) {
            AutonomousTurn::Played(report) => {
                played += 1;
                if report.terminal {
                    return;
                }
            }
            AutonomousTurn::NotAutonomous | AutonomousTurn::Over | AutonomousTurn::Faulted(_) => return,
        }
    }
}

//! Match sessions and the shared handle that guards them.
//!
//! A `MatchSession` is the only mutable record of a match. It lives
//! inside a `MatchHandle` behind one `parking_lot::Mutex`; every turn,
//! whether submitted by a human or played by the autonomous loop, is
//! executed while holding that lock.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde::{Serialize, Serializer};

use super::scheduler::LoopControl;
use crate::core::error::{ArenaError, MatchFault};
use crate::core::seat::{Seat, SeatMap};
use crate::participants::{Participant, ParticipantId};
use crate::rules::RulesEngine;

/// Who drives each seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchMode {
    ResponsiveVsResponsive,
    ResponsiveVsAutonomous,
    AutonomousVsAutonomous,
}

impl MatchMode {
    /// Wire name used by the transport.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            MatchMode::ResponsiveVsResponsive => "human-vs-human",
            MatchMode::ResponsiveVsAutonomous => "human-vs-bot",
            MatchMode::AutonomousVsAutonomous => "bot-vs-bot",
        }
    }

    /// Check if both seats are autonomous.
    #[must_use]
    pub const fn is_all_autonomous(self) -> bool {
        matches!(self, MatchMode::AutonomousVsAutonomous)
    }

    /// Check if one seat is human and the other an agent.
    #[must_use]
    pub const fn is_mixed(self) -> bool {
        matches!(self, MatchMode::ResponsiveVsAutonomous)
    }
}

impl FromStr for MatchMode {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human-vs-human" | "human" => Ok(MatchMode::ResponsiveVsResponsive),
            "human-vs-bot" => Ok(MatchMode::ResponsiveVsAutonomous),
            "bot-vs-bot" | "bot" => Ok(MatchMode::AutonomousVsAutonomous),
            other => Err(ArenaError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for MatchMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// The mutable record of one match.
pub struct MatchSession<E: RulesEngine> {
    pub(crate) mode: MatchMode,
    pub(crate) participants: SeatMap<Participant<E>>,
    pub(crate) state: E::State,
    /// State before the most recent turn.
    pub(crate) prior: Option<E::State>,
    pub(crate) round: u32,
    /// Set on terminal state or fault. Never cleared.
    pub(crate) frozen: bool,
    pub(crate) waiting_for: Option<ParticipantId>,
    pub(crate) fault: Option<MatchFault>,
}

impl<E: RulesEngine> MatchSession<E> {
    /// Create a session around a freshly dealt state.
    #[must_use]
    pub fn new(mode: MatchMode, participants: SeatMap<Participant<E>>, state: E::State) -> Self {
        Self {
            mode,
            participants,
            state,
            prior: None,
            round: 0,
            frozen: false,
            waiting_for: None,
            fault: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> &E::State {
        &self.state
    }

    /// State before the most recent turn, `None` before the first.
    #[must_use]
    pub fn prior_state(&self) -> Option<&E::State> {
        self.prior.as_ref()
    }

    /// Turns executed so far.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Responsive participant whose submission is expected.
    #[must_use]
    pub fn waiting_for(&self) -> Option<&ParticipantId> {
        self.waiting_for.as_ref()
    }

    #[must_use]
    pub fn fault(&self) -> Option<&MatchFault> {
        self.fault.as_ref()
    }

    #[must_use]
    pub fn participants(&self) -> &SeatMap<Participant<E>> {
        &self.participants
    }

    #[must_use]
    pub fn participant(&self, seat: Seat) -> &Participant<E> {
        &self.participants[seat]
    }

    pub fn participant_mut(&mut self, seat: Seat) -> &mut Participant<E> {
        &mut self.participants[seat]
    }

    /// Seat of the participant with `id`.
    #[must_use]
    pub fn seat_of(&self, id: &str) -> Option<Seat> {
        self.participants.find(|p| p.id().as_str() == id)
    }

    /// Freeze the match for good.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.waiting_for = None;
    }

    /// Record a match-fatal fault and freeze.
    pub fn record_fault(&mut self, fault: MatchFault) {
        log::error!("Match frozen after round {}: {fault}", self.round);
        self.fault = Some(fault);
        self.freeze();
    }
}

impl<E: RulesEngine> std::fmt::Debug for MatchSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSession")
            .field("mode", &self.mode)
            .field("participants", &self.participants)
            .field("round", &self.round)
            .field("frozen", &self.frozen)
            .field("waiting_for", &self.waiting_for)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

/// Pacing knobs for the mixed-mode chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSettings {
    /// Pause before an autonomous reply to a human turn.
    pub reply_delay: Duration,
    /// Most consecutive autonomous turns one chain may play.
    pub max_turns: usize,
}

struct MatchShared<E: RulesEngine> {
    engine: Arc<E>,
    mode: MatchMode,
    session: Mutex<MatchSession<E>>,
    control: LoopControl,
    chain: ChainSettings,
}

/// Shared handle to a running match.
///
/// Cheap to clone. The arena, the autonomous loop and chain threads each
/// hold one.
pub struct MatchHandle<E: RulesEngine> {
    shared: Arc<MatchShared<E>>,
}

impl<E: RulesEngine> Clone for MatchHandle<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: RulesEngine> MatchHandle<E> {
    #[must_use]
    pub fn new(engine: Arc<E>, session: MatchSession<E>, control: LoopControl, chain: ChainSettings) -> Self {
        Self {
            shared: Arc::new(MatchShared {
                engine,
                mode: session.mode,
                session: Mutex::new(session),
                control,
                chain,
            }),
        }
    }

    /// Acquire the session lock.
    pub fn lock(&self) -> MutexGuard<'_, MatchSession<E>> {
        self.shared.session.lock()
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    /// Mode, readable without the session lock.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.shared.mode
    }

    #[must_use]
    pub fn control(&self) -> &LoopControl {
        &self.shared.control
    }

    #[must_use]
    pub fn chain_settings(&self) -> ChainSettings {
        self.shared.chain
    }

    /// Check if two handles point at the same match.
    #[must_use]
    pub fn same_match(&self, other: &MatchHandle<E>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<E: RulesEngine> std::fmt::Debug for MatchHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchHandle")
            .field("mode", &self.shared.mode)
            .finish_non_exhaustive()
    }
}

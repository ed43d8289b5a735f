//! Match participants.
//!
//! A participant occupies one seat and is either Responsive (decisions
//! arrive from outside through a transport) or Autonomous (decisions come
//! from a boxed `Agent`). Both receive the reward hook after every turn.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::agent::Agent;
use crate::core::seat::Seat;
use crate::rules::RulesEngine;

/// Stable participant id, e.g. `"player1"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The conventional id for a seat: `player1` / `player2`.
    #[must_use]
    pub fn for_seat(seat: Seat) -> Self {
        Self(format!("player{}", seat.index() + 1))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Variant-specific participant data.
pub enum ParticipantKind<E: RulesEngine> {
    /// Decisions come from an external submission.
    Responsive {
        /// Transport session id.
        session_id: String,
        /// Last liveness signal, if any.
        last_contact: Option<Instant>,
    },
    /// Decisions come from an agent.
    Autonomous {
        /// Registry id the agent was built from.
        agent_id: String,
        agent: Box<dyn Agent<E>>,
    },
}

/// One seat's occupant.
pub struct Participant<E: RulesEngine> {
    id: ParticipantId,
    name: String,
    seat: Seat,
    kind: ParticipantKind<E>,
    reward_updates: u64,
    last_signal: Option<f64>,
}

impl<E: RulesEngine> Participant<E> {
    /// A human seat. Id and session id follow the seat convention.
    #[must_use]
    pub fn responsive(seat: Seat, name: impl Into<String>) -> Self {
        let id = ParticipantId::for_seat(seat);
        Self {
            kind: ParticipantKind::Responsive {
                session_id: id.as_str().to_string(),
                last_contact: None,
            },
            id,
            name: name.into(),
            seat,
            reward_updates: 0,
            last_signal: None,
        }
    }

    /// An agent-driven seat.
    #[must_use]
    pub fn autonomous(
        seat: Seat,
        name: impl Into<String>,
        agent_id: impl Into<String>,
        agent: Box<dyn Agent<E>>,
    ) -> Self {
        Self {
            id: ParticipantId::for_seat(seat),
            name: name.into(),
            seat,
            kind: ParticipantKind::Autonomous {
                agent_id: agent_id.into(),
                agent,
            },
            reward_updates: 0,
            last_signal: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn seat(&self) -> Seat {
        self.seat
    }

    #[must_use]
    pub fn kind(&self) -> &ParticipantKind<E> {
        &self.kind
    }

    #[must_use]
    pub fn is_autonomous(&self) -> bool {
        matches!(self.kind, ParticipantKind::Autonomous { .. })
    }

    #[must_use]
    pub fn is_responsive(&self) -> bool {
        !self.is_autonomous()
    }

    /// Agent of an autonomous participant.
    pub fn agent_mut(&mut self) -> Option<&mut (dyn Agent<E> + 'static)> {
        match &mut self.kind {
            ParticipantKind::Autonomous { agent, .. } => Some(agent.as_mut()),
            ParticipantKind::Responsive { .. } => None,
        }
    }

    /// Times the reward hook has run.
    #[must_use]
    pub fn reward_updates(&self) -> u64 {
        self.reward_updates
    }

    /// Signal passed to the most recent reward hook.
    #[must_use]
    pub fn last_signal(&self) -> Option<f64> {
        self.last_signal
    }

    /// Record a liveness signal. No-op for autonomous participants.
    pub fn touch(&mut self, now: Instant) {
        if let ParticipantKind::Responsive { last_contact, .. } = &mut self.kind {
            *last_contact = Some(now);
        }
    }

    /// Reward hook. Responsive participants only record the signal.
    pub fn on_reward(
        &mut self,
        old: &E::Observation,
        new: &E::Observation,
        was_actor: bool,
        signal: Option<f64>,
    ) {
        self.reward_updates += 1;
        self.last_signal = signal;
        if let ParticipantKind::Autonomous { agent, .. } = &mut self.kind {
            agent.on_reward(old, new, was_actor, signal);
        }
    }
}

impl<E: RulesEngine> std::fmt::Debug for Participant<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            ParticipantKind::Responsive { .. } => "Responsive".to_string(),
            ParticipantKind::Autonomous { agent_id, .. } => format!("Autonomous({agent_id})"),
        };
        f.debug_struct("Participant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("seat", &self.seat)
            .field("kind", &kind)
            .field("reward_updates", &self.reward_updates)
            .finish()
    }
}

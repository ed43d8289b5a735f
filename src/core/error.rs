//! Error types shared across the crate.
//!
//! Request-path errors (`ArenaError`, `TurnError`, `RulesError`) are
//! local and leave state untouched. `MatchFault` is different: it is
//! recorded on a session when an autonomous participant times out,
//! faults or has nothing to play, and it freezes that match for good.

use std::time::Duration;

use thiserror::Error;

use super::seat::Seat;

/// Errors raised by a rules engine.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RulesError {
    /// The engine refused to apply the decision.
    #[error("illegal decision: {0}")]
    IllegalDecision(String),

    /// A resource cap (e.g. hand size) would be broken by the decision.
    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),
}

/// Errors raised by an autonomous agent's decision procedure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The agent had nothing to offer.
    #[error("agent returned no decision")]
    NoDecision,

    /// The agent failed while deciding.
    #[error("agent failed: {0}")]
    Failed(String),
}

/// Errors from the turn executor.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The session is frozen (terminal or faulted).
    #[error("match is over")]
    MatchOver,

    /// The rules engine rejected the decision; prior state is kept.
    #[error("illegal decision: {0}")]
    IllegalDecision(String),
}

/// Why an autonomous participant ended a match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultReason {
    /// The decision call returned after the configured timeout.
    DecisionTimeout { elapsed: Duration, limit: Duration },

    /// The decision call returned an error, panicked, or chose a
    /// decision the engine refused.
    DecisionFault(String),

    /// The actor had no legal decisions. Usually a rules-engine bug.
    NoLegalDecisions,

    /// The mixed-mode coordinator kept being handed autonomous turns.
    ChainLimitExceeded(usize),
}

impl std::fmt::Display for FaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultReason::DecisionTimeout { elapsed, limit } => write!(
                f,
                "decision timeout: {:.2}s > {:.2}s",
                elapsed.as_secs_f64(),
                limit.as_secs_f64()
            ),
            FaultReason::DecisionFault(msg) => write!(f, "decision fault: {msg}"),
            FaultReason::NoLegalDecisions => write!(f, "no legal decisions"),
            FaultReason::ChainLimitExceeded(limit) => {
                write!(f, "more than {limit} consecutive autonomous turns")
            }
        }
    }
}

/// A match-fatal fault attributed to one participant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchFault {
    /// Display name of the offending participant.
    pub participant: String,
    /// Seat of the offending participant.
    pub seat: Seat,
    pub reason: FaultReason,
}

impl MatchFault {
    #[must_use]
    pub fn new(participant: impl Into<String>, seat: Seat, reason: FaultReason) -> Self {
        Self {
            participant: participant.into(),
            seat,
            reason,
        }
    }
}

impl std::fmt::Display for MatchFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.participant, self.seat, self.reason)
    }
}

/// Errors returned to the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("players not ready: {0}")]
    PlayersNotReady(String),

    #[error("game is full")]
    SeatsFull,

    #[error("human players cannot connect: {0}")]
    HumansRejected(String),

    #[error("no active session")]
    NoActiveSession,

    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("not your turn: {0}")]
    NotYourTurn(String),

    #[error("resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    #[error("illegal decision: {0}")]
    IllegalDecision(String),

    #[error("malformed decision: {0}")]
    MalformedDecision(String),

    #[error("match is over")]
    MatchOver,

    #[error("not in bot-vs-bot mode")]
    NotAutonomousMode,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<TurnError> for ArenaError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::MatchOver => ArenaError::MatchOver,
            TurnError::IllegalDecision(msg) => ArenaError::IllegalDecision(msg),
        }
    }
}

impl From<RulesError> for ArenaError {
    fn from(err: RulesError) -> Self {
        match err {
            RulesError::IllegalDecision(msg) => ArenaError::IllegalDecision(msg),
            RulesError::ResourceLimitExceeded(msg) => ArenaError::ResourceLimitExceeded(msg),
        }
    }
}

/// Result alias for transport-facing operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

//! Core types: seats, RNG, configuration and errors.
//!
//! These are game-agnostic building blocks shared by the rules engines,
//! the participants and the session layer.

pub mod seat;
pub mod rng;
pub mod config;
pub mod error;

pub use seat::{Seat, SeatMap};
pub use rng::GameRng;
pub use config::{clamp_speed, clamp_timeout, ArenaConfig, MAX_DURATION_SECS, MAX_SPEED, MAX_TIMEOUT_SECS, MIN_SPEED};
pub use error::{AgentError, ArenaError, ArenaResult, FaultReason, MatchFault, RulesError, TurnError};

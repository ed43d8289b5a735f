//! Match orchestration.
//!
//! Two drivers feed turns into a match: submissions from responsive
//! participants and the autonomous loop. Both go through
//! `execute_turn` under the session lock; the coordinator then decides
//! who drives next.

pub mod coordinator;
pub mod liveness;
pub mod match_session;
pub mod scheduler;
pub mod turn;

pub use coordinator::{coordinate, publish_waiting, run_chain, Handoff};
pub use liveness::LivenessTracker;
pub use match_session::{ChainSettings, MatchHandle, MatchMode, MatchSession};
pub use scheduler::{
    play_autonomous_turn, run_autonomous_loop, spawn_autonomous_loop, AutonomousTurn, ControlSnapshot, LoopControl,
};
pub use turn::{execute_turn, TurnReport};

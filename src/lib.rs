//! # bazaar-arena
//!
//! Match host for a two-player, turn-based trading game where human
//! players and autonomous agents share one match.
//!
//! ## Design Principles
//!
//! 1. **Rules-Agnostic Core**: The session layer only talks to the
//!    `RulesEngine` contract. Bazaar is one engine among possible others.
//!
//! 2. **One Turn Path**: Human submissions and the autonomous loop both
//!    apply turns through `execute_turn` under the session lock.
//!
//! 3. **Immutable States**: Engines return new states; agents preview
//!    decisions on private copies. Persistent collections via `im-rs`
//!    keep those copies cheap.
//!
//! ## Modules
//!
//! - `core`: Seats, RNG, configuration, errors
//! - `rules`: RulesEngine trait for game implementations
//! - `games`: Bazaar rules engine
//! - `participants`: Agents, participants and the agent registry
//! - `session`: Match session, turn execution, coordinator, autonomous loop
//! - `arena`: Lobby, match lifecycle and snapshots for the transport

pub mod core;
pub mod rules;
pub mod games;
pub mod participants;
pub mod session;
pub mod arena;

// Re-export commonly used types
pub use crate::core::{
    Seat, SeatMap, GameRng, ArenaConfig,
    AgentError, ArenaError, ArenaResult, FaultReason, MatchFault, RulesError, TurnError,
};

pub use crate::rules::{RulesEngine, GameResult};

pub use crate::games::bazaar::{
    Bazaar, BazaarBuilder, BazaarConfig, BazaarDecision, BazaarState,
    DecisionRequest, GoodType, MarketObservation,
};

pub use crate::participants::{
    Agent, AgentRegistry, CamelHoarder, GreedyAgent, Participant, ParticipantId, RandomAgent,
};

pub use crate::session::{
    execute_turn, LoopControl, MatchHandle, MatchMode, MatchSession, TurnReport,
};

pub use crate::arena::{Arena, ClientKind, LobbyStatus, PrivateSnapshot, PublicSnapshot, SeatAssignment};

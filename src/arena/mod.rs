//! Transport-facing facade.
//!
//! `Arena` exposes every operation a transport needs as a plain method
//! returning `ArenaResult`; snapshots serialise to the JSON clients read.

pub mod host;
pub mod lobby;
pub mod snapshot;

pub use host::Arena;
pub use lobby::{seat_name, ClientKind, Lobby, SeatAssignment};
pub use snapshot::{
    EnginePrivateSnapshot, EnginePublicSnapshot, LastAction, LobbyStatus, ParticipantSummary, PrivateSnapshot,
    PublicSnapshot,
};

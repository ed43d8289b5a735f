//! Lobby: pending mode, seat claims and liveness before and during a match.

use std::time::Instant;

use serde::Serialize;

use crate::core::error::{ArenaError, ArenaResult};
use crate::core::seat::{Seat, SeatMap};
use crate::participants::ParticipantId;
use crate::session::{LivenessTracker, MatchMode};

/// What is connecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientKind {
    /// A human who wants a seat.
    Player,
    /// A host screen or spectator; never takes a seat.
    Spectator,
}

impl ClientKind {
    /// Parse the transport's client type. Anything but `"player"` is a
    /// spectator.
    #[must_use]
    pub fn from_wire(kind: &str) -> Self {
        if kind == "player" {
            ClientKind::Player
        } else {
            ClientKind::Spectator
        }
    }
}

/// Seat handed to a connecting player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub player_id: ParticipantId,
    pub player_name: String,
    pub session_id: String,
    #[serde(skip)]
    pub seat: Seat,
}

impl SeatAssignment {
    fn for_seat(seat: Seat) -> Self {
        let id = ParticipantId::for_seat(seat);
        Self {
            session_id: id.as_str().to_string(),
            player_id: id,
            player_name: seat_name(seat),
            seat,
        }
    }
}

/// Default display name of a human seat.
#[must_use]
pub fn seat_name(seat: Seat) -> String {
    format!("Player {}", seat.index() + 1)
}

/// Seat claims and liveness.
#[derive(Clone, Debug)]
pub struct Lobby {
    pending_mode: Option<MatchMode>,
    claimed: SeatMap<bool>,
    liveness: LivenessTracker,
}

impl Lobby {
    #[must_use]
    pub fn new(liveness: LivenessTracker) -> Self {
        Self {
            pending_mode: None,
            claimed: SeatMap::with_value(false),
            liveness,
        }
    }

    #[must_use]
    pub fn pending_mode(&self) -> Option<MatchMode> {
        self.pending_mode
    }

    pub fn set_pending_mode(&mut self, mode: MatchMode) {
        self.pending_mode = Some(mode);
    }

    /// Release claimed seats whose liveness has lapsed.
    pub fn refresh(&mut self, now: Instant) {
        for seat in Seat::all() {
            let id = ParticipantId::for_seat(seat);
            if self.claimed[seat] && !self.liveness.is_connected(&id, now) {
                log::info!("{} disconnected (no contact within {:?})", seat_name(seat), self.liveness.window());
                self.claimed[seat] = false;
                self.liveness.forget(&id);
            }
        }
    }

    /// Check if a seat is claimed and alive.
    #[must_use]
    pub fn is_connected(&self, seat: Seat, now: Instant) -> bool {
        self.claimed[seat] && self.liveness.is_connected(&ParticipantId::for_seat(seat), now)
    }

    /// Claim a seat for a connecting client, following the pending mode.
    ///
    /// Spectators are accepted without a seat.
    pub fn connect(&mut self, client: ClientKind, now: Instant) -> ArenaResult<Option<SeatAssignment>> {
        if client == ClientKind::Spectator {
            return Ok(None);
        }
        self.refresh(now);

        let seat = match self.pending_mode {
            Some(MatchMode::AutonomousVsAutonomous) => {
                return Err(ArenaError::HumansRejected(
                    "bot-vs-bot mode does not take human players".into(),
                ));
            }
            Some(MatchMode::ResponsiveVsAutonomous) => {
                if self.claimed[Seat::First] {
                    return Err(ArenaError::SeatsFull);
                }
                Seat::First
            }
            Some(MatchMode::ResponsiveVsResponsive) | None => {
                self.claimed.find(|claimed| !claimed).ok_or(ArenaError::SeatsFull)?
            }
        };

        self.claimed[seat] = true;
        self.liveness.record_contact(&ParticipantId::for_seat(seat), now);
        log::info!("Assigned {}", seat_name(seat));
        Ok(Some(SeatAssignment::for_seat(seat)))
    }

    /// Record a contact signal from a seat id.
    pub fn record_contact(&mut self, id: &str, now: Instant) -> ArenaResult<Seat> {
        let seat = Seat::all()
            .find(|&seat| ParticipantId::for_seat(seat).as_str() == id)
            .ok_or_else(|| ArenaError::UnknownParticipant(id.to_string()))?;
        self.liveness.record_contact(&ParticipantId::for_seat(seat), now);
        Ok(seat)
    }

    /// Check the humans a mode needs are connected.
    #[must_use]
    pub fn players_ready(&self, mode: Option<MatchMode>, now: Instant) -> bool {
        match mode {
            Some(MatchMode::AutonomousVsAutonomous) => true,
            Some(MatchMode::ResponsiveVsAutonomous) => self.is_connected(Seat::First, now),
            Some(MatchMode::ResponsiveVsResponsive) | None => {
                Seat::all().all(|seat| self.is_connected(seat, now))
            }
        }
    }

    /// Back to the state of a fresh lobby.
    pub fn reset(&mut self) {
        self.pending_mode = None;
        self.claimed = SeatMap::with_value(false);
        self.liveness.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn lobby() -> Lobby {
        Lobby::new(LivenessTracker::new(Duration::from_secs(10)))
    }

    #[test]
    fn test_first_free_assignment() {
        let mut lobby = lobby();
        let now = Instant::now();

        let first = lobby.connect(ClientKind::Player, now).unwrap().unwrap();
        let second = lobby.connect(ClientKind::Player, now).unwrap().unwrap();

        assert_eq!(first.player_id.as_str(), "player1");
        assert_eq!(second.player_name, "Player 2");
        assert_eq!(lobby.connect(ClientKind::Player, now), Err(ArenaError::SeatsFull));
        assert!(lobby.players_ready(Some(MatchMode::ResponsiveVsResponsive), now));
    }

    #[test]
    fn test_spectator_takes_no_seat() {
        let mut lobby = lobby();
        assert_eq!(lobby.connect(ClientKind::from_wire("host"), Instant::now()), Ok(None));
        assert!(!lobby.is_connected(Seat::First, Instant::now()));
    }

    #[test]
    fn test_bot_mode_rejects_humans() {
        let mut lobby = lobby();
        lobby.set_pending_mode(MatchMode::AutonomousVsAutonomous);

        assert!(matches!(
            lobby.connect(ClientKind::Player, Instant::now()),
            Err(ArenaError::HumansRejected(_))
        ));
        assert!(lobby.players_ready(Some(MatchMode::AutonomousVsAutonomous), Instant::now()));
    }

    #[test]
    fn test_human_vs_bot_admits_one() {
        let mut lobby = lobby();
        lobby.set_pending_mode(MatchMode::ResponsiveVsAutonomous);
        let now = Instant::now();

        let seat = lobby.connect(ClientKind::Player, now).unwrap().unwrap();
        assert_eq!(seat.seat, Seat::First);
        assert_eq!(lobby.connect(ClientKind::Player, now), Err(ArenaError::SeatsFull));
        assert!(lobby.players_ready(Some(MatchMode::ResponsiveVsAutonomous), now));
    }

    #[test]
    fn test_lapsed_seat_is_freed() {
        let mut lobby = lobby();
        let t0 = Instant::now();
        lobby.connect(ClientKind::Player, t0).unwrap();
        lobby.connect(ClientKind::Player, t0).unwrap();

        let later = t0 + Duration::from_secs(11);
        lobby.record_contact("player2", later).unwrap();
        assert!(!lobby.is_connected(Seat::First, later));

        let reclaimed = lobby.connect(ClientKind::Player, later).unwrap().unwrap();
        assert_eq!(reclaimed.seat, Seat::First);
    }

    #[test]
    fn test_unknown_contact() {
        let mut lobby = lobby();
        assert!(matches!(
            lobby.record_contact("player9", Instant::now()),
            Err(ArenaError::UnknownParticipant(_))
        ));
    }
}

//! Serialisable snapshots for the transport.
//!
//! Field names are camelCase so the JSON matches what browser clients
//! expect. The engine's own view is flattened into the top level.

use serde::Serialize;

use crate::core::seat::Seat;
use crate::participants::{Participant, ParticipantId, ParticipantKind};
use crate::rules::{GameResult, RulesEngine};
use crate::session::{ControlSnapshot, MatchMode, MatchSession};

/// Connection state of the lobby, as shown in snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LobbyStatus {
    pub pending_mode: Option<MatchMode>,
    pub players_ready: bool,
    pub connected: [bool; 2],
}

/// One seat's occupant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    pub seat: Seat,
    pub autonomous: bool,
    pub agent_id: Option<String>,
    pub reward_updates: u64,
}

impl ParticipantSummary {
    fn of<E: RulesEngine>(participant: &Participant<E>) -> Self {
        let agent_id = match participant.kind() {
            ParticipantKind::Autonomous { agent_id, .. } => Some(agent_id.clone()),
            ParticipantKind::Responsive { .. } => None,
        };
        Self {
            id: participant.id().clone(),
            name: participant.name().to_string(),
            seat: participant.seat(),
            autonomous: participant.is_autonomous(),
            agent_id,
            reward_updates: participant.reward_updates(),
        }
    }
}

/// The most recently applied decision.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastAction<D> {
    /// Name of the participant who played it.
    pub player: String,
    pub decision: D,
    pub description: String,
}

/// Everything a spectator may see.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSnapshot<V, D> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub game_started: bool,
    pub game_mode: Option<MatchMode>,
    pub pending_mode: Option<MatchMode>,
    pub players_ready: bool,
    pub player1_connected: bool,
    pub player2_connected: bool,
    pub round: u32,
    #[serde(flatten)]
    pub board: Option<V>,
    pub participants: Vec<ParticipantSummary>,
    pub current_player: Option<String>,
    pub is_terminal: bool,
    pub winner: Option<String>,
    pub last_action: Option<LastAction<D>>,
    pub waiting_for_player: Option<ParticipantId>,
    pub bot_paused: Option<bool>,
    pub bot_running: Option<bool>,
    pub bot_speed: Option<f64>,
    pub bot_timeout: f64,
    pub bot_timeout_player: Option<String>,
    pub fault: Option<String>,
}

/// Public snapshot type for an engine.
pub type EnginePublicSnapshot<E> =
    PublicSnapshot<<E as RulesEngine>::PublicView, <E as RulesEngine>::Decision>;

/// Private snapshot type for an engine.
pub type EnginePrivateSnapshot<E> =
    PrivateSnapshot<<E as RulesEngine>::PrivateView, <E as RulesEngine>::Decision>;

impl<V, D> PublicSnapshot<V, D> {
    /// Snapshot with no match running.
    #[must_use]
    pub fn idle(lobby: LobbyStatus, default_timeout: f64) -> Self {
        Self {
            kind: "public",
            game_started: false,
            game_mode: None,
            pending_mode: lobby.pending_mode,
            players_ready: lobby.players_ready,
            player1_connected: lobby.connected[0],
            player2_connected: lobby.connected[1],
            round: 0,
            board: None,
            participants: Vec::new(),
            current_player: None,
            is_terminal: false,
            winner: None,
            last_action: None,
            waiting_for_player: None,
            bot_paused: None,
            bot_running: None,
            bot_speed: None,
            bot_timeout: default_timeout,
            bot_timeout_player: None,
            fault: None,
        }
    }
}

/// Build the public snapshot of a running match.
pub fn public_snapshot<E: RulesEngine>(
    engine: &E,
    session: &MatchSession<E>,
    control: ControlSnapshot,
    lobby: LobbyStatus,
) -> EnginePublicSnapshot<E> {
    let state = session.state();
    let terminal = engine.is_terminal(state);
    let name_of = |seat: Seat| session.participant(seat).name().to_string();

    let last_action = engine.last_decision(state).map(|decision| LastAction {
        player: session
            .prior_state()
            .map(|prior| name_of(engine.actor(prior)))
            .unwrap_or_else(|| "Unknown".to_string()),
        decision: decision.clone(),
        description: engine.describe(decision),
    });

    let winner = match engine.outcome(state) {
        Some(GameResult::Winner(seat)) => Some(name_of(seat)),
        Some(GameResult::Draw) | None => None,
    };

    let autonomous = session.mode().is_all_autonomous();
    let fault = session.fault();

    PublicSnapshot {
        kind: "public",
        game_started: true,
        game_mode: Some(session.mode()),
        pending_mode: lobby.pending_mode,
        players_ready: lobby.players_ready,
        player1_connected: lobby.connected[0],
        player2_connected: lobby.connected[1],
        round: session.round(),
        board: Some(engine.public_view(state)),
        participants: Seat::all()
            .map(|seat| ParticipantSummary::of(session.participant(seat)))
            .collect(),
        current_player: Some(name_of(engine.actor(state))),
        is_terminal: terminal,
        winner,
        last_action,
        waiting_for_player: session.waiting_for().cloned(),
        bot_paused: autonomous.then_some(control.paused),
        bot_running: autonomous.then_some(control.running && !session.is_frozen()),
        bot_speed: autonomous.then_some(control.speed),
        bot_timeout: control.timeout_secs,
        bot_timeout_player: fault.map(|f| f.participant.clone()),
        fault: fault.map(ToString::to_string),
    }
}

/// What one seat may see.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateSnapshot<P, D> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub game_started: bool,
    pub my_turn: bool,
    pub seat: Option<Seat>,
    #[serde(flatten)]
    pub view: Option<P>,
    pub legal_decisions: Vec<D>,
}

impl<P, D> PrivateSnapshot<P, D> {
    /// Snapshot for an unknown participant or with no match running.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            kind: "private",
            game_started: false,
            my_turn: false,
            seat: None,
            view: None,
            legal_decisions: Vec::new(),
        }
    }
}

/// Build one seat's private snapshot.
pub fn private_snapshot<E: RulesEngine>(
    engine: &E,
    session: &MatchSession<E>,
    seat: Seat,
) -> EnginePrivateSnapshot<E> {
    let state = session.state();
    let my_turn = !session.is_frozen() && engine.actor(state) == seat;

    PrivateSnapshot {
        kind: "private",
        game_started: true,
        my_turn,
        seat: Some(seat),
        view: Some(engine.private_view(seat, state)),
        legal_decisions: if my_turn {
            engine.legal_decisions(seat, state)
        } else {
            Vec::new()
        },
    }
}

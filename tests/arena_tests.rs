//! Arena integration tests.
//!
//! The transport-facing surface end to end with the Bazaar engine:
//! lobby, match lifecycle, the mixed-mode chain and reset.

mod common;

use std::time::Duration;

use bazaar_arena::arena::{Arena, ClientKind};
use bazaar_arena::core::{ArenaConfig, ArenaError, Seat};
use bazaar_arena::games::bazaar::Bazaar;
use bazaar_arena::participants::{AgentRegistry, ParticipantId};

use common::{init_logging, wait_until};

const PATIENCE: Duration = Duration::from_secs(30);

fn fast_arena(seed: u64) -> Arena<Bazaar> {
    let config = ArenaConfig::new()
        .with_base_delay(0.0)
        .with_autonomous_reply_delay(0.0)
        .with_match_seed(seed);
    Arena::with_config(Bazaar::default(), AgentRegistry::builtin(), config).unwrap()
}

fn waiting_for(arena: &Arena<Bazaar>) -> Option<ParticipantId> {
    let handle = arena.session()?;
    let waiting = handle.lock().waiting_for().cloned();
    waiting
}

fn is_frozen(arena: &Arena<Bazaar>) -> bool {
    let Some(handle) = arena.session() else {
        return false;
    };
    let frozen = handle.lock().is_frozen();
    frozen
}

fn round_of(arena: &Arena<Bazaar>) -> u32 {
    let Some(handle) = arena.session() else {
        return 0;
    };
    let round = handle.lock().round();
    round
}

// =============================================================================
// Lobby Tests
// =============================================================================

#[test]
fn test_lobby_seats_two_players() {
    let arena = Arena::bazaar();

    let first = arena.connect(ClientKind::Player).unwrap().unwrap();
    let second = arena.connect(ClientKind::Player).unwrap().unwrap();

    assert_eq!(first.player_id.as_str(), "player1");
    assert_eq!(first.player_name, "Player 1");
    assert_eq!(second.player_id.as_str(), "player2");
    assert_eq!(arena.connect(ClientKind::Player), Err(ArenaError::SeatsFull));
    assert_eq!(arena.connect(ClientKind::Spectator), Ok(None));

    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["playerId"], "player1");
    assert_eq!(json["sessionId"], "player1");

    let snapshot = arena.public_snapshot();
    assert!(snapshot.player1_connected && snapshot.player2_connected);
    assert!(snapshot.players_ready);
}

#[test]
fn test_bot_mode_rejects_players() {
    let arena = Arena::bazaar();
    arena.set_pending_mode("bot-vs-bot").unwrap();

    assert!(matches!(
        arena.connect(ClientKind::Player),
        Err(ArenaError::HumansRejected(_))
    ));
    assert!(matches!(
        arena.set_pending_mode("solitaire"),
        Err(ArenaError::InvalidMode(_))
    ));
}

#[test]
fn test_liveness_signals() {
    let arena = Arena::bazaar();
    arena.connect(ClientKind::Player).unwrap();

    assert_eq!(arena.record_liveness("player1"), Ok(()));
    assert!(matches!(
        arena.record_liveness("nobody"),
        Err(ArenaError::UnknownParticipant(_))
    ));
}

#[test]
fn test_agents_listing() {
    let arena = Arena::bazaar();
    let ids: Vec<String> = arena.agents().into_iter().map(|info| info.id).collect();
    assert_eq!(ids, ["camel-hoarder", "greedy", "random"]);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_human_match_waits_for_actor() {
    let arena = fast_arena(5);
    arena.connect(ClientKind::Player).unwrap();
    arena.connect(ClientKind::Player).unwrap();
    arena.start("human-vs-human", None, None).unwrap();

    let snapshot = arena.public_snapshot();
    assert!(snapshot.game_started);
    assert_eq!(snapshot.round, 0);
    assert_eq!(snapshot.bot_paused, None);

    let actor = waiting_for(&arena).unwrap();
    let private = arena.private_snapshot(actor.as_str());
    assert!(private.my_turn);
    assert!(!private.legal_decisions.is_empty());

    let decision = private.legal_decisions[0].clone();
    let report = arena.submit_decision(actor.as_str(), decision).unwrap();
    assert_eq!(report.round, 1);
    assert_ne!(waiting_for(&arena), Some(actor));

    let json = serde_json::to_value(arena.public_snapshot()).unwrap();
    assert_eq!(json["type"], "public");
    assert_eq!(json["round"], 1);
    assert!(json["lastAction"]["description"].is_string());
}

#[test]
fn test_unknown_agents_are_rejected() {
    let arena = fast_arena(5);
    assert!(matches!(
        arena.start("bot-vs-bot", Some("oracle"), Some("greedy")),
        Err(ArenaError::UnknownAgent(_))
    ));
    assert!(matches!(
        arena.start("bot-vs-bot", Some("greedy"), None),
        Err(ArenaError::UnknownAgent(_))
    ));
    assert!(arena.session().is_none());
}

#[test]
fn test_out_of_range_durations_are_rejected() {
    for config in [
        ArenaConfig::new().with_liveness_window(1e20),
        ArenaConfig::new().with_base_delay(1e12),
        ArenaConfig::new().with_shutdown_grace(f64::INFINITY),
    ] {
        let result = Arena::with_config(Bazaar::default(), AgentRegistry::builtin(), config);
        assert!(matches!(result, Err(ArenaError::InvalidConfig(_))));
    }
}

#[test]
fn test_human_vs_bot_hands_turn_back() {
    init_logging();
    let arena = fast_arena(11);
    arena.set_pending_mode("human-vs-bot").unwrap();
    arena.connect(ClientKind::Player).unwrap();
    arena.start("human-vs-bot", None, Some("greedy")).unwrap();

    let snapshot = arena.public_snapshot();
    assert_eq!(snapshot.participants[1].name, "Greedy");
    assert_eq!(snapshot.participants[1].agent_id.as_deref(), Some("greedy"));

    let human = ParticipantId::for_seat(Seat::First);
    for _ in 0..3 {
        assert!(wait_until(PATIENCE, || {
            waiting_for(&arena).as_ref() == Some(&human) || is_frozen(&arena)
        }));
        if is_frozen(&arena) {
            break;
        }

        let before = round_of(&arena);
        let private = arena.private_snapshot(human.as_str());
        assert!(private.my_turn);
        let report = arena.submit_decision(human.as_str(), private.legal_decisions[0].clone()).unwrap();
        assert_eq!(report.round, before + 1);
        if report.terminal {
            break;
        }

        // The bot answers on its own
        assert!(wait_until(PATIENCE, || {
            round_of(&arena) >= before + 2 || is_frozen(&arena)
        }));
    }

    assert!(arena.public_snapshot().fault.is_none());
}

#[test]
fn test_bot_match_plays_to_the_end() {
    init_logging();
    let arena = fast_arena(21);
    arena.start("bot-vs-bot", Some("greedy"), Some("camel-hoarder")).unwrap();
    arena.resume().unwrap();

    assert!(wait_until(PATIENCE, || is_frozen(&arena)));

    let snapshot = arena.public_snapshot();
    assert!(snapshot.is_terminal);
    assert!(snapshot.fault.is_none());
    assert_eq!(snapshot.participants[0].name, "Greedy 1");
    assert_eq!(snapshot.participants[1].name, "Camel Hoarder 2");
    for participant in &snapshot.participants {
        assert_eq!(participant.reward_updates, u64::from(snapshot.round));
    }
}

#[test]
fn test_starting_again_replaces_match() {
    init_logging();
    let arena = fast_arena(3);
    arena.start("bot-vs-bot", Some("random"), Some("random")).unwrap();
    let old = arena.session().unwrap();

    arena.start("bot-vs-bot", Some("greedy"), Some("greedy")).unwrap();
    let new = arena.session().unwrap();

    assert!(!old.same_match(&new));
    assert!(!old.control().is_running());
    assert!(new.control().is_running());
}

// =============================================================================
// Reset Tests
// =============================================================================

#[test]
fn test_reset_matches_fresh_arena() {
    init_logging();
    let arena = Arena::bazaar();
    arena.set_pending_mode("human-vs-human").unwrap();
    arena.connect(ClientKind::Player).unwrap();
    arena.connect(ClientKind::Player).unwrap();
    arena.set_timeout(5.0);
    arena.start("human", None, None).unwrap();

    arena.reset();

    let reset = serde_json::to_value(arena.public_snapshot()).unwrap();
    let fresh = serde_json::to_value(Arena::bazaar().public_snapshot()).unwrap();
    assert_eq!(reset, fresh);
    assert!(arena.session().is_none());

    let private = arena.private_snapshot("player1");
    assert!(!private.game_started);
}

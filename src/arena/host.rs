//! The `Arena`: the transport-facing facade.
//!
//! Every transport operation is a method here returning `ArenaResult`.
//! The arena holds at most one running match; starting a new one or
//! resetting shuts the previous one down.
//!
//! ## Lock order
//!
//! `current` before the session lock. The lobby lock and the control
//! lock are never held while acquiring the session lock.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use super::lobby::{seat_name, ClientKind, Lobby, SeatAssignment};
use super::snapshot::{
    private_snapshot, public_snapshot, EnginePrivateSnapshot, EnginePublicSnapshot, LobbyStatus, PrivateSnapshot,
    PublicSnapshot,
};
use crate::core::config::{clamp_timeout, ArenaConfig};
use crate::core::error::{ArenaError, ArenaResult};
use crate::core::seat::{Seat, SeatMap};
use crate::games::bazaar::{Bazaar, BazaarDecision, DecisionRequest};
use crate::participants::{AgentInfo, AgentRegistry, Participant};
use crate::rules::RulesEngine;
use crate::session::{
    coordinate, execute_turn, spawn_autonomous_loop, ChainSettings, LivenessTracker, LoopControl, MatchHandle,
    MatchMode, MatchSession, TurnReport,
};

struct ActiveMatch<E: RulesEngine> {
    handle: MatchHandle<E>,
    loop_thread: Option<JoinHandle<()>>,
}

/// Hosts one match at a time for a transport.
pub struct Arena<E: RulesEngine> {
    engine: Arc<E>,
    registry: AgentRegistry<E>,
    config: ArenaConfig,
    lobby: Mutex<Lobby>,
    current: Mutex<Option<ActiveMatch<E>>>,
    default_timeout: Mutex<f64>,
}

impl<E: RulesEngine> Arena<E> {
    /// Create an arena with the default configuration.
    #[must_use]
    pub fn new(engine: E, registry: AgentRegistry<E>) -> Self {
        Self::build(engine, registry, ArenaConfig::default())
    }

    /// Create an arena with a custom configuration.
    pub fn with_config(engine: E, registry: AgentRegistry<E>, config: ArenaConfig) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self::build(engine, registry, config))
    }

    fn build(engine: E, registry: AgentRegistry<E>, config: ArenaConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            registry,
            lobby: Mutex::new(Lobby::new(LivenessTracker::new(config.liveness_window()))),
            current: Mutex::new(None),
            default_timeout: Mutex::new(clamp_timeout(config.default_timeout_secs)),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    // === Lobby ===

    /// Agents that can be seated.
    #[must_use]
    pub fn agents(&self) -> Vec<AgentInfo> {
        self.registry.list()
    }

    /// Select the mode the lobby prepares for.
    pub fn set_pending_mode(&self, mode: &str) -> ArenaResult<MatchMode> {
        let mode: MatchMode = mode.parse()?;
        self.lobby.lock().set_pending_mode(mode);
        log::info!("Pending mode set to {mode}");
        Ok(mode)
    }

    /// Connect a client. Players get a seat; spectators get `None`.
    pub fn connect(&self, client: ClientKind) -> ArenaResult<Option<SeatAssignment>> {
        self.lobby.lock().connect(client, Instant::now())
    }

    /// Record a liveness signal from a seat.
    pub fn record_liveness(&self, participant_id: &str) -> ArenaResult<()> {
        let now = Instant::now();
        let seat = self.lobby.lock().record_contact(participant_id, now)?;

        if let Some(handle) = self.session() {
            let mut session = handle.lock();
            if session.participant(seat).is_responsive() {
                session.participant_mut(seat).touch(now);
            }
        }
        Ok(())
    }

    // === Session lifecycle ===

    /// Start a match, replacing any running one.
    ///
    /// `agent1` seats the first seat in bot-vs-bot mode; `agent2` seats
    /// the second seat in either mode with an agent.
    pub fn start(&self, mode: &str, agent1: Option<&str>, agent2: Option<&str>) -> ArenaResult<()> {
        let mode: MatchMode = mode.parse()?;
        let now = Instant::now();

        {
            let mut lobby = self.lobby.lock();
            lobby.refresh(now);
            if !lobby.players_ready(Some(mode), now) {
                return Err(ArenaError::PlayersNotReady(match mode {
                    MatchMode::ResponsiveVsResponsive => "both players must be connected".into(),
                    _ => "player 1 must be connected".into(),
                }));
            }
        }

        let participants = self.seat_participants(mode, agent1, agent2)?;
        let seed = self.config.match_seed.unwrap_or_else(clock_seed);
        let session = MatchSession::new(mode, participants, self.engine.new_match(seed));
        let control = LoopControl::new(
            self.config.base_delay(),
            self.config.default_speed,
            *self.default_timeout.lock(),
            mode.is_all_autonomous(),
        );
        let chain = ChainSettings {
            reply_delay: self.config.autonomous_reply_delay(),
            max_turns: self.config.max_autonomous_chain,
        };
        let handle = MatchHandle::new(Arc::clone(&self.engine), session, control, chain);

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            self.stop(previous);
        }

        {
            let mut session = handle.lock();
            log::info!(
                "Match started ({mode}): {} vs {}",
                session.participant(Seat::First).name(),
                session.participant(Seat::Second).name()
            );
            coordinate(&handle, &mut *session);
        }

        let loop_thread = if mode.is_all_autonomous() {
            match spawn_autonomous_loop(handle.clone()) {
                Ok(thread) => Some(thread),
                Err(err) => {
                    log::error!("Could not start autonomous loop: {err}");
                    return Err(ArenaError::InvalidConfig(format!("could not start autonomous loop: {err}")));
                }
            }
        } else {
            None
        };

        *current = Some(ActiveMatch { handle, loop_thread });
        Ok(())
    }

    fn seat_participants(
        &self,
        mode: MatchMode,
        agent1: Option<&str>,
        agent2: Option<&str>,
    ) -> ArenaResult<SeatMap<Participant<E>>> {
        let seeds = self.config.seat_seeds;
        let agent = |seat: Seat, id: Option<&str>, numbered: bool| -> ArenaResult<Participant<E>> {
            let id = id.ok_or_else(|| ArenaError::UnknownAgent(format!("no agent for {seat}")))?;
            let (name, agent) = self.registry.build(id, seeds[seat.index()])?;
            let name = if numbered {
                format!("{name} {}", seat.index() + 1)
            } else {
                name
            };
            Ok(Participant::autonomous(seat, name, id, agent))
        };

        Ok(match mode {
            MatchMode::ResponsiveVsResponsive => {
                SeatMap::new(|seat| Participant::responsive(seat, seat_name(seat)))
            }
            MatchMode::ResponsiveVsAutonomous => SeatMap::from_pair(
                Participant::responsive(Seat::First, seat_name(Seat::First)),
                agent(Seat::Second, agent2, false)?,
            ),
            MatchMode::AutonomousVsAutonomous => {
                let first = agent(Seat::First, agent1, true)?;
                let second = agent(Seat::Second, agent2, true)?;
                SeatMap::from_pair(first, second)
            }
        })
    }

    /// Shut a match down and wait briefly for its loop thread.
    fn stop(&self, active: ActiveMatch<E>) {
        let control = active.handle.control();
        control.shutdown();

        if let Some(thread) = active.loop_thread {
            if control.wait_stopped(self.config.shutdown_grace()) {
                if thread.join().is_err() {
                    log::warn!("Autonomous loop thread panicked");
                }
            } else {
                log::warn!(
                    "Autonomous loop did not stop within {:?}; detaching it",
                    self.config.shutdown_grace()
                );
            }
        }
    }

    /// Discard the match and return to a freshly constructed state.
    pub fn reset(&self) {
        let previous = self.current.lock().take();
        if let Some(active) = previous {
            self.stop(active);
        }
        self.lobby.lock().reset();
        *self.default_timeout.lock() = clamp_timeout(self.config.default_timeout_secs);
        log::info!("Arena reset");
    }

    /// Handle to the running match, if any.
    #[must_use]
    pub fn session(&self) -> Option<MatchHandle<E>> {
        self.current.lock().as_ref().map(|active| active.handle.clone())
    }

    // === Turns ===

    /// Apply a decision submitted by a responsive participant.
    pub fn submit_decision(&self, participant_id: &str, decision: E::Decision) -> ArenaResult<TurnReport> {
        let handle = self.session().ok_or(ArenaError::NoActiveSession)?;
        let engine = handle.engine();
        let mut session = handle.lock();

        let seat = session
            .seat_of(participant_id)
            .ok_or_else(|| ArenaError::UnknownParticipant(participant_id.to_string()))?;
        if !session.participant(seat).is_responsive() {
            return Err(ArenaError::UnknownParticipant(format!(
                "{participant_id} is not a responsive participant"
            )));
        }
        if session.is_frozen() {
            return Err(ArenaError::MatchOver);
        }
        if engine.actor(session.state()) != seat {
            return Err(ArenaError::NotYourTurn(participant_id.to_string()));
        }
        engine.check_limits(seat, session.state(), &decision)?;

        let report = execute_turn(&mut *session, engine, &decision)?;
        coordinate(&handle, &mut *session);
        Ok(report)
    }

    // === Autonomous controls ===

    fn autonomous_handle(&self) -> ArenaResult<MatchHandle<E>> {
        self.session()
            .filter(|handle| handle.mode().is_all_autonomous())
            .ok_or(ArenaError::NotAutonomousMode)
    }

    pub fn pause(&self) -> ArenaResult<()> {
        self.autonomous_handle()?.control().pause();
        Ok(())
    }

    pub fn resume(&self) -> ArenaResult<()> {
        self.autonomous_handle()?.control().resume();
        Ok(())
    }

    /// Let exactly one autonomous turn through, pausing first.
    pub fn step(&self) -> ArenaResult<()> {
        self.autonomous_handle()?.control().step();
        Ok(())
    }

    /// Set the speed multiplier. Returns the clamped value.
    pub fn set_speed(&self, speed: f64) -> ArenaResult<f64> {
        Ok(self.autonomous_handle()?.control().set_speed(speed))
    }

    /// Set the decision timeout in seconds (0 disables). Applies to the
    /// running match and seeds future ones. Returns the clamped value.
    pub fn set_timeout(&self, secs: f64) -> f64 {
        let secs = clamp_timeout(secs);
        *self.default_timeout.lock() = secs;
        if let Some(handle) = self.session() {
            handle.control().set_timeout(secs);
        }
        log::info!("Decision timeout set to {secs}s");
        secs
    }

    // === Snapshots ===

    fn lobby_status(&self, mode: Option<MatchMode>) -> LobbyStatus {
        let now = Instant::now();
        let mut lobby = self.lobby.lock();
        lobby.refresh(now);
        LobbyStatus {
            pending_mode: lobby.pending_mode(),
            players_ready: lobby.players_ready(mode.or(lobby.pending_mode()), now),
            connected: [lobby.is_connected(Seat::First, now), lobby.is_connected(Seat::Second, now)],
        }
    }

    /// Everything a spectator may see.
    #[must_use]
    pub fn public_snapshot(&self) -> EnginePublicSnapshot<E> {
        match self.session() {
            None => PublicSnapshot::idle(self.lobby_status(None), *self.default_timeout.lock()),
            Some(handle) => {
                let lobby = self.lobby_status(Some(handle.mode()));
                let control = handle.control().snapshot();
                let session = handle.lock();
                public_snapshot(handle.engine(), &session, control, lobby)
            }
        }
    }

    /// What one seat may see. Unknown ids get an idle snapshot.
    #[must_use]
    pub fn private_snapshot(&self, participant_id: &str) -> EnginePrivateSnapshot<E> {
        let Some(handle) = self.session() else {
            return PrivateSnapshot::idle();
        };
        let session = handle.lock();
        match session.seat_of(participant_id) {
            Some(seat) => private_snapshot(handle.engine(), &session, seat),
            None => PrivateSnapshot::idle(),
        }
    }
}

impl Arena<Bazaar> {
    /// A Bazaar arena with the built-in agents.
    #[must_use]
    pub fn bazaar() -> Self {
        Self::new(Bazaar::default(), AgentRegistry::builtin())
    }

    /// Submit a decision in the transport's loose form.
    pub fn submit_request(&self, participant_id: &str, request: &DecisionRequest) -> ArenaResult<TurnReport> {
        let decision = BazaarDecision::from_request(request).map_err(ArenaError::MalformedDecision)?;
        self.submit_decision(participant_id, decision)
    }
}

impl<E: RulesEngine> Drop for Arena<E> {
    fn drop(&mut self) {
        if let Some(active) = self.current.get_mut().take() {
            active.handle.control().shutdown();
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_need_autonomous_mode() {
        let arena = Arena::bazaar();
        assert_eq!(arena.pause(), Err(ArenaError::NotAutonomousMode));
        assert_eq!(arena.set_speed(2.0), Err(ArenaError::NotAutonomousMode));
        assert_eq!(arena.set_timeout(500.0), 300.0);
    }

    #[test]
    fn test_start_requires_players() {
        let arena = Arena::bazaar();
        assert!(matches!(
            arena.start("human", None, None),
            Err(ArenaError::PlayersNotReady(_))
        ));
        assert!(matches!(
            arena.start("chess", None, None),
            Err(ArenaError::InvalidMode(_))
        ));
        assert!(arena.session().is_none());
    }

    #[test]
    fn test_submit_without_session() {
        let arena = Arena::bazaar();
        let decision = BazaarDecision::Take {
            good: crate::games::bazaar::GoodType::Camel,
            count: 3,
        };
        assert_eq!(arena.submit_decision("player1", decision), Err(ArenaError::NoActiveSession));
    }

    #[test]
    fn test_malformed_request() {
        let arena = Arena::bazaar();
        let request = DecisionRequest {
            kind: "Steal".into(),
            ..DecisionRequest::default()
        };
        assert!(matches!(
            arena.submit_request("player1", &request),
            Err(ArenaError::MalformedDecision(_))
        ));
    }
}

//! Autonomous-loop scheduler.
//!
//! ## State machine
//!
//! `Running <-> Paused`, plus a one-shot step request that lets exactly
//! one turn through while paused. An all-autonomous match starts paused.
//!
//! ## Locking
//!
//! `LoopControl` has its own mutex and condition variable, separate
//! from the session lock, so pause/resume/step/speed never wait behind a
//! decision call. The control lock is never held while the session lock
//! is being acquired.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use super::match_session::{MatchHandle, MatchSession};
use super::turn::{execute_turn, TurnReport};
use crate::core::config::{clamp_speed, clamp_timeout};
use crate::core::error::{FaultReason, MatchFault, TurnError};
use crate::rules::RulesEngine;

#[derive(Clone, Copy, Debug)]
struct ControlState {
    running: bool,
    paused: bool,
    step_requested: bool,
    speed: f64,
    timeout_secs: f64,
    stopped: bool,
}

/// Point-in-time view of the control block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSnapshot {
    pub running: bool,
    pub paused: bool,
    pub speed: f64,
    pub timeout_secs: f64,
}

/// Pause/resume/step/pacing control for one match.
#[derive(Debug)]
pub struct LoopControl {
    state: Mutex<ControlState>,
    signal: Condvar,
    base_delay: Duration,
}

impl LoopControl {
    /// Create a control block. Speed and timeout are clamped.
    #[must_use]
    pub fn new(base_delay: Duration, speed: f64, timeout_secs: f64, paused: bool) -> Self {
        Self {
            state: Mutex::new(ControlState {
                running: true,
                paused,
                step_requested: false,
                speed: clamp_speed(speed),
                timeout_secs: clamp_timeout(timeout_secs),
                stopped: false,
            }),
            signal: Condvar::new(),
            base_delay,
        }
    }

    pub fn pause(&self) {
        self.state.lock().paused = true;
        self.signal.notify_all();
        log::info!("Autonomous loop paused");
    }

    /// Resume and drop any pending step.
    pub fn resume(&self) {
        {
            let mut state = self.state.lock();
            state.paused = false;
            state.step_requested = false;
        }
        self.signal.notify_all();
        log::info!("Autonomous loop resumed");
    }

    /// Let exactly one turn through, pausing first if needed.
    pub fn step(&self) {
        {
            let mut state = self.state.lock();
            state.paused = true;
            state.step_requested = true;
        }
        self.signal.notify_all();
        log::info!("Autonomous loop step requested");
    }

    /// Stop the loop and wake every waiter.
    pub fn shutdown(&self) {
        self.state.lock().running = false;
        self.signal.notify_all();
    }

    /// Set the speed multiplier. Returns the clamped value.
    pub fn set_speed(&self, speed: f64) -> f64 {
        let speed = clamp_speed(speed);
        self.state.lock().speed = speed;
        self.signal.notify_all();
        log::info!("Autonomous speed set to {speed}x");
        speed
    }

    /// Set the decision timeout in seconds, 0 disables. Returns the
    /// clamped value.
    pub fn set_timeout(&self, secs: f64) -> f64 {
        let secs = clamp_timeout(secs);
        self.state.lock().timeout_secs = secs;
        secs
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.state.lock().speed
    }

    /// Decision timeout, `None` when disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        let secs = self.state.lock().timeout_secs;
        (secs > 0.0).then(|| Duration::from_secs_f64(secs))
    }

    #[must_use]
    pub fn snapshot(&self) -> ControlSnapshot {
        let state = self.state.lock();
        ControlSnapshot {
            running: state.running,
            paused: state.paused,
            speed: state.speed,
            timeout_secs: state.timeout_secs,
        }
    }

    /// Block until a turn may run. Consumes a pending step.
    ///
    /// Returns false once shut down.
    pub fn wait_for_turn(&self) -> bool {
        let mut state = self.state.lock();
        while state.running && state.paused && !state.step_requested {
            self.signal.wait(&mut state);
        }
        state.step_requested = false;
        state.running
    }

    /// Inter-turn delay of `base_delay / speed`. Skipped while paused;
    /// cut short by pause, step or shutdown.
    pub fn pace(&self) {
        let mut state = self.state.lock();
        if state.paused || !state.running {
            return;
        }
        let deadline = deadline_after(self.base_delay.div_f64(state.speed));
        while state.running && !state.paused && !state.step_requested {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
    }

    /// Sleep for `delay` unless shut down first. Returns whether the
    /// loop is still running.
    pub fn sleep(&self, delay: Duration) -> bool {
        let deadline = deadline_after(delay);
        let mut state = self.state.lock();
        while state.running {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.running
    }

    /// Signal that the loop thread has exited.
    pub fn mark_stopped(&self) {
        self.state.lock().stopped = true;
        self.signal.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Wait up to `grace` for `mark_stopped`. Returns whether it came.
    pub fn wait_stopped(&self, grace: Duration) -> bool {
        let deadline = deadline_after(grace);
        let mut state = self.state.lock();
        while !state.stopped {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.stopped
    }
}

/// `now + delay`, with waits past the clock's range cut to a day.
fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + Duration::from_secs(86_400))
}

/// Result of asking the current actor's agent to play.
#[derive(Clone, Debug, PartialEq)]
pub enum AutonomousTurn {
    /// A turn was executed.
    Played(TurnReport),
    /// The actor is responsive; nothing was done.
    NotAutonomous,
    /// The match was already frozen.
    Over,
    /// The agent faulted and the match is now frozen.
    Faulted(MatchFault),
}

/// Let the current actor's agent choose and execute one turn.
///
/// Runs with the session lock held by the caller, across the decision
/// call. A timeout is only noticed once the call returns.
pub fn play_autonomous_turn<E: RulesEngine>(
    engine: &E,
    control: &LoopControl,
    session: &mut MatchSession<E>,
) -> AutonomousTurn {
    if session.frozen {
        return AutonomousTurn::Over;
    }

    let actor = engine.actor(&session.state);
    if session.participants[actor].is_responsive() {
        return AutonomousTurn::NotAutonomous;
    }

    let legal = engine.legal_decisions(actor, &session.state);
    let name = session.participants[actor].name().to_string();
    let fault = |session: &mut MatchSession<E>, reason: FaultReason| {
        let fault = MatchFault::new(name.clone(), actor, reason);
        session.record_fault(fault.clone());
        AutonomousTurn::Faulted(fault)
    };

    if legal.is_empty() {
        log::warn!("{name} has no legal decisions; the rules engine may be inconsistent");
        return fault(session, FaultReason::NoLegalDecisions);
    }

    let observation = engine.observe(actor, &session.state);
    let limit = control.timeout();

    let started = Instant::now();
    let chosen = {
        let MatchSession {
            state, participants, ..
        } = &mut *session;
        let state: &E::State = state;
        let simulate = |decision: &E::Decision| engine.preview(actor, state, decision);
        let Some(agent) = participants[actor].agent_mut() else {
            return AutonomousTurn::NotAutonomous;
        };
        catch_unwind(AssertUnwindSafe(|| agent.select_decision(&legal, &observation, &simulate)))
    };
    let elapsed = started.elapsed();

    if let Some(limit) = limit {
        if elapsed > limit {
            log::warn!(
                "{name} exceeded decision timeout: {:.2}s > {:.2}s",
                elapsed.as_secs_f64(),
                limit.as_secs_f64()
            );
            return fault(session, FaultReason::DecisionTimeout { elapsed, limit });
        }
    }

    let decision = match chosen {
        Ok(Ok(decision)) => decision,
        Ok(Err(err)) => return fault(session, FaultReason::DecisionFault(err.to_string())),
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            return fault(session, FaultReason::DecisionFault(format!("agent panicked: {msg}")));
        }
    };

    match execute_turn(session, engine, &decision) {
        Ok(report) => AutonomousTurn::Played(report),
        Err(TurnError::MatchOver) => AutonomousTurn::Over,
        Err(TurnError::IllegalDecision(msg)) => fault(
            session,
            FaultReason::DecisionFault(format!("engine rejected {}: {msg}", engine.describe(&decision))),
        ),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Marks the control block stopped when the loop thread exits, however
/// it exits.
struct StoppedGuard<'a>(&'a LoopControl);

impl Drop for StoppedGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_stopped();
    }
}

/// Drive an all-autonomous match until it ends, faults or is shut down.
pub fn run_autonomous_loop<E: RulesEngine>(handle: &MatchHandle<E>) {
    let control = handle.control();
    let _stopped = StoppedGuard(control);
    log::info!("Autonomous loop started");

    while control.wait_for_turn() {
        let outcome = {
            let mut session = handle.lock();
            play_autonomous_turn(handle.engine(), control, &mut *session)
        };

        match outcome {
            AutonomousTurn::Played(report) if report.terminal => {
                log::info!("Autonomous match finished after {} rounds", report.round);
                break;
            }
            AutonomousTurn::Played(_) => control.pace(),
            AutonomousTurn::Over => break,
            AutonomousTurn::NotAutonomous => {
                log::warn!("Autonomous loop reached a responsive actor; stopping");
                break;
            }
            AutonomousTurn::Faulted(fault) => {
                log::error!("Autonomous loop stopped: {fault}");
                break;
            }
        }
    }

    log::info!("Autonomous loop stopped");
}

/// Spawn `run_autonomous_loop` on its own thread.
pub fn spawn_autonomous_loop<E: RulesEngine>(handle: MatchHandle<E>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("autonomous-loop".into())
        .spawn(move || run_autonomous_loop(&handle))
}

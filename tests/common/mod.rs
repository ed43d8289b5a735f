//! Shared fixtures: a scripted countdown engine and a few misbehaving agents.
#![allow(dead_code)]

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bazaar_arena::core::{AgentError, RulesError, Seat};
use bazaar_arena::participants::{Agent, AgentRegistry, Simulate};
use bazaar_arena::rules::{GameResult, RulesEngine};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Countdown engine
// =============================================================================

/// Players alternate taking one or two off a counter; whoever empties it wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    One,
    Two,
    /// Never legal.
    Bogus,
}

#[derive(Clone, Debug)]
pub struct CountState {
    pub remaining: u32,
    pub actor: Seat,
    pub last: Option<Step>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CountObservation {
    pub remaining: u32,
    pub my_turn: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountView {
    pub remaining: u32,
}

pub struct Countdown {
    pub start: u32,
    /// Counter value at which the actor has nothing to play.
    pub stuck_at: Option<u32>,
    /// Seat that moves first and then keeps the turn.
    pub sticky: Option<Seat>,
}

impl Countdown {
    pub fn new(start: u32) -> Self {
        Self {
            start,
            stuck_at: None,
            sticky: None,
        }
    }

    pub fn sticky(start: u32, seat: Seat) -> Self {
        Self {
            sticky: Some(seat),
            ..Self::new(start)
        }
    }
}

impl RulesEngine for Countdown {
    type State = CountState;
    type Decision = Step;
    type Observation = CountObservation;
    type PublicView = CountView;
    type PrivateView = CountView;

    fn new_match(&self, _seed: u64) -> CountState {
        CountState {
            remaining: self.start,
            actor: self.sticky.unwrap_or(Seat::First),
            last: None,
        }
    }

    fn actor(&self, state: &CountState) -> Seat {
        state.actor
    }

    fn legal_decisions(&self, seat: Seat, state: &CountState) -> Vec<Step> {
        if seat != state.actor || state.remaining == 0 || Some(state.remaining) == self.stuck_at {
            return Vec::new();
        }
        if state.remaining >= 2 {
            vec![Step::One, Step::Two]
        } else {
            vec![Step::One]
        }
    }

    fn apply(&self, state: &CountState, decision: &Step) -> Result<CountState, RulesError> {
        let amount = match decision {
            Step::One => 1,
            Step::Two => 2,
            Step::Bogus => return Err(RulesError::IllegalDecision("bogus step".into())),
        };
        if amount > state.remaining {
            return Err(RulesError::IllegalDecision(format!("only {} left", state.remaining)));
        }
        let actor = if self.sticky == Some(state.actor) {
            state.actor
        } else {
            state.actor.other()
        };
        Ok(CountState {
            remaining: state.remaining - amount,
            actor,
            last: Some(*decision),
        })
    }

    fn observe(&self, seat: Seat, state: &CountState) -> CountObservation {
        CountObservation {
            remaining: state.remaining,
            my_turn: seat == state.actor,
        }
    }

    fn is_terminal(&self, state: &CountState) -> bool {
        state.remaining == 0
    }

    fn outcome(&self, state: &CountState) -> Option<GameResult> {
        (state.remaining == 0).then(|| GameResult::Winner(state.actor.other()))
    }

    fn environment_reward(&self, seat: Seat, prior: &CountState, current: &CountState) -> Option<f64> {
        (prior.actor == seat).then(|| f64::from(prior.remaining - current.remaining))
    }

    fn last_decision<'a>(&self, state: &'a CountState) -> Option<&'a Step> {
        state.last.as_ref()
    }

    fn public_view(&self, state: &CountState) -> CountView {
        CountView {
            remaining: state.remaining,
        }
    }

    fn private_view(&self, _seat: Seat, state: &CountState) -> CountView {
        self.public_view(state)
    }
}

// =============================================================================
// Agents
// =============================================================================

/// Always plays the first legal decision.
pub struct FirstLegal;

impl Agent<Countdown> for FirstLegal {
    fn select_decision(
        &mut self,
        legal: &[Step],
        _observation: &CountObservation,
        _simulate: &Simulate<'_, Countdown>,
    ) -> Result<Step, AgentError> {
        legal.first().copied().ok_or(AgentError::NoDecision)
    }
}

/// Sleeps before answering.
pub struct Sleepy(pub Duration);

impl Agent<Countdown> for Sleepy {
    fn select_decision(
        &mut self,
        legal: &[Step],
        _observation: &CountObservation,
        _simulate: &Simulate<'_, Countdown>,
    ) -> Result<Step, AgentError> {
        thread::sleep(self.0);
        legal.first().copied().ok_or(AgentError::NoDecision)
    }
}

/// Panics when asked to play.
pub struct Panicky;

impl Agent<Countdown> for Panicky {
    fn select_decision(
        &mut self,
        _legal: &[Step],
        _observation: &CountObservation,
        _simulate: &Simulate<'_, Countdown>,
    ) -> Result<Step, AgentError> {
        panic!("agent blew up");
    }
}

/// Ignores the legal list and plays something the engine refuses.
pub struct Stubborn;

impl Agent<Countdown> for Stubborn {
    fn select_decision(
        &mut self,
        _legal: &[Step],
        _observation: &CountObservation,
        _simulate: &Simulate<'_, Countdown>,
    ) -> Result<Step, AgentError> {
        Ok(Step::Bogus)
    }
}

pub fn countdown_registry() -> AgentRegistry<Countdown> {
    AgentRegistry::new()
        .with_random()
        .with("first", "First", |_| Box::new(FirstLegal))
        .with("sleepy", "Sleepy", |_| Box::new(Sleepy(Duration::from_millis(500))))
        .with("panicky", "Panicky", |_| Box::new(Panicky))
        .with("stubborn", "Stubborn", |_| Box::new(Stubborn))
}

/// Poll `check` until it holds or `limit` passes.
pub fn wait_until(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + limit;
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

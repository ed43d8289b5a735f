//! Built-in Bazaar agents.
//!
//! - `GreedyAgent`: one-ply lookahead through `simulate`
//! - `CamelHoarder`: grabs camels, dumps its largest set, else random

use smallvec::SmallVec;

use super::agent::{Agent, Simulate};
use crate::core::error::AgentError;
use crate::core::rng::GameRng;
use crate::games::bazaar::{Bazaar, BazaarDecision, GoodType, MarketObservation};

/// Weight of goods still in hand relative to banked points.
const HAND_WEIGHT: f64 = 0.4;

/// Weight of each camel in the herd.
const CAMEL_WEIGHT: f64 = 0.5;

/// Heuristic value of an observation for its seat.
#[must_use]
pub fn evaluate(observation: &MarketObservation) -> f64 {
    let banked = f64::from(observation.my_points);
    let potential: f64 = observation
        .hand
        .iter()
        .filter(|(good, _)| !good.is_camel())
        .map(|(good, count)| {
            let top = observation.coin_tops.get(&good).copied().unwrap_or(0);
            f64::from(count) * f64::from(top)
        })
        .sum();
    let camels = f64::from(observation.hand.get(GoodType::Camel));

    banked + HAND_WEIGHT * potential + CAMEL_WEIGHT * camels
}

/// One-ply lookahead agent.
///
/// Previews every legal decision and keeps the best by `evaluate`,
/// breaking ties at random.
#[derive(Clone, Debug)]
pub struct GreedyAgent {
    rng: GameRng,
    total_signal: f64,
}

impl GreedyAgent {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
            total_signal: 0.0,
        }
    }

    /// Sum of environment rewards seen on own turns.
    #[must_use]
    pub fn total_signal(&self) -> f64 {
        self.total_signal
    }
}

impl Agent<Bazaar> for GreedyAgent {
    fn select_decision(
        &mut self,
        legal: &[BazaarDecision],
        _observation: &MarketObservation,
        simulate: &Simulate<'_, Bazaar>,
    ) -> Result<BazaarDecision, AgentError> {
        if legal.is_empty() {
            return Err(AgentError::NoDecision);
        }

        let mut best_value = f64::NEG_INFINITY;
        let mut best: SmallVec<[usize; 8]> = SmallVec::new();

        for (i, decision) in legal.iter().enumerate() {
            let Some(preview) = simulate(decision) else {
                continue;
            };
            let value = evaluate(&preview);
            if value > best_value {
                best_value = value;
                best.clear();
                best.push(i);
            } else if value == best_value {
                best.push(i);
            }
        }

        let index = self
            .rng
            .choose(best.as_slice())
            .copied()
            .ok_or_else(|| AgentError::Failed("no decision could be previewed".into()))?;
        Ok(legal[index].clone())
    }

    fn on_reward(
        &mut self,
        _old: &MarketObservation,
        _new: &MarketObservation,
        was_actor: bool,
        signal: Option<f64>,
    ) {
        if was_actor {
            self.total_signal += signal.unwrap_or(0.0);
        }
    }
}

/// Camel-first agent.
#[derive(Clone, Debug)]
pub struct CamelHoarder {
    rng: GameRng,
}

impl CamelHoarder {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
        }
    }
}

impl Agent<Bazaar> for CamelHoarder {
    fn select_decision(
        &mut self,
        legal: &[BazaarDecision],
        _observation: &MarketObservation,
        _simulate: &Simulate<'_, Bazaar>,
    ) -> Result<BazaarDecision, AgentError> {
        let camels = legal
            .iter()
            .find(|d| matches!(d, BazaarDecision::Take { good: GoodType::Camel, .. }));
        if let Some(decision) = camels {
            return Ok(decision.clone());
        }

        let biggest_sale = legal
            .iter()
            .filter_map(|d| match d {
                BazaarDecision::Sell { count, .. } => Some((*count, d)),
                _ => None,
            })
            .max_by_key(|&(count, _)| count);
        if let Some((_, decision)) = biggest_sale {
            return Ok(decision.clone());
        }

        self.rng.choose(legal).cloned().ok_or(AgentError::NoDecision)
    }
}

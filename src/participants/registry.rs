//! Agent registry.
//!
//! Maps agent ids to factories. Populated in code, so the set of
//! available agents is fixed at compile time.

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::agent::{Agent, RandomAgent};
use super::agents::{CamelHoarder, GreedyAgent};
use crate::core::error::{ArenaError, ArenaResult};
use crate::games::bazaar::Bazaar;
use crate::rules::RulesEngine;

/// Builds a fresh agent from a seed.
pub type AgentFactory<E> = Box<dyn Fn(u64) -> Box<dyn Agent<E>> + Send + Sync>;

/// Listing entry for one agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
}

struct AgentEntry<E: RulesEngine> {
    name: String,
    factory: AgentFactory<E>,
}

/// Registry of agent factories.
///
/// ## Example
///
/// ```
/// use bazaar_arena::participants::AgentRegistry;
///
/// let registry = AgentRegistry::builtin();
/// assert!(registry.contains("greedy"));
///
/// let (name, _agent) = registry.build("greedy", 356).unwrap();
/// assert_eq!(name, "Greedy");
/// ```
pub struct AgentRegistry<E: RulesEngine> {
    agents: FxHashMap<String, AgentEntry<E>>,
}

impl<E: RulesEngine> Default for AgentRegistry<E> {
    fn default() -> Self {
        Self {
            agents: FxHashMap::default(),
        }
    }
}

impl<E: RulesEngine> AgentRegistry<E> {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `id` with a display name.
    ///
    /// Replaces any factory already registered under `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, name: impl Into<String>, factory: F)
    where
        F: Fn(u64) -> Box<dyn Agent<E>> + Send + Sync + 'static,
    {
        let id = id.into();
        let entry = AgentEntry {
            name: name.into(),
            factory: Box::new(factory),
        };
        if self.agents.insert(id.clone(), entry).is_some() {
            log::warn!("Agent '{id}' registered twice, keeping the latest");
        }
    }

    /// Builder-style `register`.
    #[must_use]
    pub fn with<F>(mut self, id: impl Into<String>, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(u64) -> Box<dyn Agent<E>> + Send + Sync + 'static,
    {
        self.register(id, name, factory);
        self
    }

    /// Register the engine-agnostic random agent as `"random"`.
    #[must_use]
    pub fn with_random(self) -> Self {
        self.with("random", "Random", |seed| Box::new(RandomAgent::new(seed)))
    }

    /// Build the agent registered as `id`. Returns its display name too.
    pub fn build(&self, id: &str, seed: u64) -> ArenaResult<(String, Box<dyn Agent<E>>)> {
        let entry = self
            .agents
            .get(id)
            .ok_or_else(|| ArenaError::UnknownAgent(id.to_string()))?;
        Ok((entry.name.clone(), (entry.factory)(seed)))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All agents, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<AgentInfo> {
        let mut infos: Vec<AgentInfo> = self
            .agents
            .iter()
            .map(|(id, entry)| AgentInfo {
                id: id.clone(),
                name: entry.name.clone(),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

impl AgentRegistry<Bazaar> {
    /// The built-in Bazaar agents.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_random()
            .with("greedy", "Greedy", |seed| Box::new(GreedyAgent::new(seed)))
            .with("camel-hoarder", "Camel Hoarder", |seed| Box::new(CamelHoarder::new(seed)))
    }
}

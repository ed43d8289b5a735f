//! Participants and their decision procedures.

pub mod agent;
pub mod agents;
pub mod participant;
pub mod registry;

pub use agent::{Agent, RandomAgent, Simulate};
pub use agents::{evaluate, CamelHoarder, GreedyAgent};
pub use participant::{Participant, ParticipantId, ParticipantKind};
pub use registry::{AgentFactory, AgentInfo, AgentRegistry};

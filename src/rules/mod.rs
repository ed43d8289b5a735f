//! Rules engine abstraction.
//!
//! The session layer never interprets game rules; it only calls the
//! `RulesEngine` contract.

pub mod engine;

pub use engine::{GameResult, RulesEngine};

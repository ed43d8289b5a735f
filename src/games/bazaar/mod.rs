//! Bazaar: a two-seat trading game.
//!
//! Seats take turns drawing from a five-card market, selling sets of
//! goods for coins and trading cards back into the market:
//! - Precious goods (diamond, gold, silver) sell in pairs or more
//! - Sales of three or more earn a bonus token
//! - Camels are taken all at once and can be traded but never sold
//! - The match ends when three coin stacks run dry or the market can't refill
//!
//! Ships with the crate so the arena can be driven end to end.

mod decision;
mod game;
mod goods;
mod state;

pub use decision::{BazaarDecision, DecisionRequest};
pub use game::{Bazaar, BazaarBuilder, BazaarConfig};
pub use goods::{BonusType, CoinStacks, GoodType, Goods};
pub use state::{BazaarState, MarketObservation, PlayerBoard, PrivateHand, PublicBoard};

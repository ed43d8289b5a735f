//! Bazaar match state, observations and snapshot views.
//!
//! ## BazaarState
//!
//! Complete state of one match:
//! - Market row and draw deck
//! - Each seat's hand and herd (camels)
//! - Market coin stacks and each seat's earnings
//! - Actor, turn counter and the last applied decision
//!
//! Uses `im` persistent vectors so a clone (agent previews, pre-turn
//! snapshots) is O(1) and shares nothing mutable with the original.

use std::collections::BTreeMap;

use im::Vector;
use serde::Serialize;

use super::decision::BazaarDecision;
use super::goods::{BonusType, CoinStacks, GoodType, Goods};
use crate::core::seat::{Seat, SeatMap};

/// Complete Bazaar state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BazaarState {
    /// Seat expected to act next.
    pub actor: Seat,

    /// Cards face up in the market.
    pub market: Goods,

    /// Face-down draw pile; the top card is the back.
    pub deck: Vector<GoodType>,

    /// Each seat's hand, camels included.
    pub hands: SeatMap<Goods>,

    /// Coins and bonus tokens still in the market.
    pub coins: CoinStacks,

    /// Coins and bonus tokens each seat has earned.
    pub earnings: SeatMap<CoinStacks>,

    /// Bonus for the seat with the larger herd at the end.
    pub camel_bonus: u8,

    /// Decisions applied so far.
    pub turn: u32,

    /// The decision that produced this state.
    pub last_decision: Option<BazaarDecision>,
}

impl BazaarState {
    /// Points from goods coins only (visible during play).
    #[must_use]
    pub fn raw_score(&self, seat: Seat) -> u32 {
        self.earnings[seat].goods_points()
    }

    /// Sum of one seat's bonus tokens (hidden until the end).
    #[must_use]
    pub fn bonus_score(&self, seat: Seat) -> u32 {
        BonusType::ALL
            .into_iter()
            .map(|tier| self.earnings[seat].bonus_points(tier))
            .sum()
    }

    /// Camel bonus awarded to `seat`, 0 on a tie or a smaller herd.
    #[must_use]
    pub fn camel_bonus_for(&self, seat: Seat) -> u32 {
        let mine = self.hands[seat].get(GoodType::Camel);
        let theirs = self.hands[seat.other()].get(GoodType::Camel);
        if mine > theirs {
            u32::from(self.camel_bonus)
        } else {
            0
        }
    }

    /// Score with end-of-game bonuses when `terminal`.
    #[must_use]
    pub fn score(&self, seat: Seat, terminal: bool) -> u32 {
        let raw = self.raw_score(seat);
        if terminal {
            raw + self.bonus_score(seat) + self.camel_bonus_for(seat)
        } else {
            raw
        }
    }
}

/// What one seat knows about the market.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketObservation {
    pub seat: Seat,
    pub is_my_turn: bool,
    pub hand: Goods,
    pub market: Goods,
    pub deck_size: usize,
    /// Top coin of each trade good still available.
    pub coin_tops: BTreeMap<GoodType, u8>,
    /// Coins left per trade good.
    pub coins_left: BTreeMap<GoodType, usize>,
    /// Tokens left per bonus tier.
    pub bonus_left: BTreeMap<BonusType, usize>,
    pub my_points: u32,
    pub my_bonus_tokens: usize,
    pub opponent_hand_size: u32,
    pub opponent_camels: u8,
    pub opponent_points: u32,
    pub terminal: bool,
}

/// One seat's line on the public board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBoard {
    pub score: u32,
    pub raw_score: u32,
    pub camel_bonus: u32,
    #[serde(rename = "bonus3x")]
    pub bonus_3x: u32,
    #[serde(rename = "bonus4x")]
    pub bonus_4x: u32,
    #[serde(rename = "bonus5x")]
    pub bonus_5x: u32,
    pub camel_count: u8,
    pub goods: BTreeMap<String, u8>,
    pub coins: BTreeMap<String, Vec<u8>>,
    pub bonus_counts: BTreeMap<String, usize>,
}

/// Spectator view of the whole table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicBoard {
    pub market: BTreeMap<String, u8>,
    pub market_coins: BTreeMap<String, Vec<u8>>,
    pub market_bonus_tokens: BTreeMap<String, usize>,
    pub deck_size: usize,
    pub players: Vec<PlayerBoard>,
    pub turn: u32,
}

/// What a seat sees of its own hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateHand {
    pub goods: BTreeMap<String, u8>,
    pub hand_size: u32,
    pub camels: u8,
}

pub(crate) fn coins_by_name(stacks: &CoinStacks) -> BTreeMap<String, Vec<u8>> {
    GoodType::TRADE_GOODS
        .into_iter()
        .filter_map(|good| {
            let coins = stacks.goods_coins(good)?;
            if coins.is_empty() {
                None
            } else {
                Some((good.name().to_string(), coins.iter().copied().collect()))
            }
        })
        .collect()
}

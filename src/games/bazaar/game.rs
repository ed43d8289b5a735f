//! Bazaar rules engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::decision::BazaarDecision;
use super::goods::{BonusType, CoinStacks, GoodType, Goods};
use super::state::{coins_by_name, BazaarState, MarketObservation, PlayerBoard, PrivateHand, PublicBoard};
use crate::core::error::RulesError;
use crate::core::rng::GameRng;
use crate::core::seat::{Seat, SeatMap};
use crate::rules::{GameResult, RulesEngine};

/// Table rules for a Bazaar match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazaarConfig {
    /// Most non-camel cards a hand may hold.
    pub hand_limit: u32,
    /// Bonus for the larger herd at the end.
    pub camel_bonus: u8,
    /// Cards kept face up in the market.
    pub market_size: u32,
    /// Cards dealt to each seat.
    pub hand_size: u32,
    /// Camels placed in the market before the deal.
    pub initial_market_camels: u8,
    /// Exhausted goods-coin stacks that end the match.
    pub empty_stacks_to_end: usize,
    /// Seat that opens. `None` draws it from the match seed.
    pub starting_seat: Option<Seat>,
}

impl Default for BazaarConfig {
    fn default() -> Self {
        Self {
            hand_limit: 7,
            camel_bonus: 5,
            market_size: 5,
            hand_size: 5,
            initial_market_camels: 3,
            empty_stacks_to_end: 3,
            starting_seat: None,
        }
    }
}

/// Builder for a `Bazaar` engine.
#[derive(Default)]
pub struct BazaarBuilder {
    config: BazaarConfig,
}

impl BazaarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hand_limit(mut self, limit: u32) -> Self {
        self.config.hand_limit = limit;
        self
    }

    pub fn camel_bonus(mut self, bonus: u8) -> Self {
        self.config.camel_bonus = bonus;
        self
    }

    /// Empty token stacks that end the match, clamped to 1..=6.
    pub fn empty_stacks_to_end(mut self, stacks: usize) -> Self {
        self.config.empty_stacks_to_end = stacks.clamp(1, 6);
        self
    }

    pub fn starting_seat(mut self, seat: Seat) -> Self {
        self.config.starting_seat = Some(seat);
        self
    }

    pub fn build(self) -> Bazaar {
        Bazaar::new(self.config)
    }
}

/// The Bazaar trading game.
#[derive(Clone, Debug, Default)]
pub struct Bazaar {
    config: BazaarConfig,
}

impl Bazaar {
    #[must_use]
    pub fn new(config: BazaarConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BazaarConfig {
        &self.config
    }

    /// Hand size (non-camel) after `decision` would be applied by `seat`.
    fn hand_after(&self, seat: Seat, state: &BazaarState, decision: &BazaarDecision) -> i64 {
        let current = i64::from(state.hands[seat].non_camel_total());
        let offered = i64::from(decision.offered().non_camel_total());
        let requested = i64::from(decision.requested().non_camel_total());
        current - offered + requested
    }

    /// Full legality check for `seat` playing `decision`.
    fn validate(&self, seat: Seat, state: &BazaarState, decision: &BazaarDecision) -> Result<(), RulesError> {
        let illegal = |msg: String| Err(RulesError::IllegalDecision(msg));

        if self.is_terminal(state) {
            return illegal("match is over".into());
        }
        if seat != state.actor {
            return illegal(format!("{seat} is not the actor"));
        }

        let hand = &state.hands[seat];
        match *decision {
            BazaarDecision::Take { good, count } => {
                let in_market = state.market.get(good);
                if good.is_camel() {
                    if in_market == 0 || count != in_market {
                        return illegal(format!("must take all {in_market} camels"));
                    }
                } else if count != 1 || in_market == 0 {
                    return illegal(format!("can take exactly one {good} from the market"));
                }
            }
            BazaarDecision::Sell { good, count } => {
                if good.is_camel() {
                    return illegal("camels cannot be sold".into());
                }
                if count < good.min_sale() {
                    return illegal(format!("{good} must be sold {} at a time", good.min_sale()));
                }
                if hand.get(good) < count {
                    return illegal(format!("hand holds only {} {good}", hand.get(good)));
                }
            }
            BazaarDecision::Trade { offered, requested } => {
                if requested.get(GoodType::Camel) > 0 {
                    return illegal("camels cannot be taken in a trade".into());
                }
                if requested.total() < 2 || offered.total() != requested.total() {
                    return illegal("trade must swap the same number of cards, at least two".into());
                }
                if offered.overlaps(&requested) {
                    return illegal("cannot trade a good for the same good".into());
                }
                if !state.market.contains(&requested) {
                    return illegal("market does not hold the requested goods".into());
                }
                if !hand.contains(&offered) {
                    return illegal("hand does not hold the offered goods".into());
                }
            }
        }

        self.check_limits(seat, state, decision)
    }

    fn refill_market(&self, state: &mut BazaarState) {
        while state.market.total() < self.config.market_size {
            match state.deck.pop_back() {
                Some(card) => state.market.add(card, 1),
                None => break,
            }
        }
    }

    fn count_bonus_tokens(state: &BazaarState, seat: Seat) -> usize {
        BonusType::ALL
            .into_iter()
            .map(|tier| state.earnings[seat].bonus_tokens(tier).len())
            .sum()
    }

    fn count_goods_coins(state: &BazaarState, seat: Seat) -> usize {
        GoodType::TRADE_GOODS
            .into_iter()
            .filter_map(|good| state.earnings[seat].goods_coins(good))
            .map(|stack| stack.len())
            .sum()
    }

    fn player_board(&self, state: &BazaarState, seat: Seat, terminal: bool) -> PlayerBoard {
        let earned = &state.earnings[seat];
        let (bonus_3x, bonus_4x, bonus_5x, camel_bonus) = if terminal {
            (
                earned.bonus_points(BonusType::Three),
                earned.bonus_points(BonusType::Four),
                earned.bonus_points(BonusType::Five),
                state.camel_bonus_for(seat),
            )
        } else {
            (0, 0, 0, 0)
        };

        let hand = state.hands[seat];
        let mut goods = hand.to_name_map();
        goods.remove(GoodType::Camel.name());

        PlayerBoard {
            score: state.score(seat, terminal),
            raw_score: state.raw_score(seat),
            camel_bonus,
            bonus_3x,
            bonus_4x,
            bonus_5x,
            camel_count: hand.get(GoodType::Camel),
            goods,
            coins: coins_by_name(earned),
            bonus_counts: BonusType::ALL
                .into_iter()
                .map(|tier| (tier.name().to_string(), earned.bonus_tokens(tier).len()))
                .filter(|&(_, count)| count > 0)
                .collect(),
        }
    }
}

impl RulesEngine for Bazaar {
    type State = BazaarState;
    type Decision = BazaarDecision;
    type Observation = MarketObservation;
    type PublicView = PublicBoard;
    type PrivateView = PrivateHand;

    fn new_match(&self, seed: u64) -> BazaarState {
        let mut rng = GameRng::new(seed);

        let mut cards: Vec<GoodType> = GoodType::ALL
            .into_iter()
            .flat_map(|good| {
                let count = if good.is_camel() {
                    good.deck_count().saturating_sub(self.config.initial_market_camels)
                } else {
                    good.deck_count()
                };
                std::iter::repeat(good).take(usize::from(count))
            })
            .collect();
        rng.shuffle(&mut cards);

        let mut state = BazaarState {
            actor: self
                .config
                .starting_seat
                .unwrap_or_else(|| rng.pick_seat()),
            market: Goods::from_pairs(&[(GoodType::Camel, self.config.initial_market_camels)]),
            deck: cards.into_iter().collect(),
            hands: SeatMap::with_default(),
            coins: CoinStacks::market(|tokens| rng.shuffle(tokens)),
            earnings: SeatMap::new(|_| CoinStacks::empty()),
            camel_bonus: self.config.camel_bonus,
            turn: 0,
            last_decision: None,
        };

        self.refill_market(&mut state);
        for seat in Seat::all() {
            for _ in 0..self.config.hand_size {
                if let Some(card) = state.deck.pop_back() {
                    state.hands[seat].add(card, 1);
                }
            }
        }

        state
    }

    fn actor(&self, state: &BazaarState) -> Seat {
        state.actor
    }

    fn legal_decisions(&self, seat: Seat, state: &BazaarState) -> Vec<BazaarDecision> {
        if seat != state.actor || self.is_terminal(state) {
            return vec![];
        }

        let hand = state.hands[seat];
        let room = self.config.hand_limit.saturating_sub(hand.non_camel_total());
        let mut decisions = Vec::new();

        // Take
        let market_camels = state.market.get(GoodType::Camel);
        if market_camels > 0 {
            decisions.push(BazaarDecision::Take { good: GoodType::Camel, count: market_camels });
        }
        if room > 0 {
            for (good, _) in state.market.iter().filter(|(g, _)| !g.is_camel()) {
                decisions.push(BazaarDecision::Take { good, count: 1 });
            }
        }

        // Sell
        for (good, held) in hand.iter().filter(|(g, _)| !g.is_camel()) {
            for count in good.min_sale()..=held {
                decisions.push(BazaarDecision::Sell { good, count });
            }
        }

        // Trade
        let tradeable = state.market.non_camel_total();
        for size in 2..=tradeable {
            for requested in state.market.subsets_of_size(size, false) {
                for offered in hand.subsets_of_size(size, true) {
                    if offered.overlaps(&requested) {
                        continue;
                    }
                    let decision = BazaarDecision::Trade { offered, requested };
                    if self.hand_after(seat, state, &decision) <= i64::from(self.config.hand_limit) {
                        decisions.push(decision);
                    }
                }
            }
        }

        decisions
    }

    fn check_limits(&self, seat: Seat, state: &BazaarState, decision: &BazaarDecision) -> Result<(), RulesError> {
        let after = self.hand_after(seat, state, decision);
        if after > i64::from(self.config.hand_limit) {
            return Err(RulesError::ResourceLimitExceeded(format!(
                "would result in {after} cards (max {})",
                self.config.hand_limit
            )));
        }
        Ok(())
    }

    fn apply(&self, state: &BazaarState, decision: &BazaarDecision) -> Result<BazaarState, RulesError> {
        let seat = state.actor;
        self.validate(seat, state, decision)?;

        let mut next = state.clone();
        match *decision {
            BazaarDecision::Take { good, count } => {
                next.market.remove(good, count);
                next.hands[seat].add(good, count);
                self.refill_market(&mut next);
            }
            BazaarDecision::Sell { good, count } => {
                next.hands[seat].remove(good, count);
                let coins = next.coins.take_goods_coins(good, count);
                next.earnings[seat].push_goods_coins(good, &coins);
                if let Some(tier) = BonusType::for_sale(count) {
                    if let Some(token) = next.coins.take_bonus(tier) {
                        next.earnings[seat].push_bonus(tier, token);
                    }
                }
            }
            BazaarDecision::Trade { offered, requested } => {
                next.hands[seat].remove_all(&offered);
                next.hands[seat].add_all(&requested);
                next.market.remove_all(&requested);
                next.market.add_all(&offered);
            }
        }

        next.turn += 1;
        next.actor = seat.other();
        next.last_decision = Some(decision.clone());
        Ok(next)
    }

    fn observe(&self, seat: Seat, state: &BazaarState) -> MarketObservation {
        let opponent = seat.other();
        let terminal = self.is_terminal(state);

        let mut coin_tops = BTreeMap::new();
        let mut coins_left = BTreeMap::new();
        for good in GoodType::TRADE_GOODS {
            if let Some(stack) = state.coins.goods_coins(good) {
                coins_left.insert(good, stack.len());
                if let Some(&top) = stack.front() {
                    coin_tops.insert(good, top);
                }
            }
        }

        MarketObservation {
            seat,
            is_my_turn: state.actor == seat && !terminal,
            hand: state.hands[seat],
            market: state.market,
            deck_size: state.deck.len(),
            coin_tops,
            coins_left,
            bonus_left: BonusType::ALL
                .into_iter()
                .map(|tier| (tier, state.coins.bonus_tokens(tier).len()))
                .collect(),
            my_points: state.score(seat, terminal),
            my_bonus_tokens: Self::count_bonus_tokens(state, seat),
            opponent_hand_size: state.hands[opponent].non_camel_total(),
            opponent_camels: state.hands[opponent].get(GoodType::Camel),
            opponent_points: state.raw_score(opponent),
            terminal,
        }
    }

    fn is_terminal(&self, state: &BazaarState) -> bool {
        state.coins.empty_goods_stacks() >= self.config.empty_stacks_to_end
            || state.market.total() < self.config.market_size
    }

    fn outcome(&self, state: &BazaarState) -> Option<GameResult> {
        if !self.is_terminal(state) {
            return None;
        }
        let key = |seat: Seat| {
            (
                state.score(seat, true),
                Self::count_bonus_tokens(state, seat),
                Self::count_goods_coins(state, seat),
            )
        };
        let (first, second) = (key(Seat::First), key(Seat::Second));
        Some(match first.cmp(&second) {
            std::cmp::Ordering::Greater => GameResult::Winner(Seat::First),
            std::cmp::Ordering::Less => GameResult::Winner(Seat::Second),
            std::cmp::Ordering::Equal => GameResult::Draw,
        })
    }

    fn environment_reward(&self, seat: Seat, prior: &BazaarState, current: &BazaarState) -> Option<f64> {
        let before = f64::from(prior.score(seat, self.is_terminal(prior)));
        let after = f64::from(current.score(seat, self.is_terminal(current)));
        let delta = after - before;
        if delta == 0.0 {
            None
        } else {
            Some(delta)
        }
    }

    fn last_decision<'a>(&self, state: &'a BazaarState) -> Option<&'a BazaarDecision> {
        state.last_decision.as_ref()
    }

    fn public_view(&self, state: &BazaarState) -> PublicBoard {
        let terminal = self.is_terminal(state);
        PublicBoard {
            market: state.market.to_name_map(),
            market_coins: coins_by_name(&state.coins),
            market_bonus_tokens: BonusType::ALL
                .into_iter()
                .map(|tier| (tier.name().to_string(), state.coins.bonus_tokens(tier).len()))
                .collect(),
            deck_size: state.deck.len(),
            players: Seat::all()
                .map(|seat| self.player_board(state, seat, terminal))
                .collect(),
            turn: state.turn,
        }
    }

    fn private_view(&self, seat: Seat, state: &BazaarState) -> PrivateHand {
        let hand = state.hands[seat];
        PrivateHand {
            goods: hand.to_name_map(),
            hand_size: hand.non_camel_total(),
            camels: hand.get(GoodType::Camel),
        }
    }

    fn describe(&self, decision: &BazaarDecision) -> String {
        decision.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Bazaar {
        BazaarBuilder::new().starting_seat(Seat::First).build()
    }

    #[test]
    fn test_deal() {
        let game = engine();
        let state = game.new_match(42);

        assert_eq!(state.actor, Seat::First);
        assert_eq!(state.market.total(), 5);
        assert!(state.market.get(GoodType::Camel) >= 3);
        assert_eq!(state.hands[Seat::First].total(), 5);
        assert_eq!(state.hands[Seat::Second].total(), 5);
        assert_eq!(state.deck.len(), 55 - 5 - 10);
        assert!(!game.is_terminal(&state));
    }

    #[test]
    fn test_empty_stacks_to_end_is_clamped() {
        assert_eq!(BazaarBuilder::new().empty_stacks_to_end(0).build().config().empty_stacks_to_end, 1);
        assert_eq!(BazaarBuilder::new().empty_stacks_to_end(10).build().config().empty_stacks_to_end, 6);
        assert_eq!(BazaarBuilder::new().empty_stacks_to_end(2).build().config().empty_stacks_to_end, 2);
    }

    #[test]
    fn test_deal_is_deterministic() {
        let game = engine();
        assert_eq!(game.new_match(7), game.new_match(7));
    }

    #[test]
    fn test_random_starting_seat_depends_on_seed() {
        let game = Bazaar::default();
        let starters: Vec<Seat> = (0..32).map(|seed| game.new_match(seed).actor).collect();
        assert!(starters.contains(&Seat::First));
        assert!(starters.contains(&Seat::Second));
    }

    #[test]
    fn test_only_actor_has_decisions() {
        let game = engine();
        let state = game.new_match(42);

        assert!(!game.legal_decisions(Seat::First, &state).is_empty());
        assert!(game.legal_decisions(Seat::Second, &state).is_empty());
    }

    #[test]
    fn test_all_legal_decisions_apply() {
        let game = engine();
        let state = game.new_match(11);

        for decision in game.legal_decisions(Seat::First, &state) {
            let next = game.apply(&state, &decision);
            assert!(next.is_ok(), "{decision:?} should apply: {next:?}");
        }
    }

    #[test]
    fn test_take_camels_refills_market() {
        let game = engine();
        let state = game.new_match(42);
        let camels = state.market.get(GoodType::Camel);

        let next = game
            .apply(&state, &BazaarDecision::Take { good: GoodType::Camel, count: camels })
            .unwrap();

        assert_eq!(next.hands[Seat::First].get(GoodType::Camel), state.hands[Seat::First].get(GoodType::Camel) + camels);
        assert_eq!(next.market.total(), 5);
        assert_eq!(next.actor, Seat::Second);
        assert_eq!(next.turn, 1);
        assert!(next.last_decision.is_some());
        // Original untouched
        assert_eq!(state.market.get(GoodType::Camel), camels);
    }

    #[test]
    fn test_partial_camel_take_is_illegal() {
        let game = engine();
        let state = game.new_match(42);

        let result = game.apply(&state, &BazaarDecision::Take { good: GoodType::Camel, count: 1 });
        assert!(matches!(result, Err(RulesError::IllegalDecision(_))));
    }

    #[test]
    fn test_sell_pays_coins_and_bonus() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Cloth, 3)]);

        let next = game
            .apply(&state, &BazaarDecision::Sell { good: GoodType::Cloth, count: 3 })
            .unwrap();

        assert_eq!(next.hands[Seat::First].get(GoodType::Cloth), 0);
        assert_eq!(next.raw_score(Seat::First), 5 + 3 + 3);
        assert_eq!(next.earnings[Seat::First].bonus_tokens(BonusType::Three).len(), 1);
        assert_eq!(next.coins.bonus_tokens(BonusType::Three).len(), 6);
    }

    #[test]
    fn test_precious_goods_need_pairs() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Diamond, 1)]);

        let sells = game
            .legal_decisions(Seat::First, &state)
            .into_iter()
            .filter(|d| matches!(d, BazaarDecision::Sell { .. }))
            .count();
        assert_eq!(sells, 0);
    }

    #[test]
    fn test_hand_limit_blocks_take() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Leather, 7)]);
        state.market = Goods::from_pairs(&[(GoodType::Spice, 2), (GoodType::Camel, 3)]);

        let take = BazaarDecision::Take { good: GoodType::Spice, count: 1 };
        assert!(!game.legal_decisions(Seat::First, &state).contains(&take));
        assert!(matches!(
            game.check_limits(Seat::First, &state, &take),
            Err(RulesError::ResourceLimitExceeded(_))
        ));
        assert!(matches!(
            game.apply(&state, &take),
            Err(RulesError::ResourceLimitExceeded(_))
        ));
    }

    #[test]
    fn test_trade_swaps_cards() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Camel, 2), (GoodType::Leather, 1)]);
        state.market = Goods::from_pairs(&[(GoodType::Gold, 1), (GoodType::Spice, 1), (GoodType::Camel, 3)]);

        let trade = BazaarDecision::Trade {
            offered: Goods::from_pairs(&[(GoodType::Camel, 2)]),
            requested: Goods::from_pairs(&[(GoodType::Gold, 1), (GoodType::Spice, 1)]),
        };
        assert!(game.legal_decisions(Seat::First, &state).contains(&trade));

        let next = game.apply(&state, &trade).unwrap();
        assert_eq!(next.hands[Seat::First].get(GoodType::Gold), 1);
        assert_eq!(next.hands[Seat::First].get(GoodType::Camel), 0);
        assert_eq!(next.market.get(GoodType::Camel), 5);
    }

    #[test]
    fn test_trade_same_good_is_illegal() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Gold, 2)]);
        state.market = Goods::from_pairs(&[(GoodType::Gold, 2), (GoodType::Camel, 3)]);

        let trade = BazaarDecision::Trade {
            offered: Goods::from_pairs(&[(GoodType::Gold, 2)]),
            requested: Goods::from_pairs(&[(GoodType::Gold, 2)]),
        };
        assert!(game.apply(&state, &trade).is_err());
    }

    #[test]
    fn test_terminal_on_empty_stacks() {
        let game = engine();
        let mut state = game.new_match(42);
        for good in [GoodType::Diamond, GoodType::Gold, GoodType::Silver] {
            state.coins.take_goods_coins(good, 10);
        }
        assert!(game.is_terminal(&state));
        assert!(game.legal_decisions(state.actor, &state).is_empty());
        assert!(game.outcome(&state).is_some());
    }

    #[test]
    fn test_environment_reward_tracks_points() {
        let game = engine();
        let mut state = game.new_match(42);
        state.hands[Seat::First] = Goods::from_pairs(&[(GoodType::Leather, 2)]);

        let next = game
            .apply(&state, &BazaarDecision::Sell { good: GoodType::Leather, count: 2 })
            .unwrap();

        assert_eq!(game.environment_reward(Seat::First, &state, &next), Some(7.0));
        assert_eq!(game.environment_reward(Seat::Second, &state, &next), None);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let game = engine();
        let state = game.new_match(5);
        let decision = game.legal_decisions(Seat::First, &state)[0].clone();
        let before = state.clone();

        let preview = game.preview(Seat::First, &state, &decision);
        assert!(preview.is_some());
        assert_eq!(state, before);
    }

    #[test]
    fn test_first_legal_decision_playout_terminates() {
        let game = engine();
        let mut state = game.new_match(99);
        let mut turns = 0;

        while !game.is_terminal(&state) && turns < 1000 {
            let decisions = game.legal_decisions(state.actor, &state);
            assert!(!decisions.is_empty());
            // Prefer selling, then any take, so the stacks run dry
            let choice = decisions
                .iter()
                .find(|d| matches!(d, BazaarDecision::Sell { .. }))
                .or_else(|| decisions.iter().find(|d| matches!(d, BazaarDecision::Take { .. })))
                .unwrap_or(&decisions[0])
                .clone();
            state = game.apply(&state, &choice).unwrap();
            turns += 1;
        }

        assert!(game.is_terminal(&state));
        assert!(game.outcome(&state).is_some());
    }
}

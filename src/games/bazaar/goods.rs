//! Goods, coin stacks and bonus tokens.

use std::collections::BTreeMap;

use im::Vector;
use serde::{Deserialize, Serialize};

/// A kind of card in the bazaar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoodType {
    Diamond,
    Gold,
    Silver,
    Cloth,
    Spice,
    Leather,
    Camel,
}

impl GoodType {
    /// Every good, camels last.
    pub const ALL: [GoodType; 7] = [
        GoodType::Diamond,
        GoodType::Gold,
        GoodType::Silver,
        GoodType::Cloth,
        GoodType::Spice,
        GoodType::Leather,
        GoodType::Camel,
    ];

    /// Goods that can be sold (everything but camels).
    pub const TRADE_GOODS: [GoodType; 6] = [
        GoodType::Diamond,
        GoodType::Gold,
        GoodType::Silver,
        GoodType::Cloth,
        GoodType::Spice,
        GoodType::Leather,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn is_camel(self) -> bool {
        matches!(self, GoodType::Camel)
    }

    /// Upper-case wire name, e.g. `"DIAMOND"`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            GoodType::Diamond => "DIAMOND",
            GoodType::Gold => "GOLD",
            GoodType::Silver => "SILVER",
            GoodType::Cloth => "CLOTH",
            GoodType::Spice => "SPICE",
            GoodType::Leather => "LEATHER",
            GoodType::Camel => "CAMEL",
        }
    }

    /// Parse a wire name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|good| good.name().eq_ignore_ascii_case(name))
    }

    /// Fewest cards of this good that may be sold at once.
    ///
    /// The three precious goods must be sold in pairs or more.
    #[must_use]
    pub const fn min_sale(self) -> u8 {
        match self {
            GoodType::Diamond | GoodType::Gold | GoodType::Silver => 2,
            _ => 1,
        }
    }

    /// Number of cards of this good in a full deck.
    #[must_use]
    pub const fn deck_count(self) -> u8 {
        match self {
            GoodType::Diamond | GoodType::Gold | GoodType::Silver => 6,
            GoodType::Cloth | GoodType::Spice => 8,
            GoodType::Leather => 10,
            GoodType::Camel => 11,
        }
    }

    /// Coin values for this good, most valuable first. Empty for camels.
    #[must_use]
    pub const fn coin_values(self) -> &'static [u8] {
        match self {
            GoodType::Diamond => &[7, 7, 5, 5, 5],
            GoodType::Gold => &[6, 6, 5, 5, 5],
            GoodType::Silver => &[5, 5, 5, 5, 5],
            GoodType::Cloth => &[5, 3, 3, 2, 2, 1, 1],
            GoodType::Spice => &[5, 3, 3, 2, 2, 1, 1],
            GoodType::Leather => &[4, 3, 2, 1, 1, 1, 1, 1, 1],
            GoodType::Camel => &[],
        }
    }
}

impl std::fmt::Display for GoodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bonus token tiers, awarded for selling three, four, or five+ cards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusType {
    Three,
    Four,
    Five,
}

impl BonusType {
    pub const ALL: [BonusType; 3] = [BonusType::Three, BonusType::Four, BonusType::Five];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The tier earned by a sale of `count` cards, if any.
    #[must_use]
    pub const fn for_sale(count: u8) -> Option<Self> {
        match count {
            0..=2 => None,
            3 => Some(BonusType::Three),
            4 => Some(BonusType::Four),
            _ => Some(BonusType::Five),
        }
    }

    /// Token values in this tier before shuffling.
    #[must_use]
    pub const fn token_values(self) -> &'static [u8] {
        match self {
            BonusType::Three => &[1, 1, 2, 2, 2, 3, 3],
            BonusType::Four => &[4, 4, 5, 5, 6, 6],
            BonusType::Five => &[8, 8, 9, 10, 10],
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            BonusType::Three => "THREE",
            BonusType::Four => "FOUR",
            BonusType::Five => "FIVE",
        }
    }
}

/// A multiset of goods.
///
/// Serialises as a `{ "GOOD": count }` map without zero entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<GoodType, u8>", into = "BTreeMap<GoodType, u8>")]
pub struct Goods {
    counts: [u8; 7],
}

impl Goods {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(good, count)` pairs; repeated goods accumulate.
    #[must_use]
    pub fn from_pairs(pairs: &[(GoodType, u8)]) -> Self {
        let mut goods = Self::new();
        for &(good, count) in pairs {
            goods.add(good, count);
        }
        goods
    }

    #[must_use]
    pub fn get(&self, good: GoodType) -> u8 {
        self.counts[good.index()]
    }

    pub fn add(&mut self, good: GoodType, count: u8) {
        self.counts[good.index()] = self.counts[good.index()].saturating_add(count);
    }

    /// Remove `count` of `good`. Returns false (and changes nothing) if
    /// there are not enough.
    pub fn remove(&mut self, good: GoodType, count: u8) -> bool {
        let slot = &mut self.counts[good.index()];
        if *slot < count {
            return false;
        }
        *slot -= count;
        true
    }

    /// Check that `other` is contained in `self`.
    #[must_use]
    pub fn contains(&self, other: &Goods) -> bool {
        self.counts.iter().zip(other.counts.iter()).all(|(a, b)| a >= b)
    }

    /// Add every good in `other`.
    pub fn add_all(&mut self, other: &Goods) {
        for good in GoodType::ALL {
            self.add(good, other.get(good));
        }
    }

    /// Remove every good in `other`. Returns false (and changes nothing)
    /// if `other` is not contained in `self`.
    pub fn remove_all(&mut self, other: &Goods) -> bool {
        if !self.contains(other) {
            return false;
        }
        for good in GoodType::ALL {
            self.counts[good.index()] -= other.get(good);
        }
        true
    }

    /// Total number of cards.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| u32::from(c)).sum()
    }

    /// Number of cards that are not camels.
    #[must_use]
    pub fn non_camel_total(&self) -> u32 {
        self.total() - u32::from(self.get(GoodType::Camel))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Iterate over goods with a non-zero count.
    pub fn iter(&self) -> impl Iterator<Item = (GoodType, u8)> + '_ {
        GoodType::ALL
            .into_iter()
            .map(|good| (good, self.get(good)))
            .filter(|&(_, count)| count > 0)
    }

    /// Check whether both multisets share a good type.
    #[must_use]
    pub fn overlaps(&self, other: &Goods) -> bool {
        GoodType::ALL
            .into_iter()
            .any(|good| self.get(good) > 0 && other.get(good) > 0)
    }

    /// Every sub-multiset of exactly `size` cards, optionally skipping camels.
    #[must_use]
    pub fn subsets_of_size(&self, size: u32, include_camels: bool) -> Vec<Goods> {
        let kinds: Vec<(GoodType, u8)> = self
            .iter()
            .filter(|(good, _)| include_camels || !good.is_camel())
            .collect();
        let mut out = Vec::new();
        let mut current = Goods::new();
        collect_subsets(&kinds, 0, size, &mut current, &mut out);
        out
    }

    /// Wire map with upper-case names, zero entries omitted.
    #[must_use]
    pub fn to_name_map(&self) -> BTreeMap<String, u8> {
        self.iter().map(|(good, count)| (good.name().to_string(), count)).collect()
    }
}

fn collect_subsets(
    kinds: &[(GoodType, u8)],
    index: usize,
    remaining: u32,
    current: &mut Goods,
    out: &mut Vec<Goods>,
) {
    if remaining == 0 {
        out.push(*current);
        return;
    }
    let Some(&(good, available)) = kinds.get(index) else {
        return;
    };
    let max_take = u32::from(available).min(remaining);
    for take in (0..=max_take).rev() {
        // take <= available (a u8), so the cast is lossless
        let take = take as u8;
        current.add(good, take);
        collect_subsets(kinds, index + 1, remaining - u32::from(take), current, out);
        current.remove(good, take);
    }
}

impl From<BTreeMap<GoodType, u8>> for Goods {
    fn from(map: BTreeMap<GoodType, u8>) -> Self {
        let mut goods = Goods::new();
        for (good, count) in map {
            goods.add(good, count);
        }
        goods
    }
}

impl From<Goods> for BTreeMap<GoodType, u8> {
    fn from(goods: Goods) -> Self {
        goods.iter().collect()
    }
}

/// Coin and bonus-token stacks. Index 0 of each stack is the top.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoinStacks {
    goods: [Vector<u8>; 6],
    bonus: [Vector<u8>; 3],
}

impl CoinStacks {
    /// An empty set of stacks (a player's earnings at the start).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The market's stacks at the start of a match. Bonus tiers are
    /// shuffled with `shuffle`.
    pub fn market(mut shuffle: impl FnMut(&mut Vec<u8>)) -> Self {
        let mut stacks = Self::empty();
        for good in GoodType::TRADE_GOODS {
            stacks.goods[good.index()] = good.coin_values().iter().copied().collect();
        }
        for tier in BonusType::ALL {
            let mut tokens = tier.token_values().to_vec();
            shuffle(&mut tokens);
            stacks.bonus[tier.index()] = tokens.into_iter().collect();
        }
        stacks
    }

    /// Coins left for `good`, top first. Empty for camels.
    #[must_use]
    pub fn goods_coins(&self, good: GoodType) -> Option<&Vector<u8>> {
        if good.is_camel() {
            None
        } else {
            Some(&self.goods[good.index()])
        }
    }

    #[must_use]
    pub fn bonus_tokens(&self, tier: BonusType) -> &Vector<u8> {
        &self.bonus[tier.index()]
    }

    /// Pop up to `count` coins for `good` off the top.
    pub fn take_goods_coins(&mut self, good: GoodType, count: u8) -> Vec<u8> {
        if good.is_camel() {
            return Vec::new();
        }
        let stack = &mut self.goods[good.index()];
        let mut taken = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            match stack.pop_front() {
                Some(coin) => taken.push(coin),
                None => break,
            }
        }
        taken
    }

    /// Pop the top token of a bonus tier, if any remain.
    pub fn take_bonus(&mut self, tier: BonusType) -> Option<u8> {
        self.bonus[tier.index()].pop_front()
    }

    pub fn push_goods_coins(&mut self, good: GoodType, coins: &[u8]) {
        if good.is_camel() {
            return;
        }
        for &coin in coins {
            self.goods[good.index()].push_back(coin);
        }
    }

    pub fn push_bonus(&mut self, tier: BonusType, token: u8) {
        self.bonus[tier.index()].push_back(token);
    }

    /// Number of trade goods whose coin stack is exhausted.
    #[must_use]
    pub fn empty_goods_stacks(&self) -> usize {
        self.goods.iter().filter(|stack| stack.is_empty()).count()
    }

    /// Sum of all goods coins.
    #[must_use]
    pub fn goods_points(&self) -> u32 {
        self.goods
            .iter()
            .flat_map(|stack| stack.iter())
            .map(|&c| u32::from(c))
            .sum()
    }

    /// Sum of the tokens held in one bonus tier.
    #[must_use]
    pub fn bonus_points(&self, tier: BonusType) -> u32 {
        self.bonus[tier.index()].iter().map(|&c| u32::from(c)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_names_round_trip() {
        for good in GoodType::ALL {
            assert_eq!(GoodType::from_name(good.name()), Some(good));
        }
        assert_eq!(GoodType::from_name("spice"), Some(GoodType::Spice));
        assert_eq!(GoodType::from_name("silk"), None);
    }

    #[test]
    fn test_deck_size() {
        let total: u32 = GoodType::ALL.iter().map(|g| u32::from(g.deck_count())).sum();
        assert_eq!(total, 55);
    }

    #[test]
    fn test_goods_add_remove() {
        let mut goods = Goods::from_pairs(&[(GoodType::Cloth, 2), (GoodType::Camel, 3)]);
        assert_eq!(goods.total(), 5);
        assert_eq!(goods.non_camel_total(), 2);

        assert!(!goods.remove(GoodType::Cloth, 3));
        assert_eq!(goods.get(GoodType::Cloth), 2);
        assert!(goods.remove(GoodType::Cloth, 2));
        assert_eq!(goods.get(GoodType::Cloth), 0);
    }

    #[test]
    fn test_goods_remove_all_is_atomic() {
        let mut goods = Goods::from_pairs(&[(GoodType::Gold, 1), (GoodType::Spice, 1)]);
        let too_many = Goods::from_pairs(&[(GoodType::Gold, 1), (GoodType::Spice, 2)]);

        assert!(!goods.remove_all(&too_many));
        assert_eq!(goods.total(), 2);
    }

    #[test]
    fn test_subsets_of_size() {
        let goods = Goods::from_pairs(&[(GoodType::Gold, 2), (GoodType::Spice, 1), (GoodType::Camel, 1)]);

        let pairs = goods.subsets_of_size(2, false);
        // {G,G}, {G,S}
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|s| s.total() == 2 && s.get(GoodType::Camel) == 0));

        let with_camels = goods.subsets_of_size(2, true);
        // {G,G}, {G,S}, {G,C}, {S,C}
        assert_eq!(with_camels.len(), 4);
    }

    #[test]
    fn test_goods_serialization() {
        let goods = Goods::from_pairs(&[(GoodType::Leather, 3)]);
        let json = serde_json::to_string(&goods).unwrap();
        assert_eq!(json, r#"{"LEATHER":3}"#);

        let deserialized: Goods = serde_json::from_str(&json).unwrap();
        assert_eq!(goods, deserialized);
    }

    #[test]
    fn test_bonus_for_sale() {
        assert_eq!(BonusType::for_sale(2), None);
        assert_eq!(BonusType::for_sale(3), Some(BonusType::Three));
        assert_eq!(BonusType::for_sale(4), Some(BonusType::Four));
        assert_eq!(BonusType::for_sale(7), Some(BonusType::Five));
    }

    #[test]
    fn test_coin_stacks_take() {
        let mut stacks = CoinStacks::market(|_| {});
        let coins = stacks.take_goods_coins(GoodType::Diamond, 3);
        assert_eq!(coins, vec![7, 7, 5]);
        assert_eq!(stacks.goods_coins(GoodType::Diamond).unwrap().len(), 2);

        let rest = stacks.take_goods_coins(GoodType::Diamond, 5);
        assert_eq!(rest, vec![5, 5]);
        assert_eq!(stacks.empty_goods_stacks(), 1);

        assert!(stacks.goods_coins(GoodType::Camel).is_none());
        assert!(stacks.take_goods_coins(GoodType::Camel, 2).is_empty());
    }
}

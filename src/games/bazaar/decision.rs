//! Bazaar decisions and their wire form.
//!
//! A decision is one of three verbs:
//! - `Take`: one non-camel good, or every camel, from the market
//! - `Sell`: some number of one good from the hand for coins
//! - `Trade`: swap cards from hand/herd for the same number from the market

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::goods::{GoodType, Goods};

/// A single Bazaar move by the current actor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BazaarDecision {
    Take { good: GoodType, count: u8 },
    Sell { good: GoodType, count: u8 },
    Trade { offered: Goods, requested: Goods },
}

impl BazaarDecision {
    /// Wire label for the verb.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            BazaarDecision::Take { .. } => "Take",
            BazaarDecision::Sell { .. } => "Sell",
            BazaarDecision::Trade { .. } => "Trade",
        }
    }

    /// Cards leaving the actor's hand.
    #[must_use]
    pub fn offered(&self) -> Goods {
        match *self {
            BazaarDecision::Take { .. } => Goods::new(),
            BazaarDecision::Sell { good, count } => Goods::from_pairs(&[(good, count)]),
            BazaarDecision::Trade { offered, .. } => offered,
        }
    }

    /// Cards entering the actor's hand.
    #[must_use]
    pub fn requested(&self) -> Goods {
        match *self {
            BazaarDecision::Take { good, count } => Goods::from_pairs(&[(good, count)]),
            BazaarDecision::Sell { .. } => Goods::new(),
            BazaarDecision::Trade { requested, .. } => requested,
        }
    }

    /// Convert the transport's loose form into a decision.
    ///
    /// `Sell` reads the first entry of `offered`, `Take` the first entry
    /// of `requested`; `Trade` uses both maps in full. Unknown good names
    /// and empty maps are rejected.
    pub fn from_request(request: &DecisionRequest) -> Result<Self, String> {
        let offered = parse_goods(&request.offered)?;
        let requested = parse_goods(&request.requested)?;

        match request.kind.as_str() {
            "Sell" => offered
                .iter()
                .next()
                .map(|(good, count)| BazaarDecision::Sell { good, count })
                .ok_or_else(|| "sell needs an offered good".to_string()),
            "Take" => requested
                .iter()
                .next()
                .map(|(good, count)| BazaarDecision::Take { good, count })
                .ok_or_else(|| "take needs a requested good".to_string()),
            "Trade" => Ok(BazaarDecision::Trade { offered, requested }),
            other => Err(format!("unknown decision type '{other}'")),
        }
    }
}

impl std::fmt::Display for BazaarDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BazaarDecision::Take { good, count } => write!(f, "Take {count} {good}"),
            BazaarDecision::Sell { good, count } => write!(f, "Sell {count} {good}"),
            BazaarDecision::Trade { offered, requested } => {
                write!(f, "Trade {} for {}", offered.total(), requested.total())
            }
        }
    }
}

fn parse_goods(map: &BTreeMap<String, u8>) -> Result<Goods, String> {
    let mut goods = Goods::new();
    for (name, &count) in map {
        let good = GoodType::from_name(name).ok_or_else(|| format!("unknown good '{name}'"))?;
        goods.add(good, count);
    }
    Ok(goods)
}

/// Decision as submitted by a client.
///
/// ```json
/// { "type": "Trade", "offered": { "CAMEL": 2 }, "requested": { "SPICE": 1, "GOLD": 1 } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub offered: BTreeMap<String, u8>,
    #[serde(default)]
    pub requested: BTreeMap<String, u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: &str, offered: &[(&str, u8)], requested: &[(&str, u8)]) -> DecisionRequest {
        DecisionRequest {
            kind: kind.to_string(),
            offered: offered.iter().map(|&(n, c)| (n.to_string(), c)).collect(),
            requested: requested.iter().map(|&(n, c)| (n.to_string(), c)).collect(),
        }
    }

    #[test]
    fn test_from_request_sell() {
        let decision = BazaarDecision::from_request(&request("Sell", &[("CLOTH", 3)], &[])).unwrap();
        assert_eq!(decision, BazaarDecision::Sell { good: GoodType::Cloth, count: 3 });
        assert_eq!(decision.offered().get(GoodType::Cloth), 3);
    }

    #[test]
    fn test_from_request_take_and_trade() {
        let take = BazaarDecision::from_request(&request("Take", &[], &[("CAMEL", 2)])).unwrap();
        assert_eq!(take, BazaarDecision::Take { good: GoodType::Camel, count: 2 });

        let trade = BazaarDecision::from_request(&request(
            "Trade",
            &[("CAMEL", 2)],
            &[("SPICE", 1), ("GOLD", 1)],
        ))
        .unwrap();
        assert_eq!(trade.offered().get(GoodType::Camel), 2);
        assert_eq!(trade.requested().total(), 2);
    }

    #[test]
    fn test_from_request_rejects_bad_input() {
        assert!(BazaarDecision::from_request(&request("Sell", &[], &[])).is_err());
        assert!(BazaarDecision::from_request(&request("Steal", &[], &[])).is_err());
        assert!(BazaarDecision::from_request(&request("Take", &[], &[("SILK", 1)])).is_err());
    }

    #[test]
    fn test_decision_serialization() {
        let decision = BazaarDecision::Take { good: GoodType::Gold, count: 1 };
        let json = serde_json::to_string(&decision).unwrap();
        assert_eq!(json, r#"{"type":"Take","good":"GOLD","count":1}"#);

        let request: DecisionRequest =
            serde_json::from_str(r#"{"type":"Sell","offered":{"LEATHER":2}}"#).unwrap();
        assert!(request.requested.is_empty());
    }
}

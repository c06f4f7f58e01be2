//! Commodities and market history.
//!
//! Prices are [`Decimal`] so the pricing tick is reproducible without
//! floating-point drift. Every price is floored at 1 and carried to two
//! decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradeable commodity with a market price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    /// Commodity name, unique within a world (theme-driven).
    pub name: String,
    /// Long-run anchor price the market reverts toward.
    pub base_price: Decimal,
    /// Current market price, floored at 1, two decimal places.
    pub current_price: Decimal,
    /// Units available.
    pub supply: u32,
    /// Units sought.
    pub demand: u32,
    /// Bound on per-tick random price noise.
    pub volatility: Decimal,
}

/// An audit record of a notable market move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Epoch during which the move happened.
    pub epoch: u64,
    /// The commodity that moved.
    pub commodity: String,
    /// Price before the tick.
    pub price_before: Decimal,
    /// Price after the tick.
    pub price_after: Decimal,
    /// Human-readable note.
    pub text: String,
}

/// Market state: commodities plus the append-only move history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Economy {
    /// All commodities traded in this world.
    #[serde(default)]
    pub commodities: Vec<Commodity>,
    /// Notable market moves, append-only.
    #[serde(default)]
    pub market_events: Vec<MarketEvent>,
}

impl Economy {
    /// Immutable commodity lookup by name.
    pub fn commodity(&self, name: &str) -> Option<&Commodity> {
        self.commodities.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commodity_lookup_by_name() {
        let economy = Economy {
            commodities: vec![Commodity {
                name: "salt".to_string(),
                base_price: Decimal::from(10),
                current_price: Decimal::from(12),
                supply: 80,
                demand: 100,
                volatility: Decimal::new(15, 1),
            }],
            market_events: Vec::new(),
        };

        assert!(economy.commodity("salt").is_some());
        assert!(economy.commodity("silk").is_none());
    }
}

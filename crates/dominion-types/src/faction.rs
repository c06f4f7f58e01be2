//! Factions: named powers holding resources, troops, and diplomacy.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::Stance;
use crate::ids::FactionId;

/// A faction's stockpile of the three strategic resources.
///
/// All fields are unsigned: no mutation can take a pool below zero, and
/// [`spend`](Self::spend) refuses to apply a cost it cannot fully cover, so
/// deductions are all-or-nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Coin.
    pub gold: u32,
    /// Food stores.
    pub grain: u32,
    /// Weapons-grade metal.
    pub iron: u32,
}

impl ResourcePool {
    /// Construct a pool from explicit amounts.
    pub const fn new(gold: u32, grain: u32, iron: u32) -> Self {
        Self { gold, grain, iron }
    }

    /// Whether this pool covers `cost` in every dimension.
    pub const fn covers(&self, cost: &Self) -> bool {
        self.gold >= cost.gold && self.grain >= cost.grain && self.iron >= cost.iron
    }

    /// Deduct `cost` if fully covered. Returns `false` (and leaves the pool
    /// untouched) otherwise.
    pub fn spend(&mut self, cost: &Self) -> bool {
        if !self.covers(cost) {
            return false;
        }
        self.gold = self.gold.saturating_sub(cost.gold);
        self.grain = self.grain.saturating_sub(cost.grain);
        self.iron = self.iron.saturating_sub(cost.iron);
        true
    }

    /// Add `income` to the pool, saturating at `u32::MAX`.
    pub fn grant(&mut self, income: &Self) {
        self.gold = self.gold.saturating_add(income.gold);
        self.grain = self.grain.saturating_add(income.grain);
        self.iron = self.iron.saturating_add(income.iron);
    }
}

/// A named power in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    /// Unique identifier.
    pub id: FactionId,
    /// Display name.
    pub name: String,
    /// Flavor archetype, e.g. "merchant league" (theme-driven).
    pub archetype: String,
    /// Strategic resource stockpile.
    pub resources: ResourcePool,
    /// Standing troops; clamped at 0 by type.
    pub troops: u32,
    /// Troop quality multiplier, typically `0.2..=3.0`.
    pub troop_quality: Decimal,
    /// Directed stances toward other factions.
    #[serde(default)]
    pub relations: BTreeMap<FactionId, Stance>,
    /// Laws this faction has enacted (narrative strings).
    #[serde(default)]
    pub laws: Vec<String>,
}

impl Faction {
    /// The stance this faction holds toward `other`, defaulting to neutral.
    pub fn stance_toward(&self, other: FactionId) -> Stance {
        self.relations.get(&other).copied().unwrap_or_default()
    }

    /// Remove casualties from the standing army, clamped at zero.
    pub fn suffer_casualties(&mut self, losses: u32) -> u32 {
        let applied = losses.min(self.troops);
        self.troops = self.troops.saturating_sub(applied);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_is_all_or_nothing() {
        let mut pool = ResourcePool::new(10, 5, 0);
        let cost = ResourcePool::new(20, 0, 0);

        assert!(!pool.spend(&cost));
        assert_eq!(pool, ResourcePool::new(10, 5, 0));

        let affordable = ResourcePool::new(10, 5, 0);
        assert!(pool.spend(&affordable));
        assert_eq!(pool, ResourcePool::new(0, 0, 0));
    }

    #[test]
    fn grant_saturates() {
        let mut pool = ResourcePool::new(u32::MAX, 0, 0);
        pool.grant(&ResourcePool::new(10, 10, 10));
        assert_eq!(pool.gold, u32::MAX);
        assert_eq!(pool.grain, 10);
    }

    #[test]
    fn casualties_clamp_to_standing_troops() {
        let mut faction = Faction {
            id: FactionId::new(),
            name: "Ashen Compact".to_string(),
            archetype: "warband".to_string(),
            resources: ResourcePool::default(),
            troops: 40,
            troop_quality: Decimal::ONE,
            relations: BTreeMap::new(),
            laws: Vec::new(),
        };

        let applied = faction.suffer_casualties(65);
        assert_eq!(applied, 40);
        assert_eq!(faction.troops, 0);
    }

    #[test]
    fn unknown_stance_is_neutral() {
        let faction = Faction {
            id: FactionId::new(),
            name: "Gilded Court".to_string(),
            archetype: "merchant league".to_string(),
            resources: ResourcePool::default(),
            troops: 0,
            troop_quality: Decimal::ONE,
            relations: BTreeMap::new(),
            laws: Vec::new(),
        };
        assert_eq!(faction.stance_toward(FactionId::new()), Stance::Neutral);
    }
}

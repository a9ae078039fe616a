//! Purchasable content: producers, click upgrades, achievements and skins.
//!
//! The definitions are supplied by the host (or [`Catalog::builtin`]); the
//! engine owns the mutable ownership fields and validates every purchase.

use serde::{Deserialize, Serialize};

use crate::error::PurchaseError;

/// Cost growth per owned unit when an entry does not specify one.
pub const DEFAULT_COST_GROWTH: f64 = 1.15;

fn default_cost_growth() -> f64 {
    DEFAULT_COST_GROWTH
}

/// A production upgrade. Each owned unit adds `base_rate` per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub base_cost: f64,
    #[serde(default = "default_cost_growth")]
    pub cost_growth: f64,
    pub base_rate: f64,
    /// Lifetime score at which the entry becomes purchasable.
    #[serde(default)]
    pub unlock_at: f64,
    #[serde(default)]
    pub owned_count: u32,
    #[serde(default)]
    pub unlocked: bool,
}

impl Upgrade {
    pub fn new(id: &str, name: &str, base_cost: f64, base_rate: f64, unlock_at: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_cost,
            cost_growth: DEFAULT_COST_GROWTH,
            base_rate,
            unlock_at,
            owned_count: 0,
            unlocked: false,
        }
    }

    /// Cost of the next unit.
    pub fn cost(&self) -> f64 {
        self.base_cost * self.cost_growth.powi(self.owned_count as i32)
    }

    /// Additive production of all owned units.
    pub fn contribution(&self) -> f64 {
        self.owned_count as f64 * self.base_rate
    }

    pub fn is_well_formed(&self) -> bool {
        is_positive(self.base_cost)
            && self.cost_growth.is_finite()
            && self.cost_growth >= 1.0
            && is_non_negative(self.base_rate)
            && is_non_negative(self.unlock_at)
    }
}

/// A one-shot click power upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickUpgrade {
    pub id: String,
    pub name: String,
    pub cost: f64,
    pub base_power: f64,
    #[serde(default)]
    pub unlock_at: f64,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default)]
    pub unlocked: bool,
}

impl ClickUpgrade {
    pub fn new(id: &str, name: &str, cost: f64, base_power: f64, unlock_at: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            base_power,
            unlock_at,
            purchased: false,
            unlocked: false,
        }
    }

    pub fn contribution(&self) -> f64 {
        if self.purchased {
            self.base_power
        } else {
            0.0
        }
    }

    pub fn is_well_formed(&self) -> bool {
        is_positive(self.cost) && is_non_negative(self.base_power) && is_non_negative(self.unlock_at)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AchievementCondition {
    TotalScore(f64),
    Clicks(u64),
    PrestigeLevel(u32),
    Combo(u32),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub condition: AchievementCondition,
    #[serde(default)]
    pub unlocked: bool,
}

impl Achievement {
    pub fn new(id: &str, name: &str, condition: AchievementCondition) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            condition,
            unlocked: false,
        }
    }
}

/// Cosmetic that also multiplies production while selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub id: String,
    pub name: String,
    pub cost: f64,
    /// Production multiplier while selected (at least 1).
    #[serde(default = "one")]
    pub production_bonus: f64,
    #[serde(default)]
    pub owned: bool,
}

fn one() -> f64 {
    1.0
}

impl Skin {
    pub fn new(id: &str, name: &str, cost: f64, production_bonus: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            production_bonus,
            owned: false,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        is_non_negative(self.cost) && self.production_bonus.is_finite() && self.production_bonus >= 1.0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub upgrades: Vec<Upgrade>,
    pub click_upgrades: Vec<ClickUpgrade>,
    pub achievements: Vec<Achievement>,
    pub skins: Vec<Skin>,
}

impl Catalog {
    /// Load catalog definitions from JSON. Ownership fields may be omitted.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Default content set.
    pub fn builtin() -> Self {
        Self {
            upgrades: vec![
                Upgrade::new("cursor", "Cursor", 15.0, 0.1, 0.0),
                Upgrade::new("intern", "Intern", 100.0, 1.0, 50.0),
                Upgrade::new("workshop", "Workshop", 1_100.0, 8.0, 500.0),
                Upgrade::new("mine", "Mine", 12_000.0, 47.0, 6_000.0),
                Upgrade::new("factory", "Factory", 130_000.0, 260.0, 65_000.0),
                Upgrade::new("bank", "Bank", 1_400_000.0, 1_400.0, 700_000.0),
            ],
            click_upgrades: vec![
                ClickUpgrade::new("reinforced_finger", "Reinforced Finger", 100.0, 1.0, 0.0),
                ClickUpgrade::new("steel_finger", "Steel Finger", 500.0, 4.0, 250.0),
                ClickUpgrade::new("golden_finger", "Golden Finger", 10_000.0, 20.0, 5_000.0),
                ClickUpgrade::new("diamond_finger", "Diamond Finger", 250_000.0, 150.0, 100_000.0),
            ],
            achievements: vec![
                Achievement::new("first_click", "First Click", AchievementCondition::Clicks(1)),
                Achievement::new("click_100", "Clicker", AchievementCondition::Clicks(100)),
                Achievement::new("click_1000", "Click Machine", AchievementCondition::Clicks(1_000)),
                Achievement::new("score_1k", "Getting Started", AchievementCondition::TotalScore(1e3)),
                Achievement::new("score_1m", "Millionaire", AchievementCondition::TotalScore(1e6)),
                Achievement::new("combo_25", "On Fire", AchievementCondition::Combo(25)),
                Achievement::new("combo_100", "Unstoppable", AchievementCondition::Combo(100)),
                Achievement::new("prestige_1", "Reborn", AchievementCondition::PrestigeLevel(1)),
            ],
            skins: vec![
                Skin::new("classic", "Classic", 0.0, 1.0),
                Skin::new("neon", "Neon", 50_000.0, 1.05),
                Skin::new("golden", "Golden", 5_000_000.0, 1.15),
            ],
        }
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn click_upgrade(&self, id: &str) -> Option<&ClickUpgrade> {
        self.click_upgrades.iter().find(|u| u.id == id)
    }

    pub fn skin(&self, id: &str) -> Option<&Skin> {
        self.skins.iter().find(|s| s.id == id)
    }

    /// Additive production from every owned upgrade.
    pub fn production_contribution(&self) -> f64 {
        self.upgrades
            .iter()
            .filter(|u| u.is_well_formed())
            .map(Upgrade::contribution)
            .sum()
    }

    /// Additive click power from purchased click upgrades.
    pub fn click_contribution(&self) -> f64 {
        self.click_upgrades
            .iter()
            .filter(|u| u.is_well_formed())
            .map(ClickUpgrade::contribution)
            .sum()
    }

    /// Production multiplier of the selected skin, 1.0 if none or not owned.
    pub fn skin_bonus(&self, selected: Option<&str>) -> f64 {
        selected
            .and_then(|id| self.skin(id))
            .filter(|s| s.owned && s.is_well_formed())
            .map_or(1.0, |s| s.production_bonus)
    }

    /// Mark entries unlocked once lifetime score reaches their threshold.
    /// Returns how many entries changed.
    pub fn refresh_unlocks(&mut self, total_score: f64) -> usize {
        let mut changed = 0;
        for u in &mut self.upgrades {
            if !u.unlocked && total_score >= u.unlock_at {
                u.unlocked = true;
                changed += 1;
            }
        }
        for u in &mut self.click_upgrades {
            if !u.unlocked && total_score >= u.unlock_at {
                u.unlocked = true;
                changed += 1;
            }
        }
        changed
    }

    /// Cost of the next unit of upgrade `id`, after validation.
    pub fn upgrade_price(&self, id: &str) -> Result<f64, PurchaseError> {
        let u = self
            .upgrade(id)
            .ok_or_else(|| PurchaseError::UnknownItem(id.into()))?;
        if !u.is_well_formed() || !u.cost().is_finite() {
            return Err(PurchaseError::MalformedEntry(id.into()));
        }
        if !u.unlocked {
            return Err(PurchaseError::Locked(id.into()));
        }
        Ok(u.cost())
    }

    pub fn click_upgrade_price(&self, id: &str) -> Result<f64, PurchaseError> {
        let u = self
            .click_upgrade(id)
            .ok_or_else(|| PurchaseError::UnknownItem(id.into()))?;
        if !u.is_well_formed() {
            return Err(PurchaseError::MalformedEntry(id.into()));
        }
        if u.purchased {
            return Err(PurchaseError::AlreadyOwned(id.into()));
        }
        if !u.unlocked {
            return Err(PurchaseError::Locked(id.into()));
        }
        Ok(u.cost)
    }

    pub fn skin_price(&self, id: &str) -> Result<f64, PurchaseError> {
        let s = self.skin(id).ok_or_else(|| PurchaseError::UnknownItem(id.into()))?;
        if !s.is_well_formed() {
            return Err(PurchaseError::MalformedEntry(id.into()));
        }
        if s.owned {
            return Err(PurchaseError::AlreadyOwned(id.into()));
        }
        Ok(s.cost)
    }

    /// Forget all ownership, keeping achievements and skins if `keep_meta`.
    pub fn reset_ownership(&mut self, keep_meta: bool) {
        for u in &mut self.upgrades {
            u.owned_count = 0;
            u.unlocked = false;
        }
        for u in &mut self.click_upgrades {
            u.purchased = false;
            u.unlocked = false;
        }
        if !keep_meta {
            for a in &mut self.achievements {
                a.unlocked = false;
            }
            for s in &mut self.skins {
                s.owned = false;
            }
        }
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn is_non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

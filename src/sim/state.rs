//! Numeric game state and time-bounded effects.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::time::Millis;

/// What an effect modifies and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Multiplies production per second.
    ProductionMultiplier,
    /// Multiplies click power.
    ClickMultiplier,
    /// Adds flat production per second before multipliers.
    ProductionBonus,
    /// Adds flat click power before multipliers.
    ClickBonus,
}

impl EffectKind {
    pub fn is_multiplier(&self) -> bool {
        matches!(self, EffectKind::ProductionMultiplier | EffectKind::ClickMultiplier)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::ProductionMultiplier => "Production x",
            EffectKind::ClickMultiplier => "Click x",
            EffectKind::ProductionBonus => "Production +",
            EffectKind::ClickBonus => "Click +",
        }
    }
}

/// A time-bounded modifier. Active iff `expires_at > now`.
#[derive(Clone, Debug, PartialEq)]
pub struct Effect {
    pub kind: EffectKind,
    pub magnitude: f64,
    pub expires_at: Millis,
}

impl Effect {
    pub fn is_active(&self, now: Millis) -> bool {
        self.expires_at > now
    }

    pub fn remaining_ms(&self, now: Millis) -> Millis {
        self.expires_at.saturating_sub(now)
    }
}

/// The single mutable aggregate of a play session.
///
/// Catalog ownership (upgrades, achievements, skins) lives in
/// [`Catalog`](super::catalog::Catalog); everything else a save needs is here.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    /// Spendable score.
    pub score: f64,
    /// Lifetime score; only ever increases.
    pub total_score: f64,
    /// Base click power before upgrades and multipliers.
    pub click_power: f64,
    /// Base production per second before upgrades and multipliers.
    pub production: f64,
    /// Not persisted.
    pub active_effects: Vec<Effect>,
    pub prestige_level: u32,
    pub prestige_points: u64,
    /// Milestone thresholds that have already been queued.
    pub triggered_milestones: BTreeSet<u64>,
    pub combo_count: u32,
    /// Absolute deadline for the next click to extend the combo.
    pub combo_deadline: Millis,
    /// Timestamp of the last successful save, None if never saved.
    pub last_save_timestamp: Option<Millis>,
    /// When this save-game was started.
    pub session_start: Millis,
    pub total_clicks: u64,
    /// Xorshift state for the spawners.
    pub rng_state: u32,
    pub selected_skin: Option<String>,
    pub tutorial_done: bool,
}

impl GameState {
    pub fn new(now: Millis) -> Self {
        Self {
            score: 0.0,
            total_score: 0.0,
            click_power: 1.0,
            production: 0.0,
            active_effects: Vec::new(),
            prestige_level: 0,
            prestige_points: 0,
            triggered_milestones: BTreeSet::new(),
            combo_count: 0,
            combo_deadline: 0,
            last_save_timestamp: None,
            session_start: now,
            total_clicks: 0,
            rng_state: 42,
            selected_skin: None,
            tutorial_done: false,
        }
    }

    /// Credit score to both the spendable and lifetime totals.
    /// Non-finite or negative amounts are ignored.
    pub fn credit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.score += amount;
            self.total_score += amount;
        }
    }

    /// Spend score. Returns false (and changes nothing) if short.
    pub fn spend(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 || self.score < amount {
            return false;
        }
        self.score -= amount;
        true
    }

    /// Xorshift32. Never returns to zero once seeded non-zero.
    pub fn next_random(&mut self) -> u32 {
        let mut x = if self.rng_state == 0 { 0x9E37_79B9 } else { self.rng_state };
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        x
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.next_random() as f64 / (u32::MAX as f64 + 1.0)
    }
}

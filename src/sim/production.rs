//! Production model: state → production per second and click power.
//!
//! Stage order is fixed so the result depends only on state:
//!
//! 1. additive: base + Σ(owned × rate) + additive effects
//! 2. effect multipliers (each floored at 1, composed by product)
//! 3. prestige multiplier
//! 4. selected skin bonus (production only)

use crate::config::EngineConfig;
use crate::time::Millis;

use super::catalog::Catalog;
use super::effects;
use super::state::{EffectKind, GameState};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Production {
    pub per_second: f64,
    pub click_power: f64,
}

/// `1 + level × per_level + points × per_point`.
pub fn prestige_multiplier(level: u32, points: u64, config: &EngineConfig) -> f64 {
    let m = 1.0
        + level as f64 * config.prestige_bonus_per_level
        + points as f64 * config.prestige_bonus_per_point;
    if m.is_finite() {
        m.max(1.0)
    } else {
        1.0
    }
}

/// Lifetime prestige points a run with `total_score` is worth:
/// `floor(sqrt(total_score / threshold))`.
pub fn prestige_points_for(total_score: f64, threshold: f64) -> u64 {
    if threshold.is_nan() || threshold <= 0.0 || !total_score.is_finite() || total_score <= 0.0 {
        return 0;
    }
    (total_score / threshold).sqrt().floor() as u64
}

/// Pure computation; expired effects are skipped but not removed.
pub fn compute(state: &GameState, catalog: &Catalog, config: &EngineConfig, now: Millis) -> Production {
    let fx = &state.active_effects;
    let prestige = prestige_multiplier(state.prestige_level, state.prestige_points, config);

    let additive = state.production
        + catalog.production_contribution()
        + effects::bonus(fx, EffectKind::ProductionBonus, now);
    let per_second = additive
        * effects::multiplier(fx, EffectKind::ProductionMultiplier, now)
        * prestige
        * catalog.skin_bonus(state.selected_skin.as_deref());

    let click_additive = state.click_power
        + catalog.click_contribution()
        + effects::bonus(fx, EffectKind::ClickBonus, now);
    let click_power =
        click_additive * effects::multiplier(fx, EffectKind::ClickMultiplier, now) * prestige;

    Production {
        per_second: sanitize(per_second),
        click_power: sanitize(click_power),
    }
}

/// Prune effects with `expires_at <= now`, then compute.
/// Returns the new production and how many effects were removed.
pub fn recompute(
    state: &mut GameState,
    catalog: &Catalog,
    config: &EngineConfig,
    now: Millis,
) -> (Production, usize) {
    let before = state.active_effects.len();
    state.active_effects.retain(|e| e.is_active(now));
    let pruned = before - state.active_effects.len();
    (compute(state, catalog, config, now), pruned)
}

fn sanitize(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

//! Effect stack: append-only, expiry observed only by the production model.

use crate::error::EffectError;
use crate::time::Millis;

use super::state::{Effect, EffectKind, GameState};

/// Push a new effect expiring `duration_ms` from `now`.
/// Duplicate kinds stack; nothing is replaced.
pub fn add_effect(
    state: &mut GameState,
    kind: EffectKind,
    magnitude: f64,
    duration_ms: Millis,
    now: Millis,
) -> Result<(), EffectError> {
    if duration_ms == 0 {
        return Err(EffectError::NonPositiveDuration);
    }
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(EffectError::InvalidMagnitude(magnitude));
    }
    state.active_effects.push(Effect {
        kind,
        magnitude,
        expires_at: now.saturating_add(duration_ms),
    });
    Ok(())
}

/// Non-expired effects. Read-only: expired entries stay in the state until
/// the next production recompute prunes them.
pub fn active_effects(state: &GameState, now: Millis) -> impl Iterator<Item = &Effect> {
    state.active_effects.iter().filter(move |e| e.is_active(now))
}

/// Combined multiplier of all active effects of `kind`, each floored at 1.
pub fn multiplier(effects: &[Effect], kind: EffectKind, now: Millis) -> f64 {
    effects
        .iter()
        .filter(|e| e.kind == kind && e.is_active(now))
        .map(|e| e.magnitude.max(1.0))
        .product()
}

/// Sum of all active additive effects of `kind`.
pub fn bonus(effects: &[Effect], kind: EffectKind, now: Millis) -> f64 {
    effects
        .iter()
        .filter(|e| e.kind == kind && e.is_active(now))
        .map(|e| e.magnitude)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sets_absolute_expiry() {
        let mut s = GameState::new(0);
        add_effect(&mut s, EffectKind::ProductionMultiplier, 2.0, 5_000, 1_000).unwrap();
        assert_eq!(s.active_effects[0].expires_at, 6_000);
    }

    #[test]
    fn zero_duration_rejected_without_mutation() {
        let mut s = GameState::new(0);
        assert_eq!(
            add_effect(&mut s, EffectKind::ClickMultiplier, 2.0, 0, 0),
            Err(EffectError::NonPositiveDuration)
        );
        assert!(s.active_effects.is_empty());
    }

    #[test]
    fn bad_magnitude_rejected() {
        let mut s = GameState::new(0);
        assert!(add_effect(&mut s, EffectKind::ClickBonus, f64::NAN, 10, 0).is_err());
        assert!(add_effect(&mut s, EffectKind::ClickBonus, -1.0, 10, 0).is_err());
        assert!(s.active_effects.is_empty());
    }

    #[test]
    fn duplicates_compose_multiplicatively() {
        let mut s = GameState::new(0);
        add_effect(&mut s, EffectKind::ProductionMultiplier, 2.0, 1_000, 0).unwrap();
        add_effect(&mut s, EffectKind::ProductionMultiplier, 3.0, 1_000, 0).unwrap();
        assert_eq!(s.active_effects.len(), 2);
        let m = multiplier(&s.active_effects, EffectKind::ProductionMultiplier, 10);
        assert!((m - 6.0).abs() < 1e-9);
    }

    #[test]
    fn multiplier_floors_at_one() {
        let mut s = GameState::new(0);
        add_effect(&mut s, EffectKind::ClickMultiplier, 0.25, 1_000, 0).unwrap();
        assert_eq!(multiplier(&s.active_effects, EffectKind::ClickMultiplier, 0), 1.0);
    }

    #[test]
    fn active_effects_does_not_prune() {
        let mut s = GameState::new(0);
        add_effect(&mut s, EffectKind::ClickBonus, 5.0, 100, 0).unwrap();
        add_effect(&mut s, EffectKind::ClickBonus, 7.0, 1_000, 0).unwrap();
        assert_eq!(active_effects(&s, 500).count(), 1);
        assert_eq!(s.active_effects.len(), 2);
        assert!((bonus(&s.active_effects, EffectKind::ClickBonus, 500) - 7.0).abs() < 1e-9);
    }
}

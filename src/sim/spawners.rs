//! Event producers and progression checks driven by the scheduler.
//!
//! Each function inspects state and returns what should happen; queuing,
//! persisting and notifying are left to the engine.

use crate::config::EngineConfig;

use super::catalog::{AchievementCondition, Catalog};
use super::events::{PendingEvent, Reward};
use super::production::Production;
use super::state::{EffectKind, GameState};

/// Steps shown by the first-run tutorial.
pub const TUTORIAL_STEPS: u32 = 3;

/// Boss health in seconds of current production.
const BOSS_HEALTH_SECONDS: f64 = 30.0;
const BOSS_MIN_HEALTH: f64 = 10.0;

const QUIZ_EFFECT_MAGNITUDE: f64 = 2.0;
const QUIZ_EFFECT_MS: u64 = 30_000;

/// Lowest configured threshold reached by lifetime score that has not fired.
///
/// Only one threshold is returned per call; a jump across several is caught
/// up one check at a time.
pub fn next_milestone(state: &GameState, thresholds: &[u64]) -> Option<u64> {
    thresholds
        .iter()
        .copied()
        .filter(|t| !state.triggered_milestones.contains(t))
        .find(|t| state.total_score >= *t as f64)
}

pub fn milestone_event(threshold: u64, config: &EngineConfig) -> PendingEvent {
    PendingEvent::milestone(
        threshold,
        Reward::Score((threshold as f64 * config.milestone_reward_ratio).floor()),
    )
}

/// Unlock every achievement whose condition now holds.
/// Returns indices into `catalog.achievements` of newly unlocked entries.
pub fn unlock_achievements(state: &GameState, catalog: &mut Catalog) -> Vec<usize> {
    let mut unlocked = Vec::new();
    for (i, a) in catalog.achievements.iter_mut().enumerate() {
        if a.unlocked {
            continue;
        }
        let met = match a.condition {
            AchievementCondition::TotalScore(x) => state.total_score >= x,
            AchievementCondition::Clicks(n) => state.total_clicks >= n,
            AchievementCondition::PrestigeLevel(n) => state.prestige_level >= n,
            AchievementCondition::Combo(n) => state.combo_count >= n,
        };
        if met {
            a.unlocked = true;
            unlocked.push(i);
        }
    }
    unlocked
}

/// A boss scaled to current production, or None while nothing is produced.
pub fn boss_event(production: &Production, config: &EngineConfig) -> Option<PendingEvent> {
    let pps = production.per_second;
    if !(pps.is_finite() && pps > 0.0) {
        return None;
    }
    let health = (pps * BOSS_HEALTH_SECONDS).ceil().max(BOSS_MIN_HEALTH);
    let reward = Reward::Score((pps * config.boss_reward_seconds).floor());
    Some(PendingEvent::boss(health, reward))
}

/// Roll for a quiz. Consumes randomness from `state` whether or not one spawns.
pub fn roll_quiz(state: &mut GameState, config: &EngineConfig) -> Option<PendingEvent> {
    if state.next_unit() >= config.quiz_chance {
        return None;
    }
    let a = i64::from(state.next_random() % 50) + 1;
    let b = i64::from(state.next_random() % 50) + 1;
    Some(PendingEvent::quiz(
        format!("{a} + {b}"),
        a + b,
        Reward::Effect {
            kind: EffectKind::ProductionMultiplier,
            magnitude: QUIZ_EFFECT_MAGNITUDE,
            duration_ms: QUIZ_EFFECT_MS,
        },
    ))
}

pub fn tutorial_event() -> PendingEvent {
    PendingEvent::tutorial(TUTORIAL_STEPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::{EventKind, EventPayload};

    #[test]
    fn milestone_picks_lowest_untriggered() {
        let mut s = GameState::new(0);
        let t = [1_000, 10_000, 100_000];
        assert_eq!(next_milestone(&s, &t), None);

        s.total_score = 150_000.0;
        assert_eq!(next_milestone(&s, &t), Some(1_000));
        s.triggered_milestones.insert(1_000);
        assert_eq!(next_milestone(&s, &t), Some(10_000));
        s.triggered_milestones.insert(10_000);
        s.triggered_milestones.insert(100_000);
        assert_eq!(next_milestone(&s, &t), None);
    }

    #[test]
    fn milestone_reward_is_ratio_of_threshold() {
        let config = EngineConfig::default();
        let ev = milestone_event(10_000, &config);
        assert_eq!(ev.kind, EventKind::Milestone);
        assert_eq!(ev.reward, Reward::Score(1_000.0));
    }

    #[test]
    fn achievements_unlock_once() {
        let mut catalog = Catalog::builtin();
        let mut s = GameState::new(0);
        s.total_clicks = 1;
        let first = unlock_achievements(&s, &mut catalog);
        assert_eq!(first.len(), 1);
        assert_eq!(catalog.achievements[first[0]].id, "first_click");
        assert!(unlock_achievements(&s, &mut catalog).is_empty());

        s.total_score = 2_000.0;
        s.combo_count = 30;
        let next: Vec<_> = unlock_achievements(&s, &mut catalog)
            .into_iter()
            .map(|i| catalog.achievements[i].id.clone())
            .collect();
        assert_eq!(next, vec!["score_1k", "combo_25"]);
    }

    #[test]
    fn no_boss_without_production() {
        let config = EngineConfig::default();
        assert!(boss_event(&Production::default(), &config).is_none());

        let p = Production {
            per_second: 10.0,
            click_power: 1.0,
        };
        let boss = boss_event(&p, &config).unwrap();
        assert_eq!(boss.payload, EventPayload::Boss { health: 300.0 });
        assert_eq!(boss.reward, Reward::Score(600.0));
    }

    #[test]
    fn quiz_answer_matches_prompt() {
        let mut config = EngineConfig::default();
        config.quiz_chance = 1.0;
        let mut s = GameState::new(0);
        let quiz = roll_quiz(&mut s, &config).unwrap();
        let EventPayload::Quiz { prompt, answer } = quiz.payload else {
            panic!("expected quiz payload");
        };
        let sum: i64 = prompt.split(" + ").map(|n| n.parse::<i64>().unwrap()).sum();
        assert_eq!(sum, answer);
    }

    #[test]
    fn quiz_chance_zero_never_spawns_but_advances_rng() {
        let mut config = EngineConfig::default();
        config.quiz_chance = 0.0;
        let mut s = GameState::new(0);
        let seed = s.rng_state;
        assert!(roll_quiz(&mut s, &config).is_none());
        assert_ne!(s.rng_state, seed);
    }
}

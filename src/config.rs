//! Engine tuning constants.
//!
//! Every knob has a default; a JSON document may override any subset of
//! them (`#[serde(default)]`), so older config files keep working when new
//! fields are added.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One hour in milliseconds.
pub const HOUR_MS: u64 = 60 * 60 * 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base resolution the host driver is expected to tick at.
    pub base_resolution_ms: u64,

    // Subsystem periods
    pub production_period_ms: u64,
    pub combo_check_period_ms: u64,
    pub milestone_check_period_ms: u64,
    pub achievement_check_period_ms: u64,
    pub boss_period_ms: u64,
    pub quiz_period_ms: u64,
    pub autosave_period_ms: u64,

    // Combo
    pub combo_window_ms: u64,
    /// Ascending streak lengths that pay a one-shot reward.
    pub combo_thresholds: Vec<u32>,

    /// Ascending lifetime-score thresholds that queue a milestone event.
    pub milestone_thresholds: Vec<u64>,
    /// Fraction of the threshold paid out when a milestone is celebrated.
    pub milestone_reward_ratio: f64,

    // Offline reconciliation
    pub offline_cap_ms: u64,
    pub offline_efficiency: f64,

    // Prestige
    /// Lifetime score needed to prestige; also the divisor for points earned.
    pub prestige_threshold: f64,
    pub prestige_bonus_per_level: f64,
    pub prestige_bonus_per_point: f64,

    // Spawners
    /// Probability (0..=1) that a quiz spawns when its period elapses.
    pub quiz_chance: f64,
    /// Seconds of production a defeated boss pays out.
    pub boss_reward_seconds: f64,

    /// Key used in the persistent store.
    pub storage_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_resolution_ms: 100,
            production_period_ms: 100,
            combo_check_period_ms: 100,
            milestone_check_period_ms: 1_000,
            achievement_check_period_ms: 1_000,
            boss_period_ms: 5 * 60 * 1000,
            quiz_period_ms: 3 * 60 * 1000,
            autosave_period_ms: 30_000,
            combo_window_ms: 1_500,
            combo_thresholds: vec![10, 25, 50, 100],
            milestone_thresholds: vec![
                1_000,
                10_000,
                100_000,
                1_000_000,
                10_000_000,
                100_000_000,
                1_000_000_000,
                10_000_000_000,
            ],
            milestone_reward_ratio: 0.1,
            offline_cap_ms: 8 * HOUR_MS,
            offline_efficiency: 0.5,
            prestige_threshold: 1e6,
            prestige_bonus_per_level: 0.1,
            prestige_bonus_per_point: 0.01,
            quiz_chance: 0.5,
            boss_reward_seconds: 60.0,
            storage_key: "idle_sim_save".into(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON override document on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("base_resolution_ms", self.base_resolution_ms),
            ("production_period_ms", self.production_period_ms),
            ("combo_check_period_ms", self.combo_check_period_ms),
            ("milestone_check_period_ms", self.milestone_check_period_ms),
            ("achievement_check_period_ms", self.achievement_check_period_ms),
            ("boss_period_ms", self.boss_period_ms),
            ("quiz_period_ms", self.quiz_period_ms),
            ("autosave_period_ms", self.autosave_period_ms),
            ("combo_window_ms", self.combo_window_ms),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if !is_strictly_ascending(&self.combo_thresholds) {
            return Err(ConfigError::Invalid {
                field: "combo_thresholds",
                reason: "must be strictly ascending".into(),
            });
        }
        if !is_strictly_ascending(&self.milestone_thresholds)
            || self.milestone_thresholds.first() == Some(&0)
        {
            return Err(ConfigError::Invalid {
                field: "milestone_thresholds",
                reason: "must be positive and strictly ascending".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.offline_efficiency) {
            return Err(ConfigError::Invalid {
                field: "offline_efficiency",
                reason: format!("{} is outside 0..=1", self.offline_efficiency),
            });
        }
        if !(0.0..=1.0).contains(&self.quiz_chance) {
            return Err(ConfigError::Invalid {
                field: "quiz_chance",
                reason: format!("{} is outside 0..=1", self.quiz_chance),
            });
        }
        if !(self.prestige_threshold.is_finite() && self.prestige_threshold > 0.0) {
            return Err(ConfigError::Invalid {
                field: "prestige_threshold",
                reason: "must be positive".into(),
            });
        }
        if self.storage_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn is_strictly_ascending<T: PartialOrd>(values: &[T]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = EngineConfig::from_json(r#"{ "autosave_period_ms": 5000 }"#).unwrap();
        assert_eq!(config.autosave_period_ms, 5000);
        assert_eq!(config.offline_cap_ms, 8 * HOUR_MS);
        assert_eq!(config.combo_thresholds, vec![10, 25, 50, 100]);
    }

    #[test]
    fn zero_period_rejected() {
        let err = EngineConfig::from_json(r#"{ "production_period_ms": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "production_period_ms", .. }
        ));
    }

    #[test]
    fn unsorted_thresholds_rejected() {
        let err = EngineConfig::from_json(r#"{ "combo_thresholds": [25, 10] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "combo_thresholds", .. }));
    }

    #[test]
    fn efficiency_out_of_range_rejected() {
        assert!(EngineConfig::from_json(r#"{ "offline_efficiency": 1.5 }"#).is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}

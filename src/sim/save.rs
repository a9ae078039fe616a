//! Save envelope and offline reconciliation.
//!
//! ## Versioning
//!
//! - `SAVE_VERSION`: current envelope format. Bump when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: oldest format that can still be read. Only
//!   bump it for breaking changes (a field changing meaning or being removed).
//!
//! Envelopes from `MIN_COMPATIBLE_VERSION..=SAVE_VERSION` load with missing
//! fields filled from fresh-state defaults; unknown fields are ignored.
//!
//! History:
//! - v1: upgrade ownership stored as `count`; milestones as `milestones`.
//!   No achievements, skins or prestige points.
//! - v2: `ownedCount`, achievements, skins, prestige points.
//! - v3: `selectedSkin`, `tutorialDone`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SaveError;
use crate::time::Millis;

use super::catalog::Catalog;
use super::state::GameState;

pub const SAVE_VERSION: u32 = 3;

pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Persisted form of [`GameState`] plus catalog ownership.
/// Active effects are deliberately not part of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaveEnvelope {
    pub version: u32,
    /// Epoch ms at which the envelope was written.
    pub timestamp: Millis,
    pub score: f64,
    pub total_score: f64,
    pub click_power: f64,
    pub production: f64,
    pub prestige_level: u32,
    pub prestige_points: u64,
    #[serde(alias = "milestones")]
    pub triggered_milestones: Vec<u64>,
    pub combo_count: u32,
    pub combo_deadline: Millis,
    pub session_start: Option<Millis>,
    pub total_clicks: u64,
    pub rng_state: u32,
    pub selected_skin: Option<String>,
    pub tutorial_done: bool,
    /// Production upgrades (`ownedCount`) and click upgrades (`purchased`).
    pub upgrades: Vec<OwnershipSave>,
    pub achievements: Vec<AchievementSave>,
    pub skins: Vec<SkinSave>,
}

/// Missing fields take fresh-state values.
impl Default for SaveEnvelope {
    fn default() -> Self {
        let fresh = GameState::new(0);
        Self {
            version: 0,
            timestamp: 0,
            score: fresh.score,
            total_score: fresh.total_score,
            click_power: fresh.click_power,
            production: fresh.production,
            prestige_level: fresh.prestige_level,
            prestige_points: fresh.prestige_points,
            triggered_milestones: Vec::new(),
            combo_count: 0,
            combo_deadline: 0,
            session_start: None,
            total_clicks: 0,
            rng_state: fresh.rng_state,
            selected_skin: None,
            tutorial_done: false,
            upgrades: Vec::new(),
            achievements: Vec::new(),
            skins: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipSave {
    pub id: String,
    #[serde(default, alias = "count", skip_serializing_if = "Option::is_none")]
    pub owned_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased: Option<bool>,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementSave {
    pub id: String,
    #[serde(default)]
    pub unlocked: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkinSave {
    pub id: String,
    #[serde(default)]
    pub owned: bool,
}

/// Snapshot the current state for persistence, stamped with `now`.
pub fn extract(state: &GameState, catalog: &Catalog, now: Millis) -> SaveEnvelope {
    let upgrades = catalog
        .upgrades
        .iter()
        .map(|u| OwnershipSave {
            id: u.id.clone(),
            owned_count: Some(u.owned_count),
            purchased: None,
            unlocked: u.unlocked,
        })
        .chain(catalog.click_upgrades.iter().map(|u| OwnershipSave {
            id: u.id.clone(),
            owned_count: None,
            purchased: Some(u.purchased),
            unlocked: u.unlocked,
        }))
        .collect();

    SaveEnvelope {
        version: SAVE_VERSION,
        timestamp: now,
        score: state.score,
        total_score: state.total_score,
        click_power: state.click_power,
        production: state.production,
        prestige_level: state.prestige_level,
        prestige_points: state.prestige_points,
        triggered_milestones: state.triggered_milestones.iter().copied().collect(),
        combo_count: state.combo_count,
        combo_deadline: state.combo_deadline,
        session_start: Some(state.session_start),
        total_clicks: state.total_clicks,
        rng_state: state.rng_state,
        selected_skin: state.selected_skin.clone(),
        tutorial_done: state.tutorial_done,
        upgrades,
        achievements: catalog
            .achievements
            .iter()
            .map(|a| AchievementSave {
                id: a.id.clone(),
                unlocked: a.unlocked,
            })
            .collect(),
        skins: catalog
            .skins
            .iter()
            .map(|s| SkinSave {
                id: s.id.clone(),
                owned: s.owned,
            })
            .collect(),
    }
}

pub fn encode(envelope: &SaveEnvelope) -> Result<String, SaveError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Parse and validate. Either the whole envelope is usable or an error is
/// returned; callers never see a partially valid envelope.
pub fn decode(json: &str) -> Result<SaveEnvelope, SaveError> {
    let envelope: SaveEnvelope =
        serde_json::from_str(json).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    envelope.validate()?;
    if envelope.version < SAVE_VERSION {
        info!(
            saved = envelope.version,
            current = SAVE_VERSION,
            "migrating save from older version"
        );
    }
    Ok(envelope)
}

impl SaveEnvelope {
    pub fn validate(&self) -> Result<(), SaveError> {
        if !(MIN_COMPATIBLE_VERSION..=SAVE_VERSION).contains(&self.version) {
            return Err(SaveError::UnsupportedVersion {
                found: self.version,
                min: MIN_COMPATIBLE_VERSION,
                max: SAVE_VERSION,
            });
        }
        let numbers = [
            ("score", self.score),
            ("totalScore", self.total_score),
            ("clickPower", self.click_power),
            ("production", self.production),
        ];
        for (name, value) in numbers {
            if !value.is_finite() || value < 0.0 {
                return Err(SaveError::Corrupt(format!("{name} is {value}")));
            }
        }
        if self.upgrades.iter().any(|u| u.id.is_empty()) {
            return Err(SaveError::Corrupt("upgrade entry without id".into()));
        }
        Ok(())
    }

    /// Build a fresh state and catalog from this envelope.
    ///
    /// `template` supplies catalog definitions; its ownership is discarded and
    /// replaced by the envelope's. Entries the catalog no longer has are
    /// ignored; catalog entries missing from the envelope stay unowned.
    pub fn hydrate(&self, template: &Catalog, now: Millis) -> (GameState, Catalog) {
        let mut state = GameState::new(self.session_start.unwrap_or(now));
        state.score = self.score;
        state.total_score = self.total_score;
        state.click_power = self.click_power;
        state.production = self.production;
        state.prestige_level = self.prestige_level;
        state.prestige_points = self.prestige_points;
        state.triggered_milestones = self.triggered_milestones.iter().copied().collect();
        state.combo_count = self.combo_count;
        state.combo_deadline = self.combo_deadline;
        state.last_save_timestamp = Some(self.timestamp);
        state.total_clicks = self.total_clicks;
        state.rng_state = self.rng_state;
        state.selected_skin = self.selected_skin.clone();
        state.tutorial_done = self.tutorial_done;

        let mut catalog = template.clone();
        catalog.reset_ownership(false);

        for saved in &self.upgrades {
            if let Some(count) = saved.owned_count {
                if let Some(u) = catalog.upgrades.iter_mut().find(|u| u.id == saved.id) {
                    u.owned_count = count;
                    u.unlocked = saved.unlocked || count > 0;
                }
            }
            if let Some(purchased) = saved.purchased {
                if let Some(u) = catalog.click_upgrades.iter_mut().find(|u| u.id == saved.id) {
                    u.purchased = purchased;
                    u.unlocked = saved.unlocked || purchased;
                }
            }
        }
        for saved in &self.achievements {
            if let Some(a) = catalog.achievements.iter_mut().find(|a| a.id == saved.id) {
                a.unlocked = saved.unlocked;
            }
        }
        for saved in &self.skins {
            if let Some(s) = catalog.skins.iter_mut().find(|s| s.id == saved.id) {
                s.owned = saved.owned;
            }
        }
        // A selected skin that is no longer owned (or no longer exists) is dropped.
        if let Some(id) = &state.selected_skin {
            if !catalog.skin(id).is_some_and(|s| s.owned) {
                state.selected_skin = None;
            }
        }

        (state, catalog)
    }
}

/// What offline reconciliation credited.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OfflineReport {
    /// Real time since the save.
    pub elapsed_ms: Millis,
    /// Portion of `elapsed_ms` that was credited (after the cap).
    pub credited_ms: Millis,
    pub gain: f64,
}

/// `floor(pps × min(max(0, now − saved_at), cap) × efficiency)`, in seconds.
pub fn offline_gain(
    production_per_second: f64,
    saved_at: Millis,
    now: Millis,
    cap_ms: Millis,
    efficiency: f64,
) -> OfflineReport {
    let elapsed_ms = now.saturating_sub(saved_at);
    let credited_ms = elapsed_ms.min(cap_ms);
    let gain = (production_per_second * (credited_ms as f64 / 1000.0) * efficiency).floor();
    OfflineReport {
        elapsed_ms,
        credited_ms,
        gain: if gain.is_finite() && gain > 0.0 { gain } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HOUR_MS;

    fn populated() -> (GameState, Catalog) {
        let mut state = GameState::new(5_000);
        state.score = 12_345.6;
        state.total_score = 99_999.0;
        state.click_power = 3.0;
        state.production = 2.5;
        state.prestige_level = 2;
        state.prestige_points = 17;
        state.triggered_milestones.extend([1_000, 10_000]);
        state.combo_count = 7;
        state.combo_deadline = 9_000;
        state.last_save_timestamp = Some(8_000);
        state.total_clicks = 42;
        state.rng_state = 12_345;
        state.tutorial_done = true;

        let mut catalog = Catalog::builtin();
        catalog.refresh_unlocks(state.total_score);
        catalog.upgrades[0].owned_count = 10;
        catalog.upgrades[2].owned_count = 5;
        catalog.click_upgrades[0].purchased = true;
        catalog.achievements[0].unlocked = true;
        catalog.skins[1].owned = true;
        state.selected_skin = Some("neon".into());
        (state, catalog)
    }

    #[test]
    fn extract_and_hydrate_roundtrip() {
        let (original, catalog) = populated();
        let env = extract(&original, &catalog, 8_000);
        let json = encode(&env).unwrap();
        let loaded = decode(&json).unwrap();
        assert_eq!(loaded.version, SAVE_VERSION);

        let (state, restored) = loaded.hydrate(&Catalog::builtin(), 10_000);
        assert_eq!(state, original);
        assert_eq!(restored, catalog);
    }

    #[test]
    fn active_effects_not_persisted() {
        let (mut state, catalog) = populated();
        crate::sim::effects::add_effect(
            &mut state,
            crate::sim::state::EffectKind::ProductionMultiplier,
            2.0,
            60_000,
            0,
        )
        .unwrap();
        let json = encode(&extract(&state, &catalog, 8_000)).unwrap();
        assert!(!json.contains("activeEffects"));
        let (restored, _) = decode(&json).unwrap().hydrate(&catalog, 8_000);
        assert!(restored.active_effects.is_empty());
    }

    #[test]
    fn envelope_uses_camel_case_shape() {
        let (state, catalog) = populated();
        let json = encode(&extract(&state, &catalog, 1)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 3);
        assert_eq!(value["totalScore"], 99_999.0);
        assert_eq!(value["upgrades"][0]["ownedCount"], 10);
        assert!(value["upgrades"][0].get("purchased").is_none());
        let click = value["upgrades"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["id"] == "reinforced_finger")
            .unwrap();
        assert_eq!(click["purchased"], true);
        assert_eq!(value["skins"][1]["owned"], true);
    }

    /// v1 envelope: `count` instead of `ownedCount`, `milestones` instead of
    /// `triggeredMilestones`, no achievements/skins/prestige points.
    #[test]
    fn migrate_v1_preserves_compatible_fields() {
        let old_json = r#"{
            "version": 1,
            "timestamp": 1000,
            "score": 5000.0,
            "totalScore": 10000.0,
            "clickPower": 2.0,
            "prestigeLevel": 1,
            "milestones": [1000],
            "totalClicks": 200,
            "upgrades": [
                { "id": "cursor", "count": 10, "unlocked": true },
                { "id": "intern", "count": 3 }
            ]
        }"#;
        let env = decode(old_json).unwrap();
        assert_eq!(env.version, 1);
        let (state, catalog) = env.hydrate(&Catalog::builtin(), 2_000);

        assert!((state.score - 5000.0).abs() < 1e-9);
        assert!((state.total_score - 10000.0).abs() < 1e-9);
        assert!((state.click_power - 2.0).abs() < 1e-9);
        assert_eq!(state.prestige_level, 1);
        assert!(state.triggered_milestones.contains(&1000));
        assert_eq!(state.total_clicks, 200);
        assert_eq!(catalog.upgrade("cursor").unwrap().owned_count, 10);
        assert_eq!(catalog.upgrade("intern").unwrap().owned_count, 3);
        // owned implies unlocked even if the old save omitted the flag
        assert!(catalog.upgrade("intern").unwrap().unlocked);

        // Fields the old save does not have take fresh values.
        assert_eq!(state.prestige_points, 0);
        assert_eq!(state.rng_state, GameState::new(0).rng_state);
        assert!(!state.tutorial_done);
        assert_eq!(state.session_start, 2_000);
        assert!(catalog.achievements.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn missing_click_power_defaults_to_fresh_value() {
        let env = decode(r#"{ "version": 2, "score": 1.0 }"#).unwrap();
        assert!((env.click_power - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{
            "version": 3,
            "score": 100.0,
            "totalScore": 200.0,
            "futureUnknownField": "should be ignored",
            "upgrades": [ { "id": "cursor", "ownedCount": 1, "sparkle": true } ]
        }"#;
        let env = decode(json).unwrap();
        assert!((env.score - 100.0).abs() < 1e-9);
        assert_eq!(env.upgrades[0].owned_count, Some(1));
    }

    #[test]
    fn unknown_catalog_ids_are_skipped() {
        let json = r#"{ "version": 3, "upgrades": [ { "id": "retired_thing", "ownedCount": 99 } ] }"#;
        let (_, catalog) = decode(json).unwrap().hydrate(&Catalog::builtin(), 0);
        assert!(catalog.upgrades.iter().all(|u| u.owned_count == 0));
    }

    #[test]
    fn future_and_ancient_versions_rejected() {
        assert!(matches!(
            decode(r#"{ "version": 99 }"#),
            Err(SaveError::UnsupportedVersion { found: 99, .. })
        ));
        assert!(matches!(
            decode(r#"{ "score": 5.0 }"#),
            Err(SaveError::UnsupportedVersion { found: 0, .. })
        ));
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(decode("not json"), Err(SaveError::Corrupt(_))));
        assert!(matches!(decode(r#"{ "version": "three" }"#), Err(SaveError::Corrupt(_))));
        assert!(matches!(
            decode(r#"{ "version": 3, "score": -10.0 }"#),
            Err(SaveError::Corrupt(_))
        ));
    }

    #[test]
    fn selected_skin_dropped_if_not_owned() {
        let json = r#"{ "version": 3, "selectedSkin": "golden", "skins": [ { "id": "golden", "owned": false } ] }"#;
        let (state, _) = decode(json).unwrap().hydrate(&Catalog::builtin(), 0);
        assert!(state.selected_skin.is_none());
    }

    #[test]
    fn offline_gain_one_hour() {
        let r = offline_gain(100.0, 0, 3_600_000, 8 * HOUR_MS, 0.5);
        assert_eq!(r.gain, 180_000.0);
        assert_eq!(r.credited_ms, 3_600_000);
    }

    #[test]
    fn offline_gain_capped_at_eight_hours() {
        let r = offline_gain(100.0, 0, 10 * HOUR_MS, 8 * HOUR_MS, 0.5);
        assert_eq!(r.gain, 1_440_000.0);
        assert_eq!(r.elapsed_ms, 10 * HOUR_MS);
        assert_eq!(r.credited_ms, 8 * HOUR_MS);
    }

    #[test]
    fn offline_gain_clock_skew_is_zero() {
        let r = offline_gain(100.0, 10_000, 5_000, 8 * HOUR_MS, 0.5);
        assert_eq!(r.elapsed_ms, 0);
        assert_eq!(r.gain, 0.0);
    }

    #[test]
    fn offline_gain_floors() {
        // 0.3/s × 5s × 0.5 = 0.75 → 0
        assert_eq!(offline_gain(0.3, 0, 5_000, 8 * HOUR_MS, 0.5).gain, 0.0);
        // 3/s × 5s × 0.5 = 7.5 → 7
        assert_eq!(offline_gain(3.0, 0, 5_000, 8 * HOUR_MS, 0.5).gain, 7.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::HOUR_MS;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_offline_gain_bounded_by_cap(
            pps in 0.0f64..1e9,
            saved in 0u64..1_000_000_000,
            gap in 0u64..(100 * HOUR_MS),
        ) {
            let r = offline_gain(pps, saved, saved + gap, 8 * HOUR_MS, 0.5);
            let max = (pps * (8 * HOUR_MS) as f64 / 1000.0 * 0.5).floor();
            prop_assert!(r.gain >= 0.0);
            prop_assert!(r.gain <= max);
            prop_assert!(r.credited_ms <= 8 * HOUR_MS);
            prop_assert_eq!(r.gain, r.gain.floor());
        }

        #[test]
        fn prop_offline_gain_monotonic_in_elapsed(
            pps in 0.0f64..1e6,
            a in 0u64..(10 * HOUR_MS),
            b in 0u64..(10 * HOUR_MS),
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let g_lo = offline_gain(pps, 0, lo, 8 * HOUR_MS, 0.5).gain;
            let g_hi = offline_gain(pps, 0, hi, 8 * HOUR_MS, 0.5).gain;
            prop_assert!(g_lo <= g_hi);
        }
    }
}

//! Click streaks.
//!
//! Idle (count 0) ↔ Active(count, deadline). Deadlines are absolute
//! timestamps compared against "now"; nothing counts down.

use crate::time::Millis;

use super::state::GameState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboPhase {
    Idle,
    Active { count: u32, deadline: Millis },
}

/// One-shot payout for reaching a streak threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComboReward {
    pub threshold: u32,
    pub bonus: f64,
}

pub fn phase(state: &GameState) -> ComboPhase {
    if state.combo_count == 0 {
        ComboPhase::Idle
    } else {
        ComboPhase::Active {
            count: state.combo_count,
            deadline: state.combo_deadline,
        }
    }
}

/// Highest threshold `t` with `before < t <= after`.
pub fn crossed_threshold(thresholds: &[u32], before: u32, after: u32) -> Option<u32> {
    thresholds
        .iter()
        .copied()
        .filter(|t| before < *t && *t <= after)
        .max()
}

/// Apply a qualifying click at `now`. The reward (if any) is
/// `click_power × threshold`; crediting it is the caller's job.
pub fn register_click(
    state: &mut GameState,
    now: Millis,
    window_ms: Millis,
    thresholds: &[u32],
    click_power: f64,
) -> Option<ComboReward> {
    let before = if state.combo_count > 0 && now <= state.combo_deadline {
        state.combo_count
    } else {
        0
    };
    let after = before.saturating_add(1);
    state.combo_count = after;
    state.combo_deadline = now.saturating_add(window_ms);

    crossed_threshold(thresholds, before, after).map(|threshold| ComboReward {
        threshold,
        bonus: click_power * threshold as f64,
    })
}

/// Drop back to Idle if the deadline has passed. Returns true on reset.
pub fn check_timeout(state: &mut GameState, now: Millis) -> bool {
    if state.combo_count > 0 && now > state.combo_deadline {
        state.combo_count = 0;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: &[u32] = &[10, 25, 50, 100];

    #[test]
    fn first_click_starts_combo() {
        let mut s = GameState::new(0);
        assert_eq!(phase(&s), ComboPhase::Idle);
        assert!(register_click(&mut s, 1_000, 1_500, T, 1.0).is_none());
        assert_eq!(
            phase(&s),
            ComboPhase::Active {
                count: 1,
                deadline: 2_500
            }
        );
    }

    #[test]
    fn click_within_window_extends() {
        let mut s = GameState::new(0);
        register_click(&mut s, 0, 1_000, T, 1.0);
        register_click(&mut s, 1_000, 1_000, T, 1.0); // exactly at deadline still counts
        assert_eq!(s.combo_count, 2);
        assert_eq!(s.combo_deadline, 2_000);
    }

    #[test]
    fn click_after_deadline_restarts_at_one() {
        let mut s = GameState::new(0);
        for i in 0..5 {
            register_click(&mut s, i * 100, 1_000, T, 1.0);
        }
        assert_eq!(s.combo_count, 5);
        register_click(&mut s, 10_000, 1_000, T, 1.0);
        assert_eq!(s.combo_count, 1);
        assert_eq!(s.combo_deadline, 11_000);
    }

    #[test]
    fn nine_to_ten_fires_once() {
        let mut s = GameState::new(0);
        s.combo_count = 9;
        s.combo_deadline = 1_000;
        let reward = register_click(&mut s, 500, 1_000, T, 2.0).unwrap();
        assert_eq!(reward.threshold, 10);
        assert!((reward.bonus - 20.0).abs() < 1e-9);

        // Staying at 10 (no increment) crosses nothing.
        assert_eq!(crossed_threshold(T, 10, 10), None);
        // Next click 10 → 11 crosses nothing either.
        assert!(register_click(&mut s, 600, 1_000, T, 2.0).is_none());
    }

    #[test]
    fn skipping_thresholds_fires_only_highest() {
        assert_eq!(crossed_threshold(T, 9, 60), Some(50));
        assert_eq!(crossed_threshold(T, 0, 1_000), Some(100));
        assert_eq!(crossed_threshold(T, 100, 1_000), None);
    }

    #[test]
    fn timeout_resets_to_idle() {
        let mut s = GameState::new(0);
        register_click(&mut s, 0, 1_000, T, 1.0);
        assert!(!check_timeout(&mut s, 1_000));
        assert_eq!(s.combo_count, 1);
        assert!(check_timeout(&mut s, 1_001));
        assert_eq!(phase(&s), ComboPhase::Idle);
        assert!(!check_timeout(&mut s, 5_000));
    }

    #[test]
    fn full_streak_pays_each_threshold_once() {
        let mut s = GameState::new(0);
        let mut paid = Vec::new();
        for i in 0..120u64 {
            if let Some(r) = register_click(&mut s, i * 10, 1_000, T, 1.0) {
                paid.push(r.threshold);
            }
        }
        assert_eq!(paid, vec![10, 25, 50, 100]);
    }
}

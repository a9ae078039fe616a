//! Capability interface the presentation layer implements.

use super::catalog::Achievement;
use super::combo::ComboReward;
use super::events::{EventOutcome, PendingEvent};
use super::save::OfflineReport;

/// Notifications from the core. Every method is required; a host that does
/// not care about one implements it as a no-op.
pub trait Presenter {
    /// `event` just became the active event and should be shown.
    fn event_activated(&mut self, event: &PendingEvent);

    /// The active event was resolved. Its reward has already been applied
    /// when `outcome` is [`EventOutcome::Success`].
    fn event_completed(&mut self, event: &PendingEvent, outcome: EventOutcome);

    fn combo_reward(&mut self, reward: &ComboReward);

    /// Called after a load or visibility resume credited offline production.
    fn offline_gains(&mut self, report: &OfflineReport);

    fn achievement_unlocked(&mut self, achievement: &Achievement);
}

/// Presenter for headless use. Ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn event_activated(&mut self, _event: &PendingEvent) {}

    fn event_completed(&mut self, _event: &PendingEvent, _outcome: EventOutcome) {}

    fn combo_reward(&mut self, _reward: &ComboReward) {}

    fn offline_gains(&mut self, _report: &OfflineReport) {}

    fn achievement_unlocked(&mut self, _achievement: &Achievement) {}
}

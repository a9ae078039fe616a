//! The engine: one owned game state plus the scheduler that drives it.
//!
//! [`Engine`] splits into a `Core` (everything the subsystems mutate) and a
//! `TickScheduler<Core>`, so scheduler callbacks receive `&mut Core` while the
//! scheduler itself is borrowed separately. All mutation happens on the
//! caller's thread; nothing here locks.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{
    CommandError, ConfigError, EffectError, PrestigeError, PurchaseError, SaveError, StorageError,
    SubsystemError,
};
use crate::scheduler::{Due, TickScheduler};
use crate::storage::{KeyValueStore, Persistence};
use crate::time::{Clock, Millis, SystemClock};

use super::catalog::Catalog;
use super::combo::{self, ComboPhase, ComboReward};
use super::effects;
use super::events::{EventKind, EventOutcome, EventQueue, PendingEvent, Reward};
use super::lifecycle::Lifecycle;
use super::presenter::{NullPresenter, Presenter};
use super::production::{self, Production};
use super::save::{self, OfflineReport};
use super::spawners;
use super::state::{Effect, EffectKind, GameState};

/// Names of the built-in subsystems, in the order they run within a tick.
pub mod subsystem {
    pub const PRODUCTION: &str = "production";
    pub const COMBO_TIMEOUT: &str = "combo_timeout";
    pub const MILESTONES: &str = "milestones";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const BOSS: &str = "boss";
    pub const QUIZ: &str = "quiz";
    pub const AUTOSAVE: &str = "autosave";
}

/// Result of [`Engine::save`]. Saving never fails outward.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    /// A reset is in progress; nothing was written.
    Suppressed,
    /// No persistent store; progress lives in memory only.
    InMemoryOnly,
    /// The store rejected the write. State is unchanged.
    Failed(SaveError),
}

/// Result of [`Engine::load`].
#[derive(Debug)]
pub enum LoadOutcome {
    /// Nothing stored (or no store); the current state is kept.
    Fresh,
    Loaded(OfflineReport),
    /// The stored envelope was unusable and has been removed.
    Corrupt(SaveError),
}

/// What a click produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickOutcome {
    pub gained: f64,
    pub combo: Option<ComboReward>,
}

pub struct EngineBuilder {
    config: EngineConfig,
    catalog: Catalog,
    clock: Box<dyn Clock>,
    store: Option<Box<dyn KeyValueStore>>,
    presenter: Box<dyn Presenter>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: Catalog::builtin(),
            clock: Box::new(SystemClock),
            store: None,
            presenter: Box::new(NullPresenter),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Without a store the engine runs in memory only.
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;
        let now = self.clock.now_ms();
        let catalog = fresh_catalog(&self.catalog);
        let mut core = Core {
            state: GameState::new(now),
            catalog,
            template: self.catalog,
            production: Production::default(),
            events: EventQueue::new(),
            lifecycle: Lifecycle::Fresh,
            persistence: Persistence::new(self.store),
            clock: self.clock,
            presenter: self.presenter,
            hidden_at: None,
            config: self.config,
        };
        core.refresh_production();
        let scheduler = register_subsystems(&core.config);
        Ok(Engine { core, scheduler })
    }
}

fn register_subsystems(config: &EngineConfig) -> TickScheduler<Core> {
    let mut s = TickScheduler::new();
    s.register(subsystem::PRODUCTION, config.production_period_ms, |core: &mut Core, due| {
        core.accrue(due);
        Ok(())
    });
    s.register(subsystem::COMBO_TIMEOUT, config.combo_check_period_ms, |core: &mut Core, _| {
        let now = core.now();
        if combo::check_timeout(&mut core.state, now) {
            debug!("combo expired");
        }
        Ok(())
    });
    s.register(subsystem::MILESTONES, config.milestone_check_period_ms, |core: &mut Core, _| {
        core.check_milestones();
        Ok(())
    });
    s.register(subsystem::ACHIEVEMENTS, config.achievement_check_period_ms, |core: &mut Core, _| {
        core.check_achievements();
        Ok(())
    });
    s.register(subsystem::BOSS, config.boss_period_ms, |core: &mut Core, _| {
        core.spawn_boss();
        Ok(())
    });
    s.register(subsystem::QUIZ, config.quiz_period_ms, |core: &mut Core, _| {
        core.spawn_quiz();
        Ok(())
    });
    s.register(subsystem::AUTOSAVE, config.autosave_period_ms, |core: &mut Core, _| {
        match core.save() {
            SaveOutcome::Failed(e) => Err(SubsystemError::new(subsystem::AUTOSAVE, e.to_string())),
            _ => Ok(()),
        }
    });
    s
}

/// Catalog definitions with all ownership cleared and starting unlocks applied.
fn fresh_catalog(template: &Catalog) -> Catalog {
    let mut catalog = template.clone();
    catalog.reset_ownership(false);
    catalog.refresh_unlocks(0.0);
    catalog
}

struct Core {
    config: EngineConfig,
    /// Definitions the live catalog is rebuilt from on reset and load.
    template: Catalog,
    catalog: Catalog,
    state: GameState,
    /// Last computed production; refreshed whenever its inputs change.
    production: Production,
    events: EventQueue,
    lifecycle: Lifecycle,
    persistence: Persistence,
    clock: Box<dyn Clock>,
    presenter: Box<dyn Presenter>,
    /// When the host was last hidden; offline gains are reconciled from here.
    hidden_at: Option<Millis>,
}

impl Core {
    fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// Pure recompute for callers that must not prune.
    fn refresh_production(&mut self) {
        self.production = production::compute(&self.state, &self.catalog, &self.config, self.now());
    }

    fn recompute_production(&mut self) -> Production {
        let now = self.now();
        let (p, pruned) = production::recompute(&mut self.state, &self.catalog, &self.config, now);
        if pruned > 0 {
            debug!(pruned, "expired effects removed");
        }
        self.production = p;
        p
    }

    fn accrue(&mut self, due: Due) {
        let p = self.recompute_production();
        self.state.credit(p.per_second * due.elapsed_ms as f64 / 1000.0);
        self.catalog.refresh_unlocks(self.state.total_score);
    }

    fn credit_offline(&mut self, since: Millis, now: Millis) -> OfflineReport {
        let report = save::offline_gain(
            self.production.per_second,
            since,
            now,
            self.config.offline_cap_ms,
            self.config.offline_efficiency,
        );
        if report.gain > 0.0 {
            self.state.credit(report.gain);
            self.catalog.refresh_unlocks(self.state.total_score);
            info!(
                elapsed_ms = report.elapsed_ms,
                credited_ms = report.credited_ms,
                gain = report.gain,
                "offline production credited"
            );
            self.presenter.offline_gains(&report);
        }
        report
    }

    // ── Events ──────────────────────────────────────────────────

    fn queue_event(&mut self, event: PendingEvent) {
        debug!(kind = ?event.kind, queued = self.events.queued_len(), "event queued");
        self.events.push(event);
    }

    fn process_event_queue(&mut self) -> bool {
        match self.events.process() {
            Some(event) => {
                debug!(kind = ?event.kind, "event activated");
                self.presenter.event_activated(event);
                true
            }
            None => false,
        }
    }

    fn on_event_complete(&mut self, outcome: EventOutcome) -> Option<PendingEvent> {
        let event = self.events.complete()?;
        if outcome == EventOutcome::Success {
            self.apply_reward(&event.reward);
        }
        if event.kind == EventKind::Tutorial && outcome != EventOutcome::Failure {
            self.state.tutorial_done = true;
        }
        debug!(kind = ?event.kind, ?outcome, "event completed");
        self.presenter.event_completed(&event, outcome);
        self.process_event_queue();
        Some(event)
    }

    fn apply_reward(&mut self, reward: &Reward) {
        match *reward {
            Reward::None => {}
            Reward::Score(amount) => self.state.credit(amount),
            Reward::Effect {
                kind,
                magnitude,
                duration_ms,
            } => {
                let now = self.now();
                if let Err(e) = effects::add_effect(&mut self.state, kind, magnitude, duration_ms, now) {
                    warn!(error = %e, "event reward effect rejected");
                }
            }
            Reward::PrestigePoints(points) => {
                self.state.prestige_points = self.state.prestige_points.saturating_add(points);
            }
        }
        self.refresh_production();
    }

    fn queue_tutorial_if_needed(&mut self) {
        if !self.state.tutorial_done && !self.events.contains_kind(EventKind::Tutorial) {
            self.queue_event(spawners::tutorial_event());
        }
    }

    // ── Scheduled checks ────────────────────────────────────────

    fn check_milestones(&mut self) {
        let Some(threshold) = spawners::next_milestone(&self.state, &self.config.milestone_thresholds)
        else {
            return;
        };
        self.state.triggered_milestones.insert(threshold);
        info!(threshold, "milestone reached");
        self.queue_event(spawners::milestone_event(threshold, &self.config));
        // Persist the trigger before anything else can happen.
        self.save();
        self.process_event_queue();
    }

    fn check_achievements(&mut self) {
        for i in spawners::unlock_achievements(&self.state, &mut self.catalog) {
            let achievement = &self.catalog.achievements[i];
            info!(id = %achievement.id, "achievement unlocked");
            self.presenter.achievement_unlocked(achievement);
        }
    }

    fn spawn_boss(&mut self) {
        if self.events.contains_kind(EventKind::Boss) {
            return;
        }
        if let Some(boss) = spawners::boss_event(&self.production, &self.config) {
            self.queue_event(boss);
            self.process_event_queue();
        }
    }

    fn spawn_quiz(&mut self) {
        if self.events.contains_kind(EventKind::Quiz) {
            return;
        }
        if let Some(quiz) = spawners::roll_quiz(&mut self.state, &self.config) {
            self.queue_event(quiz);
            self.process_event_queue();
        }
    }

    // ── Persistence ─────────────────────────────────────────────

    fn save(&mut self) -> SaveOutcome {
        if self.lifecycle.is_resetting() {
            debug!("save suppressed during reset");
            return SaveOutcome::Suppressed;
        }
        if let Err(e) = self.lifecycle.transition(Lifecycle::Saving) {
            warn!(error = %e, "save skipped");
            return SaveOutcome::Suppressed;
        }
        let now = self.now();
        let written = save::encode(&save::extract(&self.state, &self.catalog, now)).and_then(|json| {
            self.persistence
                .set(&self.config.storage_key, &json)
                .map_err(SaveError::from)
        });
        self.lifecycle = Lifecycle::Loaded;

        match written {
            Ok(()) => {
                self.state.last_save_timestamp = Some(now);
                debug!(timestamp = now, "saved");
                SaveOutcome::Saved
            }
            Err(SaveError::Storage(StorageError::Unavailable)) => SaveOutcome::InMemoryOnly,
            Err(e) => SaveOutcome::Failed(e),
        }
    }

    fn load(&mut self) -> LoadOutcome {
        if !self.lifecycle.can_transition(Lifecycle::Loaded) {
            warn!(lifecycle = ?self.lifecycle, "load ignored");
            return LoadOutcome::Fresh;
        }
        let json = match self.persistence.get(&self.config.storage_key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                info!("no save found, starting fresh");
                return LoadOutcome::Fresh;
            }
            Err(_) => return LoadOutcome::Fresh,
        };
        let envelope = match save::decode(&json) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "discarding unreadable save");
                // Already warned by the persistence layer on failure.
                let _ = self.persistence.remove(&self.config.storage_key);
                self.lifecycle = Lifecycle::Resetting;
                self.clear_to_fresh();
                self.lifecycle = Lifecycle::Fresh;
                return LoadOutcome::Corrupt(e);
            }
        };

        let now = self.now();
        let (state, catalog) = envelope.hydrate(&self.template, now);
        self.events.clear();
        self.replace(state, catalog);
        self.lifecycle = Lifecycle::Loaded;
        self.recompute_production();
        info!(version = envelope.version, score = self.state.score, "save loaded");

        LoadOutcome::Loaded(self.credit_offline(envelope.timestamp, now))
    }

    /// Drop every event and swap in a default state and catalog.
    fn clear_to_fresh(&mut self) {
        self.events.clear();
        let catalog = fresh_catalog(&self.template);
        self.replace(GameState::new(self.now()), catalog);
    }

    /// Swap in a new state and catalog as one step.
    fn replace(&mut self, state: GameState, catalog: Catalog) {
        self.state = state;
        self.catalog = catalog;
        self.catalog.refresh_unlocks(self.state.total_score);
        self.hidden_at = None;
        self.refresh_production();
    }

    // ── Purchases ───────────────────────────────────────────────

    fn pay(&mut self, cost: f64) -> Result<(), PurchaseError> {
        if self.state.spend(cost) {
            Ok(())
        } else {
            Err(PurchaseError::InsufficientScore {
                cost,
                available: self.state.score,
            })
        }
    }

    fn purchase_upgrade(&mut self, id: &str) -> Result<f64, PurchaseError> {
        let cost = self.catalog.upgrade_price(id)?;
        self.pay(cost)?;
        if let Some(u) = self.catalog.upgrades.iter_mut().find(|u| u.id == id) {
            u.owned_count = u.owned_count.saturating_add(1);
        }
        self.refresh_production();
        Ok(cost)
    }

    fn purchase_click_upgrade(&mut self, id: &str) -> Result<f64, PurchaseError> {
        let cost = self.catalog.click_upgrade_price(id)?;
        self.pay(cost)?;
        if let Some(u) = self.catalog.click_upgrades.iter_mut().find(|u| u.id == id) {
            u.purchased = true;
        }
        self.refresh_production();
        Ok(cost)
    }

    fn purchase_skin(&mut self, id: &str) -> Result<f64, PurchaseError> {
        let cost = self.catalog.skin_price(id)?;
        self.pay(cost)?;
        if let Some(s) = self.catalog.skins.iter_mut().find(|s| s.id == id) {
            s.owned = true;
        }
        Ok(cost)
    }

    fn select_skin(&mut self, id: Option<&str>) -> Result<(), PurchaseError> {
        if let Some(id) = id {
            let skin = self
                .catalog
                .skin(id)
                .ok_or_else(|| PurchaseError::UnknownItem(id.into()))?;
            if !skin.owned {
                return Err(PurchaseError::Locked(id.into()));
            }
        }
        self.state.selected_skin = id.map(str::to_owned);
        self.refresh_production();
        Ok(())
    }

    fn prestige(&mut self) -> Result<u64, PrestigeError> {
        let threshold = self.config.prestige_threshold;
        let earned = production::prestige_points_for(self.state.total_score, threshold)
            .saturating_sub(self.state.prestige_points);
        if earned == 0 {
            let next = (self.state.prestige_points + 1) as f64;
            return Err(PrestigeError::NotEligible {
                required: threshold * next * next,
                available: self.state.total_score,
            });
        }

        let s = &mut self.state;
        s.prestige_level += 1;
        s.prestige_points += earned;
        s.score = 0.0;
        s.combo_count = 0;
        s.combo_deadline = 0;
        s.active_effects.clear();
        self.catalog.reset_ownership(true);
        self.catalog.refresh_unlocks(self.state.total_score);
        self.refresh_production();
        info!(
            level = self.state.prestige_level,
            earned,
            points = self.state.prestige_points,
            "prestige"
        );
        self.save();
        Ok(earned)
    }

    fn handle_click(&mut self) -> ClickOutcome {
        let now = self.now();
        let click_power = production::compute(&self.state, &self.catalog, &self.config, now).click_power;
        self.state.credit(click_power);
        self.state.total_clicks += 1;

        let combo = combo::register_click(
            &mut self.state,
            now,
            self.config.combo_window_ms,
            &self.config.combo_thresholds,
            click_power,
        );
        if let Some(reward) = &combo {
            self.state.credit(reward.bonus);
            debug!(threshold = reward.threshold, bonus = reward.bonus, "combo reward");
            self.presenter.combo_reward(reward);
        }
        ClickOutcome {
            gained: click_power,
            combo,
        }
    }
}

/// The simulation core. See the module docs.
pub struct Engine {
    core: Core,
    scheduler: TickScheduler<Core>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    // ── Driving ─────────────────────────────────────────────────

    /// Start the scheduler. On the first call after a stop this also queues
    /// the tutorial (if not yet done) and activates the head of the queue.
    /// Returns false if already running.
    pub fn start(&mut self) -> bool {
        if !self.scheduler.start() {
            return false;
        }
        info!(score = self.core.state.score, "engine started");
        self.core.recompute_production();
        self.core.queue_tutorial_if_needed();
        self.core.process_event_queue();
        true
    }

    /// Stop the scheduler, discarding every partial period. Idempotent.
    pub fn stop(&mut self) -> bool {
        let stopped = self.scheduler.stop();
        if stopped {
            info!("engine stopped");
        }
        stopped
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Advance every subsystem by the real elapsed `delta_ms`.
    /// Returns how many subsystem callbacks ran.
    pub fn tick(&mut self, delta_ms: Millis) -> usize {
        self.scheduler.tick(&mut self.core, delta_ms)
    }

    /// Host visibility changed. Hiding saves and stops; showing credits
    /// offline production for the hidden interval and restarts.
    pub fn on_visibility_change(&mut self, visible: bool) {
        if visible {
            if let Some(hidden_at) = self.core.hidden_at.take() {
                let now = self.core.now();
                self.core.recompute_production();
                self.core.credit_offline(hidden_at, now);
            }
            self.start();
        } else {
            if self.core.hidden_at.is_none() {
                self.core.hidden_at = Some(self.core.now());
            }
            self.core.save();
            self.stop();
        }
    }

    // ── Production & effects ────────────────────────────────────

    /// Recompute production, pruning expired effects.
    pub fn recompute_production(&mut self) -> Production {
        self.core.recompute_production()
    }

    pub fn handle_click(&mut self) -> ClickOutcome {
        self.core.handle_click()
    }

    pub fn add_effect(&mut self, kind: EffectKind, magnitude: f64, duration_ms: Millis) -> Result<(), EffectError> {
        let now = self.core.now();
        effects::add_effect(&mut self.core.state, kind, magnitude, duration_ms, now)?;
        self.core.refresh_production();
        Ok(())
    }

    /// Effects that have not expired yet. Does not prune.
    pub fn active_effects(&self) -> impl Iterator<Item = &Effect> {
        effects::active_effects(&self.core.state, self.core.now())
    }

    // ── Events ──────────────────────────────────────────────────

    /// Append an event. It is not activated until [`process_event_queue`](Self::process_event_queue).
    pub fn queue_event(&mut self, event: PendingEvent) {
        self.core.queue_event(event);
    }

    /// Activate the next event if none is active. Returns true if one was.
    pub fn process_event_queue(&mut self) -> bool {
        self.core.process_event_queue()
    }

    /// Resolve the active event and activate the next. No-op (None) when
    /// nothing is active.
    pub fn on_event_complete(&mut self, outcome: EventOutcome) -> Option<PendingEvent> {
        self.core.on_event_complete(outcome)
    }

    pub fn is_event_in_progress(&self) -> bool {
        self.core.events.is_event_in_progress()
    }

    pub fn active_event(&self) -> Option<&PendingEvent> {
        self.core.events.active()
    }

    pub fn queued_events(&self) -> impl Iterator<Item = &PendingEvent> {
        self.core.events.queued()
    }

    // ── Persistence ─────────────────────────────────────────────

    pub fn save(&mut self) -> SaveOutcome {
        self.core.save()
    }

    /// Restore from the store and credit offline production. Events and
    /// partial periods from the replaced game are dropped; an unreadable
    /// save is removed and the game starts over.
    pub fn load(&mut self) -> LoadOutcome {
        let outcome = self.core.load();
        if matches!(outcome, LoadOutcome::Loaded(_) | LoadOutcome::Corrupt(_)) {
            self.scheduler.reset_counters();
            self.resume_tutorial();
        }
        outcome
    }

    /// While running, show the tutorial again if the current game has not
    /// finished it.
    fn resume_tutorial(&mut self) {
        if self.scheduler.is_running() {
            self.core.queue_tutorial_if_needed();
            self.core.process_event_queue();
        }
    }

    /// Clear the store and return to a fresh game. Any active or queued
    /// event is discarded. The in-memory reset always completes; an error
    /// means the store could not be cleared.
    pub fn reset(&mut self) -> Result<(), CommandError> {
        self.core.lifecycle.transition(Lifecycle::Resetting)?;
        self.scheduler.reset_counters();

        let removed = match self.core.persistence.remove(&self.core.config.storage_key) {
            Err(StorageError::Unavailable) => Ok(()),
            other => other,
        };
        self.core.clear_to_fresh();
        self.core.lifecycle.transition(Lifecycle::Fresh)?;
        info!("game reset");

        self.resume_tutorial();
        removed.map_err(|e| CommandError::Save(e.into()))
    }

    /// Current state as envelope JSON.
    pub fn export(&self) -> Result<String, SaveError> {
        save::encode(&save::extract(&self.core.state, &self.core.catalog, self.core.now()))
    }

    /// Replace the game with an exported envelope and persist it. Nothing
    /// changes if the envelope is rejected.
    pub fn import(&mut self, json: &str) -> Result<(), CommandError> {
        let envelope = save::decode(json)?;
        self.core.lifecycle.transition(Lifecycle::Loaded)?;
        let (state, catalog) = envelope.hydrate(&self.core.template, self.core.now());
        self.core.events.clear();
        self.scheduler.reset_counters();
        self.core.replace(state, catalog);
        info!(version = envelope.version, score = self.core.state.score, "save imported");
        self.resume_tutorial();

        match self.core.save() {
            SaveOutcome::Failed(e) => Err(e.into()),
            _ => Ok(()),
        }
    }

    // ── Catalog ─────────────────────────────────────────────────

    /// Buy one unit of a production upgrade. Returns the price paid.
    pub fn purchase_upgrade(&mut self, id: &str) -> Result<f64, PurchaseError> {
        self.core.purchase_upgrade(id)
    }

    pub fn purchase_click_upgrade(&mut self, id: &str) -> Result<f64, PurchaseError> {
        self.core.purchase_click_upgrade(id)
    }

    pub fn purchase_skin(&mut self, id: &str) -> Result<f64, PurchaseError> {
        self.core.purchase_skin(id)
    }

    /// Select an owned skin, or clear the selection with None.
    pub fn select_skin(&mut self, id: Option<&str>) -> Result<(), PurchaseError> {
        self.core.select_skin(id)
    }

    /// Trade the current run for prestige points. Returns points earned.
    pub fn prestige(&mut self) -> Result<u64, PrestigeError> {
        self.core.prestige()
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.core.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.core.catalog
    }

    /// Production as of the last recompute.
    pub fn production(&self) -> Production {
        self.core.production
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.core.lifecycle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    pub fn is_persistent(&self) -> bool {
        self.core.persistence.is_available()
    }

    pub fn score(&self) -> f64 {
        self.core.state.score
    }

    pub fn total_score(&self) -> f64 {
        self.core.state.total_score
    }

    /// Base click power, before upgrades and multipliers.
    pub fn click_power(&self) -> f64 {
        self.core.state.click_power
    }

    pub fn production_per_second(&self) -> f64 {
        self.core.production.per_second
    }

    pub fn effective_click_power(&self) -> f64 {
        self.core.production.click_power
    }

    pub fn prestige_level(&self) -> u32 {
        self.core.state.prestige_level
    }

    pub fn prestige_points(&self) -> u64 {
        self.core.state.prestige_points
    }

    pub fn triggered_milestones(&self) -> &BTreeSet<u64> {
        &self.core.state.triggered_milestones
    }

    pub fn combo(&self) -> ComboPhase {
        combo::phase(&self.core.state)
    }

    pub fn combo_count(&self) -> u32 {
        self.core.state.combo_count
    }

    pub fn combo_deadline(&self) -> Millis {
        self.core.state.combo_deadline
    }

    pub fn last_save_timestamp(&self) -> Option<Millis> {
        self.core.state.last_save_timestamp
    }

    pub fn session_start(&self) -> Millis {
        self.core.state.session_start
    }

    pub fn total_clicks(&self) -> u64 {
        self.core.state.total_clicks
    }

    pub fn selected_skin(&self) -> Option<&str> {
        self.core.state.selected_skin.as_deref()
    }

    pub fn tutorial_done(&self) -> bool {
        self.core.state.tutorial_done
    }

    /// Total periods credited to the named subsystem since build.
    pub fn subsystem_fired(&self, name: &str) -> u64 {
        self.scheduler.id_of(name).map_or(0, |id| self.scheduler.fired(id))
    }

    pub fn subsystem_failures(&self, name: &str) -> u64 {
        self.scheduler.id_of(name).map_or(0, |id| self.scheduler.failures(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::time::ManualClock;

    fn engine(clock: &ManualClock) -> Engine {
        Engine::builder()
            .clock(clock.clone())
            .store(MemoryStore::new())
            .build()
            .unwrap()
    }

    #[test]
    fn save_suppressed_while_resetting() {
        let clock = ManualClock::new(1_000);
        let mut e = engine(&clock);
        e.core.lifecycle = Lifecycle::Resetting;
        assert!(matches!(e.save(), SaveOutcome::Suppressed));
        assert_eq!(e.last_save_timestamp(), None);
        assert_eq!(e.lifecycle(), Lifecycle::Resetting);
    }

    #[test]
    fn autosave_suppressed_while_resetting() {
        let clock = ManualClock::new(0);
        let mut config = EngineConfig::default();
        config.autosave_period_ms = 100;
        let mut e = Engine::builder()
            .config(config)
            .clock(clock.clone())
            .store(MemoryStore::new())
            .build()
            .unwrap();
        e.start();
        e.core.lifecycle = Lifecycle::Resetting;
        clock.advance(100);
        e.tick(100);
        assert_eq!(e.subsystem_fired(subsystem::AUTOSAVE), 1);
        assert_eq!(e.last_save_timestamp(), None);
    }

    #[test]
    fn saving_returns_to_loaded() {
        let clock = ManualClock::new(5);
        let mut e = engine(&clock);
        assert_eq!(e.lifecycle(), Lifecycle::Fresh);
        assert!(matches!(e.save(), SaveOutcome::Saved));
        assert_eq!(e.lifecycle(), Lifecycle::Loaded);
        assert_eq!(e.last_save_timestamp(), Some(5));
    }

    #[test]
    fn no_store_saves_in_memory_only() {
        let clock = ManualClock::new(0);
        let mut e = Engine::builder().clock(clock).build().unwrap();
        assert!(!e.is_persistent());
        assert!(matches!(e.save(), SaveOutcome::InMemoryOnly));
        assert!(matches!(e.load(), LoadOutcome::Fresh));
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let mut config = EngineConfig::default();
        config.production_period_ms = 0;
        assert!(Engine::builder().config(config).build().is_err());
    }

    #[test]
    fn subsystems_registered_in_order() {
        let clock = ManualClock::new(0);
        let e = engine(&clock);
        let order = [
            subsystem::PRODUCTION,
            subsystem::COMBO_TIMEOUT,
            subsystem::MILESTONES,
            subsystem::ACHIEVEMENTS,
            subsystem::BOSS,
            subsystem::QUIZ,
            subsystem::AUTOSAVE,
        ];
        let ids: Vec<_> = order.iter().map(|n| e.scheduler.id_of(n)).collect();
        assert!(ids.iter().all(Option::is_some));
        assert_eq!(e.scheduler.len(), order.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}

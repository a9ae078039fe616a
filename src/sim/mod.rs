//! Game simulation: state, production, combos, events, persistence and the
//! engine that ties them together.

pub mod catalog;
pub mod combo;
pub mod effects;
pub mod engine;
pub mod events;
pub mod lifecycle;
pub mod presenter;
pub mod production;
pub mod save;
pub mod spawners;
pub mod state;

pub use catalog::{Achievement, AchievementCondition, Catalog, ClickUpgrade, Skin, Upgrade};
pub use combo::{ComboPhase, ComboReward};
pub use engine::{subsystem, ClickOutcome, Engine, EngineBuilder, LoadOutcome, SaveOutcome};
pub use events::{EventKind, EventOutcome, EventPayload, PendingEvent, Reward};
pub use lifecycle::Lifecycle;
pub use presenter::{NullPresenter, Presenter};
pub use production::Production;
pub use save::{OfflineReport, SaveEnvelope, MIN_COMPATIBLE_VERSION, SAVE_VERSION};
pub use state::{Effect, EffectKind, GameState};

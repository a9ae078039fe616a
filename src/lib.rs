//! Real-time simulation core of an idle/clicker game.
//!
//! The [`Engine`] owns the game state and a [`TickScheduler`] that drives
//! production, combo timeouts, progression checks, event spawners and
//! autosave at independent rates. The host feeds it elapsed time and user
//! input and renders whatever it reports through a [`Presenter`].
//!
//! ```no_run
//! use idle_sim::{Engine, MemoryStore};
//!
//! let mut engine = Engine::builder().store(MemoryStore::new()).build()?;
//! engine.load();
//! engine.start();
//! engine.handle_click();
//! engine.tick(100);
//! # Ok::<(), idle_sim::ConfigError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod scheduler;
pub mod sim;
pub mod storage;
pub mod time;

pub use config::EngineConfig;
pub use error::{
    CommandError, ConfigError, EffectError, LifecycleError, PrestigeError, PurchaseError, SaveError,
    StorageError, SubsystemError,
};
pub use scheduler::{Due, TickScheduler};
pub use sim::*;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{KeyValueStore, MemoryStore, Persistence};
pub use time::{Clock, FrameTimer, ManualClock, Millis, SystemClock};

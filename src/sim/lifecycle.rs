//! Persistence lifecycle with enforced transitions.
//!
//! ```text
//! Fresh ──load──▶ Loaded ──save──▶ Saving ──▶ Loaded
//!   │  └──save──▶ Saving                        │
//!   └──────────────▶ Resetting ◀────────────────┘
//!                       │
//!                       ▼
//!                     Fresh
//! ```

use crate::error::LifecycleError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Default state, nothing loaded or saved yet.
    Fresh,
    /// State matches (or derives from) a persisted envelope.
    Loaded,
    /// A save is being written.
    Saving,
    /// Store and state are being cleared; saves are suppressed.
    Resetting,
}

impl Lifecycle {
    pub fn can_transition(self, to: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, to),
            (Fresh, Loaded)
                | (Fresh, Saving)
                | (Loaded, Loaded)
                | (Loaded, Saving)
                | (Saving, Loaded)
                | (Fresh, Resetting)
                | (Loaded, Resetting)
                | (Saving, Resetting)
                | (Resetting, Fresh)
        )
    }

    /// Move to `to`, or report the illegal edge without changing anything.
    pub fn transition(&mut self, to: Lifecycle) -> Result<(), LifecycleError> {
        if self.can_transition(to) {
            *self = to;
            Ok(())
        } else {
            Err(LifecycleError { from: *self, to })
        }
    }

    pub fn is_resetting(self) -> bool {
        self == Lifecycle::Resetting
    }
}

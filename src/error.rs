//! Error types for every fallible engine operation.
//!
//! Core-internal failures (storage, corrupt saves, subsystem callbacks) are
//! handled where they occur and only logged. The types below exist so that
//! user-initiated operations (purchase, import/export, reset) can report
//! what went wrong.

use crate::sim::lifecycle::Lifecycle;

/// Failures reported by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("persistent storage is unavailable")]
    Unavailable,
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Why a persisted envelope could not be used.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save data is corrupt: {0}")]
    Corrupt(String),
    #[error("unsupported save version {found} (supported {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },
    #[error("failed to encode save data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Error returned by a scheduler callback. Logged, never propagated.
#[derive(Debug, thiserror::Error)]
#[error("subsystem `{subsystem}` failed: {reason}")]
pub struct SubsystemError {
    pub subsystem: &'static str,
    pub reason: String,
}

impl SubsystemError {
    pub fn new(subsystem: &'static str, reason: impl Into<String>) -> Self {
        Self {
            subsystem,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PurchaseError {
    #[error("unknown catalog entry `{0}`")]
    UnknownItem(String),
    #[error("catalog entry `{0}` is malformed")]
    MalformedEntry(String),
    #[error("`{0}` is not unlocked yet")]
    Locked(String),
    #[error("`{0}` is already owned")]
    AlreadyOwned(String),
    #[error("not enough score: need {cost}, have {available}")]
    InsufficientScore { cost: f64, available: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EffectError {
    #[error("effect duration must be positive")]
    NonPositiveDuration,
    #[error("effect magnitude {0} is not a finite non-negative number")]
    InvalidMagnitude(f64),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PrestigeError {
    #[error("prestige requires {required} lifetime score, have {available}")]
    NotEligible { required: f64, available: f64 },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("illegal lifecycle transition {from:?} -> {to:?}")]
pub struct LifecycleError {
    pub from: Lifecycle,
    pub to: Lifecycle,
}

/// Failures surfaced by the user-initiated `Engine::import` and `Engine::reset`.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

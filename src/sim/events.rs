//! Interrupting events and the arbitration queue.
//!
//! Producers may queue at any time; at most one event is active. The next
//! one is activated only by [`EventQueue::process`], which the engine calls
//! at startup and after every completion.

use std::collections::VecDeque;

use crate::time::Millis;

use super::state::EffectKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Boss,
    Quiz,
    Milestone,
    Tutorial,
}

/// Paid out when an event completes with [`EventOutcome::Success`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reward {
    None,
    Score(f64),
    Effect {
        kind: EffectKind,
        magnitude: f64,
        duration_ms: Millis,
    },
    /// Not produced by the built-in spawners; available to host-queued
    /// events.
    PrestigePoints(u64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    Boss { health: f64 },
    Quiz { prompt: String, answer: i64 },
    Milestone { threshold: u64 },
    Tutorial { steps: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PendingEvent {
    pub kind: EventKind,
    pub payload: EventPayload,
    pub reward: Reward,
}

impl PendingEvent {
    pub fn boss(health: f64, reward: Reward) -> Self {
        Self {
            kind: EventKind::Boss,
            payload: EventPayload::Boss { health },
            reward,
        }
    }

    pub fn quiz(prompt: impl Into<String>, answer: i64, reward: Reward) -> Self {
        Self {
            kind: EventKind::Quiz,
            payload: EventPayload::Quiz {
                prompt: prompt.into(),
                answer,
            },
            reward,
        }
    }

    pub fn milestone(threshold: u64, reward: Reward) -> Self {
        Self {
            kind: EventKind::Milestone,
            payload: EventPayload::Milestone { threshold },
            reward,
        }
    }

    pub fn tutorial(steps: u32) -> Self {
        Self {
            kind: EventKind::Tutorial,
            payload: EventPayload::Tutorial { steps },
            reward: Reward::None,
        }
    }
}

/// How the presentation layer resolved the active event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Success,
    Failure,
    Dismissed,
}

#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    queued: VecDeque<PendingEvent>,
    active: Option<PendingEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back. Never activates anything by itself.
    pub fn push(&mut self, event: PendingEvent) {
        self.queued.push_back(event);
    }

    pub fn is_event_in_progress(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&PendingEvent> {
        self.active.as_ref()
    }

    /// Waiting events, oldest first (the active one excluded).
    pub fn queued(&self) -> impl Iterator<Item = &PendingEvent> {
        self.queued.iter()
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Activate the next event if none is active. Returns the newly
    /// activated event, or None if nothing changed.
    pub fn process(&mut self) -> Option<&PendingEvent> {
        if self.active.is_some() {
            return None;
        }
        self.active = self.queued.pop_front();
        self.active.as_ref()
    }

    /// Take the active event. None (and no change) if nothing is active.
    pub fn complete(&mut self) -> Option<PendingEvent> {
        self.active.take()
    }

    /// Whether an event of `kind` is active or waiting.
    pub fn contains_kind(&self, kind: EventKind) -> bool {
        self.active.iter().chain(self.queued.iter()).any(|e| e.kind == kind)
    }

    /// Discard everything, active event included.
    pub fn clear(&mut self) {
        self.queued.clear();
        self.active = None;
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.queued.is_empty()
    }
}

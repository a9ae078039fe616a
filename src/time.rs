//! Wall-clock sources and frame-delta conversion.
//!
//! The host calls the engine from `requestAnimationFrame`, `setInterval` or a
//! native sleep loop with whatever timestamp it has. [`FrameTimer`] turns
//! those timestamps into whole-millisecond deltas for
//! [`Engine::tick`](crate::Engine::tick); [`Clock`] supplies absolute epoch
//! time for expiry checks and save timestamps.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds since the Unix epoch (or a duration in milliseconds).
pub type Millis = u64;

/// Source of absolute time. Injected so tests never wait on a real clock.
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Real time: `Date.now()` in the browser, `SystemTime` natively.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> Millis {
        js_sys::Date::now().max(0.0) as Millis
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> Millis {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Millis)
            .unwrap_or(0)
    }
}

/// Settable clock. Clones share the same instant, so a test can keep one
/// handle and hand the other to the engine.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: Millis) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: Millis) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

/// Converts successive frame timestamps into elapsed milliseconds.
///
/// Unlike a fixed-step accumulator this never clamps: a tab that was
/// backgrounded for a minute reports the whole minute, and the scheduler
/// hands it to each subsystem in one batch.
pub struct FrameTimer {
    /// Timestamp of the last update (ms), None if first frame
    last_timestamp: Option<f64>,
    /// Sub-millisecond remainder not yet reported
    carry: f64,
    /// Total whole milliseconds reported since creation
    pub total_ms: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last_timestamp: None,
            carry: 0.0,
            total_ms: 0,
        }
    }

    /// Feed a frame timestamp. Returns whole milliseconds elapsed since the
    /// previous call; the fractional part is carried to the next frame.
    pub fn update(&mut self, now_ms: f64) -> Millis {
        if !now_ms.is_finite() {
            return 0;
        }
        let delta = match self.last_timestamp {
            // Timestamps going backwards (clock adjustment) count as no time.
            Some(prev) => (now_ms - prev).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(now_ms);

        self.carry += delta;
        let whole = self.carry.floor();
        self.carry -= whole;
        let whole = whole as Millis;
        self.total_ms += whole;
        whole
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

//! One shared driver fanning out to subsystems running at their own rates.
//!
//! Each registered subsystem owns an accumulator. Every base tick adds the
//! real elapsed delta to all accumulators; a subsystem whose accumulator
//! holds `k >= 1` whole periods is invoked once with `Due { periods: k, .. }`
//! and keeps the remainder. Summed over any sequence of deltas totalling `D`,
//! a subsystem with period `P` is therefore credited exactly `floor(D / P)`
//! periods.
//!
//! Subsystems run in registration order within a tick. A callback error is
//! logged and otherwise ignored. Panics are not caught: a panicking callback
//! unwinds out of [`TickScheduler::tick`] and the subsystems after it miss
//! that tick.

use tracing::warn;

use crate::error::SubsystemError;
use crate::time::Millis;

/// Work owed to a subsystem on this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Due {
    /// Whole periods completed since the last invocation.
    pub periods: u64,
    /// `periods × period_ms`.
    pub elapsed_ms: Millis,
}

pub type Callback<C> = Box<dyn FnMut(&mut C, Due) -> Result<(), SubsystemError>>;

/// Handle returned by [`TickScheduler::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubsystemId(usize);

struct Subsystem<C> {
    name: &'static str,
    period_ms: Millis,
    accumulator_ms: Millis,
    fired: u64,
    failures: u64,
    callback: Callback<C>,
}

pub struct TickScheduler<C> {
    subsystems: Vec<Subsystem<C>>,
    running: bool,
    /// Base ticks processed while running.
    pub total_ticks: u64,
}

impl<C> TickScheduler<C> {
    pub fn new() -> Self {
        Self {
            subsystems: Vec::new(),
            running: false,
            total_ticks: 0,
        }
    }

    /// Register a subsystem. A zero period is treated as 1ms.
    pub fn register<F>(&mut self, name: &'static str, period_ms: Millis, callback: F) -> SubsystemId
    where
        F: FnMut(&mut C, Due) -> Result<(), SubsystemError> + 'static,
    {
        self.subsystems.push(Subsystem {
            name,
            period_ms: period_ms.max(1),
            accumulator_ms: 0,
            fired: 0,
            failures: 0,
            callback: Box::new(callback),
        });
        SubsystemId(self.subsystems.len() - 1)
    }

    /// Returns true if the scheduler was not already running.
    pub fn start(&mut self) -> bool {
        let changed = !self.running;
        self.running = true;
        changed
    }

    /// Stop and discard every pending partial period in one step.
    /// Returns true if the scheduler was running.
    pub fn stop(&mut self) -> bool {
        let changed = self.running;
        self.running = false;
        self.reset_counters();
        changed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Zero all accumulators without touching the running flag.
    pub fn reset_counters(&mut self) {
        for sub in &mut self.subsystems {
            sub.accumulator_ms = 0;
        }
    }

    /// Advance every subsystem by `delta_ms`. Returns how many callbacks ran.
    pub fn tick(&mut self, ctx: &mut C, delta_ms: Millis) -> usize {
        if !self.running {
            return 0;
        }
        self.total_ticks += 1;

        let mut invoked = 0;
        for sub in &mut self.subsystems {
            sub.accumulator_ms = sub.accumulator_ms.saturating_add(delta_ms);
            let periods = sub.accumulator_ms / sub.period_ms;
            if periods == 0 {
                continue;
            }
            let elapsed_ms = periods * sub.period_ms;
            sub.accumulator_ms -= elapsed_ms;
            sub.fired += periods;
            invoked += 1;

            if let Err(e) = (sub.callback)(ctx, Due { periods, elapsed_ms }) {
                sub.failures += 1;
                warn!(
                    subsystem = sub.name,
                    failures = sub.failures,
                    error = %e,
                    "subsystem callback failed"
                );
            }
        }
        invoked
    }

    /// Total periods credited to a subsystem.
    pub fn fired(&self, id: SubsystemId) -> u64 {
        self.subsystems.get(id.0).map_or(0, |s| s.fired)
    }

    pub fn failures(&self, id: SubsystemId) -> u64 {
        self.subsystems.get(id.0).map_or(0, |s| s.failures)
    }

    /// Milliseconds carried toward the subsystem's next period.
    pub fn pending_ms(&self, id: SubsystemId) -> Millis {
        self.subsystems.get(id.0).map_or(0, |s| s.accumulator_ms)
    }

    pub fn id_of(&self, name: &str) -> Option<SubsystemId> {
        self.subsystems
            .iter()
            .position(|s| s.name == name)
            .map(SubsystemId)
    }

    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }
}

impl<C> Default for TickScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

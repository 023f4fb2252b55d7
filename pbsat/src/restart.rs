//! Restart policies.
//!
//! A restart policy counts conflicts and tells the search when to backtrack to the root level. It
//! sees every conflict and every learnt constraint, but never the constraints themselves, so all
//! policies here are deterministic.
use std::collections::VecDeque;
use std::fmt;

mod luby;

pub use luby::LubySequence;

/// Decides when the search restarts.
pub trait RestartPolicy: Send + fmt::Debug {
    /// Identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Conflicts before the first restart.
    fn initial_bound(&self) -> u64;

    /// Conflicts between the last restart and the next one.
    fn next_bound(&self) -> u64;

    /// Called for every conflict.
    fn on_conflict(&mut self);

    /// Called with the literal block distance of every learnt constraint.
    fn on_learnt(&mut self, _lbd: usize) {}

    /// Called after each restart, advances the schedule.
    fn on_restart(&mut self);

    fn should_restart(&self) -> bool;

    /// Return to the initial state.
    fn reset(&mut self);
}

/// Never restart.
#[derive(Clone, Debug, Default)]
pub struct NoRestarts;

impl RestartPolicy for NoRestarts {
    fn name(&self) -> &'static str {
        "none"
    }

    fn initial_bound(&self) -> u64 {
        u64::max_value()
    }

    fn next_bound(&self) -> u64 {
        u64::max_value()
    }

    fn on_conflict(&mut self) {}

    fn on_restart(&mut self) {}

    fn should_restart(&self) -> bool {
        false
    }

    fn reset(&mut self) {}
}

/// Restart after a constant number of conflicts.
#[derive(Clone, Debug)]
pub struct FixedPeriodRestarts {
    period: u64,
    conflicts: u64,
}

impl FixedPeriodRestarts {
    pub fn new(period: u64) -> FixedPeriodRestarts {
        FixedPeriodRestarts {
            period: period.max(1),
            conflicts: 0,
        }
    }
}

impl RestartPolicy for FixedPeriodRestarts {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn initial_bound(&self) -> u64 {
        self.period
    }

    fn next_bound(&self) -> u64 {
        self.period
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
    }

    fn on_restart(&mut self) {
        self.conflicts = 0;
    }

    fn should_restart(&self) -> bool {
        self.conflicts >= self.period
    }

    fn reset(&mut self) {
        self.conflicts = 0;
    }
}

/// Restart intervals growing by a constant factor.
#[derive(Clone, Debug)]
pub struct GeometricRestarts {
    initial: u64,
    factor: f64,
    bound: f64,
    conflicts: u64,
}

impl GeometricRestarts {
    pub fn new(initial: u64, factor: f64) -> GeometricRestarts {
        debug_assert!(factor >= 1.0);
        GeometricRestarts {
            initial: initial.max(1),
            factor,
            bound: initial.max(1) as f64,
            conflicts: 0,
        }
    }
}

impl RestartPolicy for GeometricRestarts {
    fn name(&self) -> &'static str {
        "minisat"
    }

    fn initial_bound(&self) -> u64 {
        self.initial
    }

    fn next_bound(&self) -> u64 {
        self.bound.round() as u64
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
    }

    fn on_restart(&mut self) {
        self.bound *= self.factor;
        self.conflicts = 0;
    }

    fn should_restart(&self) -> bool {
        self.conflicts >= self.next_bound()
    }

    fn reset(&mut self) {
        self.bound = self.initial as f64;
        self.conflicts = 0;
    }
}

/// Restart intervals following the Luby sequence scaled by a constant factor.
#[derive(Clone, Debug)]
pub struct LubyRestarts {
    factor: u64,
    luby: LubySequence,
    bound: u64,
    conflicts: u64,
}

impl LubyRestarts {
    pub fn new(factor: u64) -> LubyRestarts {
        let factor = factor.max(1);
        let mut luby = LubySequence::default();
        let bound = factor * luby.advance();
        LubyRestarts {
            factor,
            luby,
            bound,
            conflicts: 0,
        }
    }
}

impl RestartPolicy for LubyRestarts {
    fn name(&self) -> &'static str {
        "luby"
    }

    fn initial_bound(&self) -> u64 {
        self.factor
    }

    fn next_bound(&self) -> u64 {
        self.bound
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
    }

    fn on_restart(&mut self) {
        self.bound = self.factor * self.luby.advance();
        self.conflicts = 0;
    }

    fn should_restart(&self) -> bool {
        self.conflicts >= self.bound
    }

    fn reset(&mut self) {
        *self = LubyRestarts::new(self.factor);
    }
}

/// Inner/outer restart schedule.
///
/// The inner interval grows geometrically until it reaches the outer interval. Then the outer
/// interval grows and the inner one starts over. This gives runs of short restarts interrupted by
/// occasional long ones.
#[derive(Clone, Debug)]
pub struct ArminRestarts {
    initial: f64,
    factor: f64,
    inner: f64,
    outer: f64,
    conflicts: u64,
}

impl ArminRestarts {
    pub fn new(initial: u64, factor: f64) -> ArminRestarts {
        debug_assert!(factor > 1.0);
        let initial = initial.max(1) as f64;
        ArminRestarts {
            initial,
            factor,
            inner: initial,
            outer: initial,
            conflicts: 0,
        }
    }
}

impl RestartPolicy for ArminRestarts {
    fn name(&self) -> &'static str {
        "armin"
    }

    fn initial_bound(&self) -> u64 {
        self.initial.round() as u64
    }

    fn next_bound(&self) -> u64 {
        self.inner.round() as u64
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
    }

    fn on_restart(&mut self) {
        if self.inner >= self.outer {
            self.outer *= self.factor;
            self.inner = self.initial;
        } else {
            self.inner *= self.factor;
        }
        self.conflicts = 0;
    }

    fn should_restart(&self) -> bool {
        self.conflicts >= self.next_bound()
    }

    fn reset(&mut self) {
        self.inner = self.initial;
        self.outer = self.initial;
        self.conflicts = 0;
    }
}

/// Adaptive restarts driven by the literal block distance of learnt constraints.
///
/// Restarts when the average LBD of the last `window` learnt constraints, scaled by `margin`,
/// exceeds the average LBD of all learnt constraints.
#[derive(Clone, Debug)]
pub struct GlucoseRestarts {
    window: usize,
    margin: f64,
    recent: VecDeque<usize>,
    recent_sum: usize,
    total_sum: u64,
    total_count: u64,
}

impl Default for GlucoseRestarts {
    fn default() -> GlucoseRestarts {
        GlucoseRestarts::new(50, 0.8)
    }
}

impl GlucoseRestarts {
    pub fn new(window: usize, margin: f64) -> GlucoseRestarts {
        GlucoseRestarts {
            window: window.max(1),
            margin,
            recent: VecDeque::with_capacity(window.max(1)),
            recent_sum: 0,
            total_sum: 0,
            total_count: 0,
        }
    }
}

impl RestartPolicy for GlucoseRestarts {
    fn name(&self) -> &'static str {
        "glucose"
    }

    fn initial_bound(&self) -> u64 {
        self.window as u64
    }

    /// The minimal number of conflicts until the next restart.
    fn next_bound(&self) -> u64 {
        self.window as u64
    }

    fn on_conflict(&mut self) {}

    fn on_learnt(&mut self, lbd: usize) {
        self.recent.push_back(lbd);
        self.recent_sum += lbd;
        if self.recent.len() > self.window {
            if let Some(old) = self.recent.pop_front() {
                self.recent_sum -= old;
            }
        }
        self.total_sum += lbd as u64;
        self.total_count += 1;
    }

    fn on_restart(&mut self) {
        self.recent.clear();
        self.recent_sum = 0;
    }

    fn should_restart(&self) -> bool {
        if self.recent.len() < self.window || self.total_count == 0 {
            return false;
        }
        let recent_avg = self.recent_sum as f64 / self.window as f64;
        let total_avg = self.total_sum as f64 / self.total_count as f64;
        recent_avg * self.margin > total_avg
    }

    fn reset(&mut self) {
        *self = GlucoseRestarts::new(self.window, self.margin);
    }
}

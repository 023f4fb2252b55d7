//! Learnt constraint deletion policies.
//!
//! A deletion policy decides when the learnt constraint database is reduced and ranks the learnt
//! constraints. The reduction itself, which never removes constraints that are currently the
//! reason of an assignment, is done by the solver.
use std::fmt;

pub use crate::constraint::ConstraintHeader;

/// Counts conflicts up to a bound, fires and starts over.
#[derive(Clone, Debug)]
pub struct ConflictTimer {
    counter: u64,
    bound: u64,
}

impl ConflictTimer {
    pub fn new(bound: u64) -> ConflictTimer {
        ConflictTimer {
            counter: 0,
            bound: bound.max(1),
        }
    }

    /// Count a conflict, returns true when the bound was reached.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.bound {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub fn set_bound(&mut self, bound: u64) {
        self.bound = bound.max(1);
    }
}

/// Decides when and which learnt constraints to remove.
pub trait DeletionPolicy: Send + fmt::Debug {
    /// Identifier used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Return to the initial state.
    fn reset(&mut self);

    /// Called for every conflict.
    fn on_conflict(&mut self);

    /// Whether a reduction is due.
    fn should_clean(&self) -> bool;

    /// Called after each reduction.
    fn on_clean(&mut self);

    /// Quality of a learnt constraint, constraints with higher scores are kept.
    fn score(&self, header: &ConstraintHeader) -> f64;

    /// Constraints that are never removed regardless of their score.
    fn is_protected(&self, _header: &ConstraintHeader) -> bool {
        false
    }

    /// Fraction of the unprotected learnt constraints removed per reduction.
    fn removal_fraction(&self) -> f64 {
        0.5
    }
}

/// Remove the least active learnt constraints every fixed number of conflicts.
#[derive(Clone, Debug)]
pub struct ActivityDeletion {
    timer: ConflictTimer,
    due: bool,
}

impl ActivityDeletion {
    pub fn new(interval: u64) -> ActivityDeletion {
        ActivityDeletion {
            timer: ConflictTimer::new(interval),
            due: false,
        }
    }
}

impl DeletionPolicy for ActivityDeletion {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn reset(&mut self) {
        self.timer.reset();
        self.due = false;
    }

    fn on_conflict(&mut self) {
        if self.timer.tick() {
            self.due = true;
        }
    }

    fn should_clean(&self) -> bool {
        self.due
    }

    fn on_clean(&mut self) {
        self.due = false;
    }

    fn score(&self, header: &ConstraintHeader) -> f64 {
        header.activity() as f64
    }
}

/// Remove the learnt constraints with the largest LBD, protecting the ones with a small LBD.
///
/// The interval between reductions grows by a constant after each reduction.
#[derive(Clone, Debug)]
pub struct LbdDeletion {
    initial_interval: u64,
    increment: u64,
    protected_lbd: u32,
    timer: ConflictTimer,
    due: bool,
}

impl LbdDeletion {
    pub fn new(interval: u64, increment: u64, protected_lbd: u32) -> LbdDeletion {
        LbdDeletion {
            initial_interval: interval,
            increment,
            protected_lbd,
            timer: ConflictTimer::new(interval),
            due: false,
        }
    }
}

impl DeletionPolicy for LbdDeletion {
    fn name(&self) -> &'static str {
        "lbd"
    }

    fn reset(&mut self) {
        self.timer = ConflictTimer::new(self.initial_interval);
        self.due = false;
    }

    fn on_conflict(&mut self) {
        if self.timer.tick() {
            self.due = true;
        }
    }

    fn should_clean(&self) -> bool {
        self.due
    }

    fn on_clean(&mut self) {
        self.due = false;
        let bound = self.timer.bound() + self.increment;
        self.timer.set_bound(bound);
    }

    fn score(&self, header: &ConstraintHeader) -> f64 {
        -(header.lbd() as f64)
    }

    fn is_protected(&self, header: &ConstraintHeader) -> bool {
        header.lbd() <= self.protected_lbd
    }
}

/// Keep every learnt constraint.
#[derive(Clone, Debug, Default)]
pub struct NoDeletion;

impl DeletionPolicy for NoDeletion {
    fn name(&self) -> &'static str {
        "never"
    }

    fn reset(&mut self) {}

    fn on_conflict(&mut self) {}

    fn should_clean(&self) -> bool {
        false
    }

    fn on_clean(&mut self) {}

    fn score(&self, _header: &ConstraintHeader) -> f64 {
        0.0
    }

    fn is_protected(&self, _header: &ConstraintHeader) -> bool {
        true
    }
}

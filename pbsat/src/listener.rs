//! Observation hooks for tracing the search.
use std::fmt;

use crate::constraint::ConstraintId;
use crate::lit::Lit;

/// Callbacks invoked during the search.
///
/// All methods default to doing nothing. Implementations only observe, the search does not
/// depend on anything they do.
pub trait SearchListener: Send {
    /// A decision literal was assigned.
    fn on_decision(&mut self, _lit: Lit) {}

    /// A literal was propagated by the given constraint.
    fn on_propagate(&mut self, _lit: Lit, _reason: ConstraintId) {}

    /// The given constraint is falsified at the given decision level.
    fn on_conflict(&mut self, _constraint: ConstraintId, _level: usize) {}

    /// A constraint over the given literals was learnt.
    fn on_learn(&mut self, _lits: &[Lit]) {}

    fn on_restart(&mut self) {}

    /// The learnt constraint database was reduced.
    fn on_clean(&mut self) {}
}

/// A listener ignoring all events.
#[derive(Default)]
pub struct NoopListener;

impl SearchListener for NoopListener {}

/// Holds the installed listener.
pub struct Listener {
    inner: Box<dyn SearchListener>,
}

impl Default for Listener {
    fn default() -> Listener {
        Listener {
            inner: Box::new(NoopListener),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Listener")
    }
}

impl Listener {
    pub fn set(&mut self, listener: Box<dyn SearchListener>) {
        self.inner = listener;
    }

    pub fn get_mut(&mut self) -> &mut dyn SearchListener {
        &mut *self.inner
    }
}

//! Search statistics.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters collected during the search.
///
/// These accumulate over all solve calls of a solver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub restarts: u64,
    /// Learnt constraint database reductions.
    pub reductions: u64,
    /// Learnt constraints removed by reductions.
    pub deleted_learnts: u64,
    pub learnt_constraints: u64,
    /// Learnt constraints of a single literal, assigned at the root level instead of stored.
    pub learnt_units: u64,
    /// Learnt constraints derived by cutting planes instead of clause resolution.
    pub cutting_planes_learnts: u64,
    /// Literals removed from learnt constraints by minimization.
    pub minimized_lits: u64,
    /// Stored constraints removed because the root level assignment satisfied them.
    pub satisfied_removed: u64,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "decisions: {} propagations: {} conflicts: {} restarts: {} reductions: {} \
             learnt: {} deleted: {}",
            self.decisions,
            self.propagations,
            self.conflicts,
            self.restarts,
            self.reductions,
            self.learnt_constraints,
            self.deleted_learnts,
        )
    }
}

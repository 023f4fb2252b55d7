//! pbsat is a [CDCL][cdcl] based solver for clauses, cardinality constraints and linear
//! pseudo-Boolean constraints over Boolean variables. Given such a set of constraints it either
//! finds an assignment satisfying all of them or determines that none exists. On top of the
//! decision procedure an [`Optimizer`](optimize::Optimizer) minimizes a linear objective and a
//! [`LexicographicOptimizer`](optimize::LexicographicOptimizer) several of them by priority.
//!
//! All constraint kinds share one propagation and explanation interface, so conflict analysis,
//! restarts and learnt constraint deletion work the same way for every kind. Large coefficients
//! transparently switch to arbitrary precision arithmetic.
//!
//! [cdcl]: https://en.wikipedia.org/wiki/Conflict-Driven_Clause_Learning

#[cfg(test)]
#[macro_use]
extern crate pbsat_formula;

pub mod config;
pub mod control;
pub mod deletion;
pub mod listener;
pub mod optimize;
pub mod restart;
pub mod solver;

mod analyze_conflict;
mod assumptions;
mod cdcl;
mod constraint;
mod context;
mod cutting_planes;
mod decision;
mod glue;
mod load;
mod model;
mod prop;
mod schedule;
mod simplify;
mod state;
mod stats;
mod tmp;

pub use pbsat_formula::{
    cnf, lit, pb, CnfFormula, LinearConstraint, Lit, Objective, PbFormula, Relation, Var,
};

pub use config::{
    DeletionStrategy, LearningScheme, PhaseSelection, RestartStrategy, SimplificationLevel,
    SolverConfig, UnknownPolicy,
};
pub use constraint::{ConstraintId, ConstraintKind};
pub use control::{SolveLimits, SolverControl};
pub use decision::OrderPolicy;
pub use model::Model;
pub use optimize::{LexicographicOptimizer, LexicographicOutcome, OptimizationOutcome, Optimizer};
pub use solver::{Contradiction, SolveOutcome, Solver};
pub use stats::SearchStats;

//! Pseudo-Boolean satisfiability solver.
use std::fmt;

use log::info;
use num_bigint::BigInt;
use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};
use thiserror::Error;

use crate::assumptions::set_assumptions;
use crate::config::{SimplificationLevel, SolverConfig};
use crate::constraint::{ConstraintId, ConstraintKind};
use crate::context::{ensure_var_count, parts::*, Context};
use crate::control::{SolveLimits, SolverControl};
use crate::decision::OrderPolicy;
use crate::deletion::DeletionPolicy;
use crate::lit::Lit;
use crate::listener::SearchListener;
use crate::load::load_constraint;
use crate::model::Model;
use crate::pb::{LinearConstraint, PbFormula, Relation};
use crate::restart::RestartPolicy;
use crate::schedule::schedule_step;
use crate::state::SatState;
use crate::stats::SearchStats;
use crate::CnfFormula;

/// A constraint was rejected because it cannot be satisfied.
///
/// Rejected constraints are not added, the solver stays usable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Contradiction {
    /// The constraint cannot be satisfied by any assignment.
    #[error("constraint is infeasible, its coefficients sum to less than its degree")]
    Infeasible,
    /// The constraint is falsified by the assignments implied by the formula.
    #[error("constraint is falsified by the root level assignment")]
    Falsified,
    #[error("the formula is already known to be unsatisfiable")]
    AlreadyUnsat,
}

/// Result of a solve call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    Satisfiable(Model),
    /// The formula, or the formula together with the assumptions, has no model.
    Unsatisfiable,
    /// The search was stopped by a limit or a cancellation.
    Unknown,
}

impl SolveOutcome {
    pub fn is_sat(&self) -> bool {
        match self {
            SolveOutcome::Satisfiable(_) => true,
            _ => false,
        }
    }

    pub fn is_unsat(&self) -> bool {
        *self == SolveOutcome::Unsatisfiable
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SolveOutcome::Satisfiable(model) => Some(model),
            _ => None,
        }
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SolveOutcome::Satisfiable(_) => "SATISFIABLE",
            SolveOutcome::Unsatisfiable => "UNSATISFIABLE",
            SolveOutcome::Unknown => "UNKNOWN",
        })
    }
}

/// A CDCL solver for clauses, cardinality and pseudo-Boolean constraints.
///
/// A solver is `Send` but not meant to be shared. Use [`Solver::control`] to steer a search
/// running on another thread.
#[derive(Default)]
pub struct Solver {
    ctx: Box<Context>,
}

impl Solver {
    /// Create a new solver with the default configuration.
    pub fn new() -> Solver {
        Solver::default()
    }

    /// Create a new solver using the given configuration.
    pub fn with_config(config: &SolverConfig) -> Solver {
        let mut solver = Solver::default();
        solver.apply_config(config);
        solver
    }

    /// Replace the configuration, including all policies.
    ///
    /// Policies restart from their initial state.
    pub fn apply_config(&mut self, config: &SolverConfig) {
        let mut ctx = self.ctx.into_partial_ref_mut();

        ctx.part_mut(VsidsP).set_decay(config.vsids_decay);
        ctx.part_mut(ConstraintActivityP)
            .set_decay(config.constraint_activity_decay);
        ctx.part_mut(OrderP).set_policy(config.order_policy());

        let schedule = ctx.part_mut(ScheduleP);
        schedule.set_restart_policy(config.restart_policy());
        schedule.set_deletion_policy(config.deletion_policy());

        *ctx.part_mut(SolverConfigP) = config.clone();
    }

    /// The current configuration.
    pub fn config(&self) -> SolverConfig {
        self.ctx.into_partial_ref().part(SolverConfigP).clone()
    }

    /// Add the clause `lits[0] ∨ lits[1] ∨ ...`.
    pub fn add_clause(&mut self, lits: &[Lit]) -> Result<ConstraintId, Contradiction> {
        self.add_constraint(&LinearConstraint::clause(lits))
    }

    /// Add a constraint requiring at least `degree` of the literals to be true.
    pub fn add_cardinality(
        &mut self,
        lits: &[Lit],
        degree: usize,
    ) -> Result<ConstraintId, Contradiction> {
        self.add_constraint(&LinearConstraint::at_least(lits, BigInt::from(degree)))
    }

    /// Add `Σ coefs[i]·lits[i] >= degree`, or `<= degree` when `is_at_least` is false.
    ///
    /// Panics if the number of literals and coefficients differ.
    pub fn add_pseudo_boolean(
        &mut self,
        lits: &[Lit],
        coefs: &[BigInt],
        is_at_least: bool,
        degree: impl Into<BigInt>,
    ) -> Result<ConstraintId, Contradiction> {
        assert_eq!(lits.len(), coefs.len(), "literal and coefficient count differ");
        let terms = coefs.iter().cloned().zip(lits.iter().cloned()).collect();
        let relation = if is_at_least {
            Relation::AtLeast
        } else {
            Relation::AtMost
        };
        self.add_constraint(&LinearConstraint::new(terms, relation, degree))
    }

    /// Add a linear constraint.
    ///
    /// Both halves of an equality share the returned id.
    pub fn add_constraint(
        &mut self,
        constraint: &LinearConstraint,
    ) -> Result<ConstraintId, Contradiction> {
        let mut ctx = self.ctx.into_partial_ref_mut();
        load_constraint(ctx.borrow(), constraint)
    }

    /// Add all constraints of a formula, ignoring its objective.
    ///
    /// Stops at the first rejected constraint, the constraints before it stay added.
    pub fn add_formula(&mut self, formula: &PbFormula) -> Result<(), Contradiction> {
        self.reserve_vars(formula.var_count());
        for constraint in formula.constraints() {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Add all clauses of a CNF formula.
    ///
    /// Stops at the first rejected clause, the clauses before it stay added.
    pub fn add_cnf(&mut self, formula: &CnfFormula) -> Result<(), Contradiction> {
        self.reserve_vars(formula.var_count());
        for constraint in formula.linear_constraints() {
            self.add_constraint(&constraint)?;
        }
        Ok(())
    }

    /// Make sure the solver has at least `count` variables.
    pub fn reserve_vars(&mut self, count: usize) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), count);
    }

    pub fn var_count(&self) -> usize {
        self.ctx.into_partial_ref().part(AssignmentP).assignment().len()
    }

    /// Check the satisfiability of the current formula.
    pub fn solve(&mut self) -> SolveOutcome {
        self.solve_with(&[], SolveLimits::unlimited())
    }

    /// Check the satisfiability of the current formula under assumptions and within limits.
    ///
    /// The assumptions hold only for this call. When the formula is unsatisfiable under the
    /// assumptions, [`Solver::failed_assumptions`] returns the assumptions responsible.
    pub fn solve_with(&mut self, assumptions: &[Lit], limits: SolveLimits) -> SolveOutcome {
        let mut ctx = self.ctx.into_partial_ref_mut();

        let var_count = assumptions
            .iter()
            .map(|lit| lit.index() + 1)
            .max()
            .unwrap_or(0);
        ensure_var_count(ctx.borrow(), var_count);

        set_assumptions(ctx.borrow(), assumptions);

        let conflicts = ctx.part(StatsP).conflicts;
        ctx.part_mut(ScheduleP).start(limits, conflicts);

        {
            let db = ctx.part(ConstraintDbP);
            info!(
                "solving {} variables, {} constraints ({} learnt) under {} assumptions",
                ctx.part(AssignmentP).assignment().len(),
                db.len(),
                db.learnt_count(),
                assumptions.len()
            );
        }

        while schedule_step(ctx.borrow()) {}

        let outcome = match ctx.part(SolverStateP).sat_state {
            SatState::Sat => SolveOutcome::Satisfiable(Model::from_assignment(
                ctx.part(AssignmentP),
            )),
            SatState::Unsat | SatState::UnsatUnderAssumptions => SolveOutcome::Unsatisfiable,
            SatState::Unknown | SatState::Interrupted => SolveOutcome::Unknown,
        };

        info!("{} ({})", outcome, ctx.part(StatsP));

        outcome
    }

    /// The model found by the last solve call, if it was satisfiable and no constraint was added
    /// since.
    pub fn model(&self) -> Option<Model> {
        let ctx = self.ctx.into_partial_ref();
        if ctx.part(SolverStateP).sat_state == SatState::Sat {
            Some(Model::from_assignment(ctx.part(AssignmentP)))
        } else {
            None
        }
    }

    /// Subset of the assumptions that made the last solve call unsatisfiable.
    ///
    /// Empty when the formula is unsatisfiable without assumptions. `None` when the last solve
    /// call was not unsatisfiable.
    pub fn failed_assumptions(&self) -> Option<Vec<Lit>> {
        let ctx = self.ctx.into_partial_ref();
        match ctx.part(SolverStateP).sat_state {
            SatState::Unsat => Some(vec![]),
            SatState::UnsatUnderAssumptions => {
                Some(ctx.part(AssumptionsP).failed_core().to_vec())
            }
            _ => None,
        }
    }

    pub fn set_restart_strategy(&mut self, policy: Box<dyn RestartPolicy>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(ScheduleP).set_restart_policy(policy);
    }

    pub fn set_deletion_strategy(&mut self, policy: Box<dyn DeletionPolicy>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(ScheduleP).set_deletion_policy(policy);
    }

    pub fn set_order_strategy(&mut self, policy: OrderPolicy) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        let config = ctx.part_mut(SolverConfigP);
        config.phase = policy.phase;
        config.random_walk = policy.random_walk;
        config.random_seed = policy.seed;
        ctx.part_mut(OrderP).set_policy(policy);
    }

    /// Select how learnt clauses are minimized.
    pub fn set_simplification_level(&mut self, level: SimplificationLevel) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(SolverConfigP).simplification = level;
    }

    /// Install a listener observing the search, replacing the previous one.
    pub fn set_listener(&mut self, listener: Box<dyn SearchListener>) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(ListenerP).set(listener);
    }

    /// A handle to cancel or steer the search from another thread.
    pub fn control(&self) -> SolverControl {
        self.ctx.into_partial_ref().part(ScheduleP).control().clone()
    }

    /// Statistics accumulated over all solve calls.
    pub fn stats(&self) -> SearchStats {
        *self.ctx.into_partial_ref().part(StatsP)
    }

    /// Number of stored constraints of a representation, including learnt ones.
    pub fn constraint_count(&self, kind: ConstraintKind) -> usize {
        self.ctx
            .into_partial_ref()
            .part(ConstraintDbP)
            .count_by_kind(kind)
    }

    /// Number of stored learnt constraints.
    pub fn learnt_count(&self) -> usize {
        self.ctx.into_partial_ref().part(ConstraintDbP).learnt_count()
    }
}

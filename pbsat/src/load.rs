//! Loading constraints into the solver.
use num_bigint::BigInt;
use num_traits::Zero;
use partial_ref::{partial, PartialRef};

use crate::constraint::{
    add_constraint, build_constraint, normalize, AtLeast, ConstraintHeader, ConstraintId,
    Normalized,
};
use crate::context::{ensure_var_count, parts::*, Context};
use crate::pb::LinearConstraint;
use crate::prop::{enqueue_assignment, restart, Assignment, Reason};
use crate::solver::Contradiction;
use crate::state::SatState;

/// Adds a linear constraint to the formula.
///
/// The constraint is normalized, checked against the root level assignment and stored in the
/// representation chosen by [`build_constraint`]. Literals it forces on the root level are
/// enqueued but not propagated.
///
/// A constraint that cannot be satisfied under the root level assignment is rejected without
/// changing the solver. This includes the state and the assignment of the last solve call.
pub fn load_constraint(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut OrderP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
    constraint: &LinearConstraint,
) -> Result<ConstraintId, Contradiction> {
    if ctx.part(SolverStateP).sat_state == SatState::Unsat {
        return Err(Contradiction::AlreadyUnsat);
    }

    let mut parts = vec![];
    for normalized in normalize(constraint) {
        match normalized {
            Normalized::Trivial => (),
            Normalized::Infeasible => return Err(Contradiction::Infeasible),
            Normalized::Constraint(at_least) => parts.push(at_least),
        }
    }

    // Checked before restarting, so a rejected constraint keeps the last model.
    if parts
        .iter()
        .any(|at_least| root_slack(ctx.borrow(), at_least) < BigInt::zero())
    {
        return Err(Contradiction::Falsified);
    }

    ctx.part_mut(SolverStateP).sat_state = SatState::Unknown;

    // New constraints are only ever added on the root level.
    restart(ctx.borrow());

    ensure_var_count(ctx.borrow(), constraint.var_count());

    let id = ctx.part_mut(ConstraintDbP).issue_id();

    for at_least in parts {
        // The literals forced by one half of an equality can still falsify the other half.
        if let Err(contradiction) = store_at_least(ctx.borrow(), id, at_least) {
            ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
            return Err(contradiction);
        }
    }

    Ok(id)
}

/// Slack of a constraint when only the root level assignment is taken into account.
fn root_slack(ctx: partial!(Context, AssignmentP, ImplGraphP), at_least: &AtLeast) -> BigInt {
    let assignment = ctx.part(AssignmentP);
    let impl_graph = ctx.part(ImplGraphP);
    let var_count = assignment.assignment().len();

    let mut slack = -at_least.degree.clone();
    for (coef, lit) in at_least.terms.iter() {
        let root_false = lit.index() < var_count
            && assignment.lit_is_false(*lit)
            && impl_graph.level(lit.var()) == 0;
        if !root_false {
            slack += coef;
        }
    }
    slack
}

/// Sum of the coefficients of non-false literals minus the degree.
fn slack(assignment: &Assignment, at_least: &AtLeast) -> BigInt {
    let mut slack = -at_least.degree.clone();
    for (coef, lit) in at_least.terms.iter() {
        if !assignment.lit_is_false(*lit) {
            slack += coef;
        }
    }
    slack
}

/// Store a normalized constraint and enqueue the literals it forces.
fn store_at_least(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut TmpDataP,
        mut TrailP,
        mut WatchlistsP,
        SolverConfigP,
    ),
    id: ConstraintId,
    at_least: AtLeast,
) -> Result<(), Contradiction> {
    let assignment = ctx.part(AssignmentP);

    if slack(assignment, &at_least) < BigInt::zero() {
        return Err(Contradiction::Falsified);
    }

    if let [(_, lit)] = at_least.terms[..] {
        // Coefficients are saturated, so a single literal has to be true.
        if assignment.lit_is_unassigned(lit) {
            enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
        }
        return Ok(());
    }

    let constraint = build_constraint(at_least);

    let implied = if ctx.part(SolverConfigP).implied_clauses {
        constraint.compute_implied_clause()
    } else {
        None
    };

    let cref = add_constraint(ctx.borrow(), ConstraintHeader::original(id), constraint);

    {
        let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);
        tmp.forced.clear();
        ctx.part(ConstraintDbP)
            .constraint(cref)
            .forced_lits(ctx.part(AssignmentP), &mut tmp.forced);
        for &lit in tmp.forced.iter() {
            enqueue_assignment(ctx.borrow(), lit, Reason::Constraint(cref));
        }
    }

    if let Some(lits) = implied {
        store_at_least(ctx.borrow(), id, AtLeast::clause(&lits))?;
    }

    Ok(())
}

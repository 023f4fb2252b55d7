//! Conflict driven constraint learning.

use log::trace;
use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::assumptions::{enqueue_assumption, EnqueueAssumption};
use crate::config::LearningScheme;
use crate::constraint::{
    add_constraint, build_constraint, bump_constraint_activity, decay_constraint_activities,
    AtLeast, ConstraintHeader,
};
use crate::context::{parts::*, Context};
use crate::cutting_planes::{derive_constraint, Derived};
use crate::decision::make_decision;
use crate::glue::compute_glue;
use crate::lit::Lit;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::simplify::simplify;
use crate::state::SatState;

/// Find a conflict, learn a constraint and backtrack.
///
/// The learnt constraint is a first UIP clause, or with [`LearningScheme::CuttingPlanes`] a
/// pseudo-Boolean constraint when cutting planes derive one that propagates. Either is stored in
/// the representation chosen by [`build_constraint`].
///
/// Returns the glue of the learnt constraint. Returns `None` when nothing was learnt because the
/// search finished instead.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut ConstraintActivityP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut ListenerP,
        mut OrderP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        SolverConfigP,
    ),
) -> Option<usize> {
    let conflict = find_conflict(ctx.borrow());

    let conflict = match conflict {
        Ok(()) => {
            let state = ctx.part_mut(SolverStateP);
            if state.sat_state == SatState::Unknown {
                state.sat_state = SatState::Sat;
            }
            return None;
        }
        Err(conflict) => conflict,
    };

    ctx.part_mut(StatsP).conflicts += 1;
    let level = ctx.part(TrailP).current_level();
    let conflict_id = ctx.part(ConstraintDbP).header(conflict.cref).id();
    ctx.part_mut(ListenerP)
        .get_mut()
        .on_conflict(conflict_id, level);

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    let clause = analyze.clause();

    if clause.is_empty() {
        ctx.part_mut(SolverStateP).sat_state = SatState::Unsat;
        return None;
    }

    for &cref in analyze.involved() {
        bump_constraint_activity(ctx.borrow(), cref);
    }

    decay_constraint_activities(ctx.borrow());
    ctx.part_mut(VsidsP).decay();

    let derived = if ctx.part(SolverConfigP).learning == LearningScheme::CuttingPlanes {
        derive_constraint(ctx.borrow(), conflict)
    } else {
        None
    };

    let Derived {
        at_least,
        backtrack_to,
    } = match derived {
        Some(derived) => {
            ctx.part_mut(StatsP).cutting_planes_learnts += 1;
            derived
        }
        None => {
            ctx.part_mut(StatsP).minimized_lits += analyze.minimized() as u64;
            Derived {
                at_least: AtLeast::clause(clause),
                backtrack_to,
            }
        }
    };

    let lits: Vec<Lit> = at_least.lits().collect();

    // Levels are only valid before backtracking
    let glue = {
        let assignment = ctx.part(AssignmentP);
        let assigned: Vec<Lit> = lits
            .iter()
            .cloned()
            .filter(|&lit| !assignment.lit_is_unassigned(lit))
            .collect();
        compute_glue(ctx.borrow(), &assigned)
    };

    backtrack(ctx.borrow(), backtrack_to);

    trace!("learnt {:?} >= {} with glue {}", at_least.terms, at_least.degree, glue);

    ctx.part_mut(StatsP).learnt_constraints += 1;

    ctx.part_mut(ListenerP).get_mut().on_learn(&lits);

    if lits.len() == 1 {
        ctx.part_mut(StatsP).learnt_units += 1;
        enqueue_assignment(ctx.borrow(), lits[0], Reason::Unit);
        return Some(glue);
    }

    let mut header = ConstraintHeader::learnt(glue);
    header.set_id(ctx.part_mut(ConstraintDbP).issue_id());
    let cref = add_constraint(ctx.borrow(), header, build_constraint(at_least));

    let (tmp, mut ctx) = ctx.split_part_mut(TmpDataP);
    let constraint = ctx.part(ConstraintDbP).constraint(cref);
    debug_assert!(constraint.is_assertive(
        backtrack_to + 1,
        ctx.part(AssignmentP),
        ctx.part(ImplGraphP),
    ));
    tmp.forced.clear();
    constraint.forced_lits(ctx.part(AssignmentP), &mut tmp.forced);
    for &lit in tmp.forced.iter() {
        enqueue_assignment(ctx.borrow(), lit, Reason::Constraint(cref));
    }

    Some(glue)
}

/// Find a conflict.
///
/// Returns `Err` if a conflict was found and `Ok` if the search stopped without a conflict. That
/// happens when a satisfying assignment was found or when an assumption turned out to be false.
/// The latter already updates the solver state.
pub fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut ListenerP,
        mut OrderP,
        mut SolverStateP,
        mut StatsP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) -> Result<(), Conflict> {
    loop {
        propagate(ctx.borrow())?;

        let trail = ctx.part(TrailP);
        if trail.current_level() == 0
            && trail.trail().len() > ctx.part(SolverStateP).simplified_len
        {
            simplify(ctx.borrow());
        }

        match enqueue_assumption(ctx.borrow()) {
            EnqueueAssumption::Enqueued => continue,
            EnqueueAssumption::Conflict => return Ok(()),
            EnqueueAssumption::Done => (),
        }

        if !make_decision(ctx.borrow()) {
            return Ok(());
        }
    }
}

//! Solving under assumptions.
//!
//! Assumptions are enqueued as the first decisions of the search, one decision level each. When an
//! assumption is found to be false the search stops and the assumptions responsible for that are
//! collected into the failed core.
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::lit::Lit;
use crate::prop::{enqueue_assignment, restart, Reason};
use crate::state::SatState;

/// Solving under assumptions.
#[derive(Default)]
pub struct Assumptions {
    assumptions: Vec<Lit>,
    failed_core: Vec<Lit>,
}

impl Assumptions {
    /// Subset of assumptions that made the formula unsatisfiable.
    pub fn failed_core(&self) -> &[Lit] {
        &self.failed_core
    }

    /// Current assumptions.
    pub fn assumptions(&self) -> &[Lit] {
        &self.assumptions
    }
}

/// Return type of [`enqueue_assumption`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EnqueueAssumption {
    Done,
    Enqueued,
    Conflict,
}

/// Change the currently active assumptions.
///
/// Backtracks to the root level. The variables of the assumptions have to exist.
pub fn set_assumptions(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut SolverStateP,
        mut TrailP,
        mut VsidsP,
    ),
    assumptions: &[Lit],
) {
    restart(ctx.borrow());

    let state = ctx.part_mut(SolverStateP);
    state.sat_state = match state.sat_state {
        SatState::Unsat => SatState::Unsat,
        _ => SatState::Unknown,
    };

    let target = ctx.part_mut(AssumptionsP);
    target.assumptions.clear();
    target.assumptions.extend_from_slice(assumptions);
    target.failed_core.clear();
}

/// Enqueue another assumption if possible.
///
/// Returns whether an assumption was enqueued, whether no assumptions are left or whether the
/// assumptions result in a conflict. On conflict the failed core is computed and the state is set
/// to [`SatState::UnsatUnderAssumptions`].
pub fn enqueue_assumption(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ImplGraphP,
        mut SolverStateP,
        mut TmpDataP,
        mut TrailP,
        ConstraintDbP,
    ),
) -> EnqueueAssumption {
    while let Some(&assumption) = ctx
        .part(AssumptionsP)
        .assumptions
        .get(ctx.part(TrailP).current_level())
    {
        match ctx.part(AssignmentP).lit_value(assumption) {
            Some(false) => {
                analyze_assumption_conflict(ctx.borrow(), assumption);
                ctx.part_mut(SolverStateP).sat_state = SatState::UnsatUnderAssumptions;
                return EnqueueAssumption::Conflict;
            }
            Some(true) => {
                // Already implied by the previous assumptions, so it needs no level of its own.
                let level = ctx.part(TrailP).current_level();
                ctx.part_mut(AssumptionsP).assumptions.remove(level);
            }
            None => {
                ctx.part_mut(TrailP).new_decision_level();
                enqueue_assignment(ctx.borrow(), assumption, Reason::Unit);
                return EnqueueAssumption::Enqueued;
            }
        }
    }
    EnqueueAssumption::Done
}

/// Compute the assumptions implying the negation of a false assumption.
///
/// Walks the implication graph backwards from the false assumption. Assignments of the root level
/// hold independently of any assumption and are not followed.
fn analyze_assumption_conflict(
    mut ctx: partial!(
        Context,
        mut AssumptionsP,
        mut TmpDataP,
        AssignmentP,
        ConstraintDbP,
        ImplGraphP,
        TrailP,
    ),
    assumption: Lit,
) {
    let (assumptions, mut ctx) = ctx.split_part_mut(AssumptionsP);
    let (tmp, ctx) = ctx.split_part_mut(TmpDataP);
    let assignment = ctx.part(AssignmentP);
    let db = ctx.part(ConstraintDbP);
    let impl_graph = ctx.part(ImplGraphP);
    let trail = ctx.part(TrailP);

    let flags = &mut tmp.flags;
    let reason_lits = &mut tmp.lits;

    assumptions.failed_core.clear();
    assumptions.failed_core.push(assumption);

    if impl_graph.level(assumption.var()) == 0 {
        return;
    }

    flags[assumption.index()] = true;
    let mut flag_count = 1;

    for &lit in trail.trail().iter().rev() {
        if !flags[lit.index()] {
            continue;
        }
        flags[lit.index()] = false;
        flag_count -= 1;

        match *impl_graph.reason(lit.var()) {
            Reason::Unit => assumptions.failed_core.push(lit),
            Reason::Constraint(cref) => {
                reason_lits.clear();
                db.constraint(cref)
                    .reason(Some(lit), assignment, impl_graph, reason_lits);
                for &reason_lit in reason_lits.iter() {
                    let index = reason_lit.index();
                    if !flags[index] && impl_graph.level(reason_lit.var()) > 0 {
                        flags[index] = true;
                        flag_count += 1;
                    }
                }
            }
        }

        if flag_count == 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::constraint::{add_constraint, Clause, Constraint, ConstraintHeader};
    use crate::context::set_var_count;
    use crate::prop::propagate;

    #[test]
    fn failed_core_skips_unrelated_assumptions() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 5);

        for clause in cnf![-1, 2; -2, -3, 4; -4, 5;].iter() {
            let id = ctx.part_mut(ConstraintDbP).issue_id();
            add_constraint(
                ctx.borrow(),
                ConstraintHeader::original(id),
                Constraint::Clause(Clause::new(clause.to_vec())),
            );
        }

        set_assumptions(ctx.borrow(), &lits![1, 4, 3, -5]);

        let mut steps = vec![];
        loop {
            let step = enqueue_assumption(ctx.borrow());
            steps.push(step);
            if step != EnqueueAssumption::Enqueued {
                break;
            }
            assert_eq!(propagate(ctx.borrow()), Ok(()));
        }

        // x4 is not implied by x1, so it gets its own level and later falsifies -5.
        assert_eq!(
            steps,
            vec![
                EnqueueAssumption::Enqueued,
                EnqueueAssumption::Enqueued,
                EnqueueAssumption::Enqueued,
                EnqueueAssumption::Conflict,
            ]
        );
        assert_eq!(
            ctx.part(SolverStateP).sat_state,
            SatState::UnsatUnderAssumptions
        );

        let mut core = ctx.part(AssumptionsP).failed_core().to_vec();
        core.sort();
        assert_eq!(core, lits![4, -5].to_vec());
        assert!(ctx.part(TmpDataP).flags.iter().all(|&flag| !flag));
    }

    #[test]
    fn implied_assumptions_are_skipped() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 3);

        let id = ctx.part_mut(ConstraintDbP).issue_id();
        add_constraint(
            ctx.borrow(),
            ConstraintHeader::original(id),
            Constraint::Clause(Clause::new(lits![-1, 2].to_vec())),
        );
        enqueue_assignment(ctx.borrow(), lit!(-3), Reason::Unit);

        set_assumptions(ctx.borrow(), &lits![1, 2, 3]);

        assert_eq!(enqueue_assumption(ctx.borrow()), EnqueueAssumption::Enqueued);
        assert_eq!(propagate(ctx.borrow()), Ok(()));
        assert_eq!(enqueue_assumption(ctx.borrow()), EnqueueAssumption::Conflict);

        assert_eq!(ctx.part(AssumptionsP).assumptions(), &lits![1, 3][..]);
        assert_eq!(ctx.part(AssumptionsP).failed_core(), &lits![3][..]);
    }
}

//! Simplification using root level assignments.

use partial_ref::{partial, PartialRef};

use crate::constraint::{collect_garbage, Constraint};
use crate::context::{parts::*, Context};
use crate::prop::Reason;

/// Remove satisfied constraints and false literals of clauses.
///
/// Cardinality and PB constraints keep their false literals, they only contribute to the slack
/// computed during propagation.
pub fn simplify(
    mut ctx: partial!(
        Context,
        mut ConstraintDbP,
        mut ImplGraphP,
        mut SolverStateP,
        mut StatsP,
        mut WatchlistsP,
        AssignmentP,
        TrailP,
    ),
) {
    assert_eq!(ctx.part(TrailP).current_level(), 0);
    assert!(ctx.part(TrailP).fully_propagated());

    {
        let (impl_graph, ctx) = ctx.split_part_mut(ImplGraphP);
        for &lit in ctx.part(TrailP).trail().iter() {
            impl_graph.update_reason(lit.var(), Reason::Unit);
        }
    }

    let (assignment, mut ctx) = ctx.split_part(AssignmentP);

    let mut removed = 0;
    {
        let db = ctx.part_mut(ConstraintDbP);
        let crefs: Vec<_> = db.live_refs().collect();
        for cref in crefs {
            if db.constraint(cref).simplify(assignment) {
                db.delete(cref);
                removed += 1;
            } else if let Constraint::Clause(clause) = db.constraint_mut(cref) {
                clause.remove_false_lits(assignment);
            }
        }
    }

    collect_garbage(ctx.borrow());

    ctx.part_mut(StatsP).satisfied_removed += removed;
    ctx.part_mut(SolverStateP).simplified_len = ctx.part(TrailP).root_len();
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::constraint::ConstraintKind;
    use crate::load::load_constraint;
    use crate::prop::propagate;

    #[test]
    fn removes_satisfied_and_false() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_constraint(ctx.borrow(), &pb![1 * 1; >= 1]).unwrap();
        load_constraint(ctx.borrow(), &pb![1 * -1, 1 * 2, 1 * 3; >= 1]).unwrap();
        load_constraint(ctx.borrow(), &pb![1 * 1, 1 * 4, 1 * 5; >= 2]).unwrap();
        load_constraint(ctx.borrow(), &pb![1 * 1, 1 * 2, 1 * 3, 1 * 4; >= 1]).unwrap();
        load_constraint(ctx.borrow(), &pb![3 * 2, 2 * 3, 1 * 4; >= 3]).unwrap();

        assert_eq!(propagate(ctx.borrow()), Ok(()));
        simplify(ctx.borrow());

        let db = ctx.part(ConstraintDbP);
        assert_eq!(db.count_by_kind(ConstraintKind::Clause), 1);
        assert_eq!(db.count_by_kind(ConstraintKind::Cardinality), 1);
        assert_eq!(db.count_by_kind(ConstraintKind::PbLong), 1);

        let clause = db
            .live_refs()
            .find(|&cref| db.constraint(cref).kind() == ConstraintKind::Clause)
            .unwrap();
        let mut clause_lits = db.constraint(clause).lits().to_vec();
        clause_lits.sort();
        assert_eq!(clause_lits, lits![2, 3].to_vec());

        assert_eq!(ctx.part(StatsP).satisfied_removed, 1);
        assert_eq!(ctx.part(SolverStateP).simplified_len, 1);
    }
}

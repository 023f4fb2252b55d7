//! Learns pseudo-Boolean constraints by cutting planes.
//!
//! The falsified constraint is added to multiples of the reasons of the literals on the conflict
//! level, taken in reverse trail order, until the sum propagates after backjumping. Each reason is
//! first weakened to the literal it propagated and the literals falsified before that, then
//! divided by the coefficient of the propagated literal with rounding up. That keeps the sum
//! falsified on the remaining trail.
use std::cmp::Reverse;

use num_bigint::BigInt;
use num_traits::{One, Signed};
use partial_ref::{partial, PartialRef};

use crate::constraint::{normalize_at_least, AtLeast, Constraint, Normalized};
use crate::context::{parts::*, Context};
use crate::lit::Lit;
use crate::prop::{Assignment, Conflict, ImplGraph, Reason};

/// Derivations with larger coefficients are abandoned.
const MAX_COEF_BITS: u64 = 256;

/// A learnt constraint and the level it propagates on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Derived {
    /// Terms sorted by descending coefficient, then unassigned literals followed by literals of
    /// descending decision level.
    pub at_least: AtLeast,
    pub backtrack_to: usize,
}

/// Derive a learnt pseudo-Boolean constraint from a conflict.
///
/// Returns `None` on the root level, when a decision is reached before the derived constraint
/// propagates or when its coefficients grow too large.
pub fn derive_constraint(
    ctx: partial!(Context, AssignmentP, ConstraintDbP, ImplGraphP, TrailP),
    conflict: Conflict,
) -> Option<Derived> {
    let assignment = ctx.part(AssignmentP);
    let impl_graph = ctx.part(ImplGraphP);
    let db = ctx.part(ConstraintDbP);
    let trail = ctx.part(TrailP);

    let level = trail.current_level();
    if level == 0 {
        return None;
    }

    let falsified = db.constraint(conflict.cref);
    let mut derived = at_least(falsified.terms(), falsified.degree())?;

    let mut trail_lits = trail.trail().iter().rev();

    while !is_assertive(&derived, level, assignment, impl_graph) {
        let &lit = trail_lits.next()?;
        if impl_graph.level(lit.var()) < level {
            return None;
        }

        let multiplier = match derived.terms.iter().find(|(_, term)| *term == !lit) {
            Some((coef, _)) => coef.clone(),
            None => continue,
        };

        let cref = match impl_graph.reason(lit.var()) {
            Reason::Constraint(cref) => *cref,
            Reason::Unit => return None,
        };

        let reason = divided_reason(db.constraint(cref), lit, assignment, impl_graph)?;

        let degree = &derived.degree + &multiplier * &reason.degree;
        let terms = derived.terms.into_iter().chain(
            reason
                .terms
                .into_iter()
                .map(|(coef, lit)| (coef * &multiplier, lit)),
        );
        derived = at_least(terms, degree)?;

        if derived.degree.bits() > MAX_COEF_BITS {
            return None;
        }
    }

    let backtrack_to =
        (0..level).find(|&target| is_assertive(&derived, target + 1, assignment, impl_graph))?;

    sort_for_watching(&mut derived, assignment, impl_graph);

    Some(Derived {
        at_least: derived,
        backtrack_to,
    })
}

/// Put unassigned literals first and order assigned ones by descending decision level, within
/// each coefficient.
fn sort_for_watching(at_least: &mut AtLeast, assignment: &Assignment, impl_graph: &ImplGraph) {
    let level = |lit: Lit| {
        if assignment.lit_is_unassigned(lit) {
            usize::max_value()
        } else {
            impl_graph.level(lit.var())
        }
    };
    at_least.terms.sort_by(|(coef_a, lit_a), (coef_b, lit_b)| {
        let key_a = (Reverse(coef_a), Reverse(level(*lit_a)));
        key_a.cmp(&(Reverse(coef_b), Reverse(level(*lit_b))))
    });
}

/// Weaken the reason of `propagated` to the literals falsified before it and divide by the
/// coefficient of `propagated`.
///
/// In the result `propagated` has coefficient one and is the only literal not falsified before it.
fn divided_reason(
    reason: &Constraint,
    propagated: Lit,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
) -> Option<AtLeast> {
    let depth = impl_graph.depth(propagated.var());

    let mut degree = reason.degree();
    let mut divisor = None;
    let mut kept = vec![];

    for (coef, lit) in reason.terms() {
        if lit == propagated {
            divisor = Some(coef.clone());
            kept.push((coef, lit));
        } else if assignment.lit_is_false(lit) && impl_graph.depth(lit.var()) < depth {
            kept.push((coef, lit));
        } else {
            degree -= coef;
        }
    }

    let divisor = divisor?;
    let terms = kept
        .into_iter()
        .map(|(coef, lit)| (div_ceil(&coef, &divisor), lit));
    at_least(terms, div_ceil(&degree, &divisor))
}

fn div_ceil(value: &BigInt, divisor: &BigInt) -> BigInt {
    (value + divisor - BigInt::one()) / divisor
}

fn at_least(terms: impl IntoIterator<Item = (BigInt, Lit)>, degree: BigInt) -> Option<AtLeast> {
    match normalize_at_least(terms, degree) {
        Normalized::Constraint(at_least) => Some(at_least),
        // An infeasible sum is left to clause learning, which derives the empty clause as well.
        Normalized::Trivial | Normalized::Infeasible => None,
    }
}

/// Whether the constraint propagates after backtracking below `level`.
fn is_assertive(
    at_least: &AtLeast,
    level: usize,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
) -> bool {
    let undone =
        |lit: Lit| assignment.lit_is_unassigned(lit) || impl_graph.level(lit.var()) >= level;

    let mut slack = -at_least.degree.clone();
    for (coef, lit) in at_least.terms.iter() {
        if undone(*lit) || !assignment.lit_is_false(*lit) {
            slack += coef;
        }
    }

    !slack.is_negative()
        && at_least
            .terms
            .iter()
            .any(|(coef, lit)| undone(*lit) && *coef > slack)
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::load::load_constraint;
    use crate::pb::{LinearConstraint, PbFormula, Relation};
    use crate::prop::{enqueue_assignment, propagate};

    fn decide(
        mut ctx: partial!(
            Context,
            mut AssignmentP,
            mut ConstraintDbP,
            mut ImplGraphP,
            mut ListenerP,
            mut StatsP,
            mut TmpDataP,
            mut TrailP,
            mut WatchlistsP,
        ),
        lit: Lit,
    ) -> Result<(), Conflict> {
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
        propagate(ctx.borrow())
    }

    #[test]
    fn reason_is_weakened_and_divided() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_constraint(ctx.borrow(), &pb![3 * 1, 3 * 2, 2 * 3, 1 * 4; >= 5]).unwrap();
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        // Without x1 the slack is 1, forcing x2 and x3
        assert_eq!(decide(ctx.borrow(), lit!(-1)), Ok(()));

        let assignment = ctx.part(AssignmentP);
        let impl_graph = ctx.part(ImplGraphP);
        let cref = match impl_graph.reason(var!(3)) {
            Reason::Constraint(cref) => *cref,
            Reason::Unit => panic!("x3 was not propagated"),
        };
        let reason = ctx.part(ConstraintDbP).constraint(cref);

        // Weakened to 3 x1 + 2 x3 >= 1, divided to 2 x1 + x3 >= 1, which is a clause
        let divided = divided_reason(reason, lit!(3), assignment, impl_graph).unwrap();
        assert_eq!(divided, AtLeast::clause(&lits![3, 1]));
    }

    #[test]
    fn pigeons_learn_implied_constraint() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        // Three pigeons in two holes, each hole takes at most one
        let mut formula = PbFormula::new();
        formula.add_clause(&lits![1, 2]);
        formula.add_clause(&lits![3, 4]);
        formula.add_clause(&lits![5, 6]);
        formula.add_constraint(pb![1 * 1, 1 * 3, 1 * 5; <= 1]);
        formula.add_constraint(pb![1 * 2, 1 * 4, 1 * 6; <= 1]);

        for constraint in formula.constraints() {
            load_constraint(ctx.borrow(), constraint).unwrap();
        }
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        let conflict = decide(ctx.borrow(), lit!(1)).unwrap_err();

        let derived = derive_constraint(ctx.borrow(), conflict).unwrap();
        assert_eq!(derived.backtrack_to, 0);

        let learnt = LinearConstraint::new(
            derived.at_least.terms.clone(),
            Relation::AtLeast,
            derived.at_least.degree.clone(),
        );
        for bits in 0..1u32 << 6 {
            let assignment: Vec<bool> = (0..6).map(|i| bits & (1 << i) != 0).collect();
            if formula.is_satisfied_by(&assignment) {
                assert!(learnt.is_satisfied_by(&assignment));
            }
        }
        // x1 is ruled out
        assert!(!learnt.is_satisfied_by(&[true, false, false, true, true, false]));
    }

    #[test]
    fn nothing_to_derive_on_root_level() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        load_constraint(ctx.borrow(), &pb![1 * -1, 1 * 2; >= 1]).unwrap();
        load_constraint(ctx.borrow(), &pb![1 * -1, 1 * -2; >= 1]).unwrap();
        load_constraint(ctx.borrow(), &pb![1 * 1; >= 1]).unwrap();

        let conflict = propagate(ctx.borrow()).unwrap_err();
        assert_eq!(derive_constraint(ctx.borrow(), conflict), None);
    }
}

//! Clauses, constraints requiring at least one true literal.
use crate::lit::Lit;
use crate::prop::{Assignment, Watchlists};

use super::{ConstraintRef, Propagation};

/// A clause of at least two literals.
///
/// The first two literals are watched. When the clause propagates, the propagated literal is moved
/// to position 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clause {
    lits: Vec<Lit>,
}

impl Clause {
    pub fn new(lits: Vec<Lit>) -> Clause {
        debug_assert!(lits.len() >= 2);
        Clause { lits }
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    /// Add the watches for this clause.
    ///
    /// Non-false literals are moved to the front, keeping the relative order otherwise. For a
    /// learnt clause this keeps the asserted literal at position 0 and the false literal of the
    /// highest level at position 1.
    pub fn attach(
        &mut self,
        cref: ConstraintRef,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
    ) {
        self.lits.sort_by_key(|&lit| assignment.lit_is_false(lit));
        watchlists.watch(cref, self.lits[0], self.lits[1]);
        watchlists.watch(cref, self.lits[1], self.lits[0]);
    }

    /// Update the clause after `false_lit` became false.
    pub fn propagate(
        &mut self,
        cref: ConstraintRef,
        false_lit: Lit,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
        forced: &mut Vec<Lit>,
    ) -> Propagation {
        let lits = &mut self.lits;

        // Keep the falsified watched literal at position 1, a propagated literal has to end up at
        // position 0.
        if lits[0] == false_lit {
            lits.swap(0, 1);
        }
        let first = lits[0];

        if assignment.lit_is_true(first) {
            return Propagation::Keep(first);
        }

        let (initial, rest) = lits.split_at_mut(2);

        for rest_lit_ref in rest.iter_mut() {
            let rest_lit = *rest_lit_ref;
            if !assignment.lit_is_false(rest_lit) {
                initial[1] = rest_lit;
                *rest_lit_ref = false_lit;
                watchlists.watch(cref, rest_lit, first);
                return Propagation::Moved;
            }
        }

        if assignment.lit_is_false(first) {
            return Propagation::Conflict;
        }

        forced.push(first);
        Propagation::Keep(first)
    }

    /// Negations of the false literals that force `propagated` or falsify the clause.
    pub fn reason(&self, propagated: Option<Lit>, out: &mut Vec<Lit>) {
        debug_assert!(propagated.map_or(true, |lit| lit == self.lits[0]));
        for &lit in self.lits.iter() {
            if Some(lit) != propagated {
                out.push(!lit);
            }
        }
    }

    /// Number of non-false literals minus one.
    pub fn slack(&self, assignment: &Assignment) -> isize {
        let non_false = self
            .lits
            .iter()
            .filter(|&&lit| !assignment.lit_is_false(lit))
            .count();
        non_false as isize - 1
    }

    /// Remove false literals.
    ///
    /// Only valid on the root level after full propagation, where both watched literals of an
    /// unsatisfied clause are unassigned.
    pub fn remove_false_lits(&mut self, assignment: &Assignment) {
        debug_assert!(!assignment.lit_is_false(self.lits[0]));
        debug_assert!(!assignment.lit_is_false(self.lits[1]));
        self.lits.retain(|&lit| !assignment.lit_is_false(lit));
    }
}

//! Cardinality constraints, requiring at least `k` true literals.
use crate::lit::Lit;
use crate::prop::{Assignment, ImplGraph, Watchlists};

use super::{ConstraintRef, Propagation};

/// At least `degree` of the literals are true.
///
/// The first `degree + 1` literals are watched. Whenever a watched literal becomes false it is
/// replaced by a non-false unwatched literal. If there is none, the remaining non-false watched
/// literals are exactly the literals that can still be true.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Card {
    lits: Vec<Lit>,
    degree: usize,
}

impl Card {
    pub fn new(lits: Vec<Lit>, degree: usize) -> Card {
        debug_assert!(degree >= 1);
        debug_assert!(degree <= lits.len());
        Card { lits, degree }
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    fn watch_count(&self) -> usize {
        (self.degree + 1).min(self.lits.len())
    }

    /// Add the watches for this constraint, preferring non-false literals.
    pub fn attach(
        &mut self,
        cref: ConstraintRef,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
    ) {
        self.lits.sort_by_key(|&lit| assignment.lit_is_false(lit));
        for &lit in self.lits[..self.watch_count()].iter() {
            watchlists.watch(cref, lit, lit);
        }
    }

    /// Update the constraint after the watched `false_lit` became false.
    pub fn propagate(
        &mut self,
        cref: ConstraintRef,
        false_lit: Lit,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
        forced: &mut Vec<Lit>,
    ) -> Propagation {
        let watch_count = self.watch_count();
        let (watched, rest) = self.lits.split_at_mut(watch_count);

        let pos = watched.iter().position(|&lit| lit == false_lit);
        debug_assert!(pos.is_some());

        if let Some(pos) = pos {
            for rest_lit_ref in rest.iter_mut() {
                let rest_lit = *rest_lit_ref;
                if !assignment.lit_is_false(rest_lit) {
                    watched[pos] = rest_lit;
                    *rest_lit_ref = false_lit;
                    watchlists.watch(cref, rest_lit, rest_lit);
                    return Propagation::Moved;
                }
            }
        }

        let non_false = watched
            .iter()
            .filter(|&&lit| !assignment.lit_is_false(lit))
            .count();

        if non_false < self.degree {
            return Propagation::Conflict;
        }

        for &lit in watched.iter() {
            if assignment.lit_is_unassigned(lit) {
                forced.push(lit);
            }
        }

        Propagation::Keep(false_lit)
    }

    /// Negations of false literals assigned before `propagated` that force it, or of enough false
    /// literals to falsify the constraint.
    pub fn reason(
        &self,
        propagated: Option<Lit>,
        assignment: &Assignment,
        impl_graph: &ImplGraph,
        out: &mut Vec<Lit>,
    ) {
        let false_count = self.lits.len() - self.degree;
        let (needed, depth_limit) = match propagated {
            Some(lit) => (false_count, impl_graph.depth(lit.var())),
            None => (false_count + 1, usize::max_value()),
        };

        let mut found = 0;
        for &lit in self.lits.iter() {
            if found == needed {
                break;
            }
            if assignment.lit_is_false(lit) && impl_graph.depth(lit.var()) < depth_limit {
                out.push(!lit);
                found += 1;
            }
        }
        debug_assert_eq!(found, needed);
    }

    /// Number of non-false literals minus the degree.
    pub fn slack(&self, assignment: &Assignment) -> isize {
        let non_false = self
            .lits
            .iter()
            .filter(|&&lit| !assignment.lit_is_false(lit))
            .count();
        non_false as isize - self.degree as isize
    }

    /// The clause over `n - degree + 1` of the literals, if it is shorter than half the
    /// constraint.
    pub fn implied_clause(&self) -> Option<Vec<Lit>> {
        let len = self.lits.len() - self.degree + 1;
        if len * 2 < self.lits.len() {
            Some(self.lits[..len].to_vec())
        } else {
            None
        }
    }
}

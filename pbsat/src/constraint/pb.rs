//! General pseudo-Boolean constraints.
use num_bigint::BigInt;

use crate::lit::Lit;
use crate::prop::{Assignment, ImplGraph, Watchlists};

use super::coef::Coef;
use super::{ConstraintRef, Propagation};

/// `Σ coefs[i]·lits[i] >= degree` with positive coefficients sorted in descending order.
///
/// The order of the literals never changes. Which literals are watched is stored as a flag per
/// literal. The watched non-false literals always either have coefficients summing to at least
/// `degree + coefs[0]`, so that no single falsification can make the constraint propagate, or
/// include every non-false literal.
#[derive(Clone, Debug)]
pub struct PbConstraint<C> {
    coefs: Vec<C>,
    lits: Vec<Lit>,
    degree: C,
    sum_coefs: C,
    watched: Vec<bool>,
}

impl<C: Coef> PbConstraint<C> {
    pub fn new(coefs: Vec<C>, lits: Vec<Lit>, degree: C) -> PbConstraint<C> {
        debug_assert_eq!(coefs.len(), lits.len());
        debug_assert!(!coefs.is_empty());
        debug_assert!(coefs.windows(2).all(|pair| pair[0] >= pair[1]));

        let mut sum_coefs = C::zero();
        for coef in coefs.iter() {
            sum_coefs += coef;
        }
        debug_assert!(sum_coefs >= degree);

        let watched = vec![false; lits.len()];

        PbConstraint {
            coefs,
            lits,
            degree,
            sum_coefs,
            watched,
        }
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn coefs(&self) -> &[C] {
        &self.coefs
    }

    pub fn degree(&self) -> &C {
        &self.degree
    }

    fn position(&self, lit: Lit) -> Option<usize> {
        self.lits.iter().position(|&other| other == lit)
    }

    /// Sum of the coefficients of the watched non-false literals minus the degree.
    fn watch_slack(&self, assignment: &Assignment) -> C {
        let mut slack = C::zero();
        slack -= &self.degree;
        for ((&lit, coef), &watched) in self.lits.iter().zip(&self.coefs).zip(&self.watched) {
            if watched && !assignment.lit_is_false(lit) {
                slack += coef;
            }
        }
        slack
    }

    /// Watch non-false literals until no single falsification can propagate.
    pub fn attach(
        &mut self,
        cref: ConstraintRef,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
    ) {
        let mut slack = C::zero();
        slack -= &self.degree;
        for index in 0..self.lits.len() {
            if slack >= self.coefs[0] {
                break;
            }
            let lit = self.lits[index];
            if !assignment.lit_is_false(lit) {
                self.watched[index] = true;
                watchlists.watch(cref, lit, lit);
                slack += &self.coefs[index];
            }
        }
    }

    /// Update the watches after the watched `false_lit` became false.
    pub fn propagate(
        &mut self,
        cref: ConstraintRef,
        false_lit: Lit,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
        forced: &mut Vec<Lit>,
    ) -> Propagation {
        let pos = self.position(false_lit);
        debug_assert!(pos.map_or(false, |pos| self.watched[pos]));

        let mut slack = self.watch_slack(assignment);

        if slack < self.coefs[0] {
            for index in 0..self.lits.len() {
                let lit = self.lits[index];
                if !self.watched[index] && !assignment.lit_is_false(lit) {
                    self.watched[index] = true;
                    watchlists.watch(cref, lit, lit);
                    slack += &self.coefs[index];
                    if slack >= self.coefs[0] {
                        break;
                    }
                }
            }
        }

        if slack >= self.coefs[0] {
            if let Some(pos) = pos {
                self.watched[pos] = false;
            }
            return Propagation::Moved;
        }

        // All non-false literals are watched now, so `slack` is exact.
        if slack < C::zero() {
            return Propagation::Conflict;
        }

        for (&lit, coef) in self.lits.iter().zip(&self.coefs) {
            if *coef <= slack {
                break;
            }
            if assignment.lit_is_unassigned(lit) {
                forced.push(lit);
            }
        }

        Propagation::Keep(false_lit)
    }

    /// Negations of the false literals explaining a propagation or a conflict.
    ///
    /// Literals are taken in constraint order, largest coefficients first, until the remaining
    /// literals cannot reach the degree without `propagated`, or cannot reach it at all for a
    /// conflict. For a propagation only literals falsified before `propagated` are used.
    pub fn reason(
        &self,
        propagated: Option<Lit>,
        assignment: &Assignment,
        impl_graph: &ImplGraph,
        out: &mut Vec<Lit>,
    ) {
        let (threshold, depth_limit) = match propagated {
            Some(lit) => {
                let threshold = match self.position(lit) {
                    Some(pos) => self.coefs[pos].clone(),
                    None => C::zero(),
                };
                (threshold, impl_graph.depth(lit.var()))
            }
            None => (C::zero(), usize::max_value()),
        };

        let mut remaining = self.sum_coefs.clone();
        remaining -= &self.degree;

        for (&lit, coef) in self.lits.iter().zip(&self.coefs) {
            if remaining < threshold {
                break;
            }
            if assignment.lit_is_false(lit) && impl_graph.depth(lit.var()) < depth_limit {
                out.push(!lit);
                remaining -= coef;
            }
        }

        debug_assert!(remaining < threshold);
    }

    /// Sum of the coefficients of non-false literals minus the degree.
    pub fn slack(&self, assignment: &Assignment) -> C {
        let mut slack = C::zero();
        slack -= &self.degree;
        for (&lit, coef) in self.lits.iter().zip(&self.coefs) {
            if !assignment.lit_is_false(lit) {
                slack += coef;
            }
        }
        slack
    }

    /// Whether the true literals alone reach the degree.
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        let mut sum = C::zero();
        for (&lit, coef) in self.lits.iter().zip(&self.coefs) {
            if assignment.lit_is_true(lit) {
                sum += coef;
                if sum >= self.degree {
                    return true;
                }
            }
        }
        false
    }

    /// Whether the constraint propagates after backtracking below `level`.
    ///
    /// Literals falsified on `level` or above count as unassigned.
    pub fn is_assertive(
        &self,
        level: usize,
        assignment: &Assignment,
        impl_graph: &ImplGraph,
    ) -> bool {
        let undone = |lit: Lit| {
            assignment.lit_is_unassigned(lit) || impl_graph.level(lit.var()) >= level
        };

        let mut slack = C::zero();
        slack -= &self.degree;
        for (&lit, coef) in self.lits.iter().zip(&self.coefs) {
            if !assignment.lit_is_false(lit) || undone(lit) {
                slack += coef;
            }
        }

        if slack < C::zero() {
            return false;
        }

        self.lits
            .iter()
            .zip(&self.coefs)
            .any(|(&lit, coef)| undone(lit) && slack < *coef)
    }

    /// The clause over the shortest prefix of literals whose falsification violates the
    /// constraint, if it is shorter than half the constraint.
    pub fn implied_clause(&self) -> Option<Vec<Lit>> {
        let mut suffix = self.sum_coefs.clone();
        let mut len = 0;
        while len < self.lits.len() && suffix >= self.degree {
            suffix -= &self.coefs[len];
            len += 1;
        }
        if len > 0 && len * 2 < self.lits.len() {
            Some(self.lits[..len].to_vec())
        } else {
            None
        }
    }

    /// The coefficients and the degree in arbitrary precision.
    pub fn to_big(&self) -> PbConstraint<BigInt> {
        PbConstraint {
            coefs: self.coefs.iter().map(Coef::to_big).collect(),
            lits: self.lits.clone(),
            degree: self.degree.to_big(),
            sum_coefs: self.sum_coefs.to_big(),
            watched: self.watched.clone(),
        }
    }

    /// Literal-coefficient pairs in a canonical order.
    fn sorted_terms(&self) -> Vec<(Lit, &C)> {
        let mut terms: Vec<_> = self.lits.iter().cloned().zip(&self.coefs).collect();
        terms.sort();
        terms
    }
}

/// Equal when the degrees and the multisets of literal-coefficient pairs agree.
impl<C: Coef> PartialEq for PbConstraint<C> {
    fn eq(&self, other: &PbConstraint<C>) -> bool {
        self.degree == other.degree && self.sorted_terms() == other.sorted_terms()
    }
}

impl<C: Coef> Eq for PbConstraint<C> {}

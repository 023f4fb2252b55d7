//! Normalization of linear constraints into `Σ coef·lit >= degree` with positive coefficients.
use std::cmp::Reverse;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;

use crate::lit::{Lit, Var};
use crate::pb::{LinearConstraint, Relation};

/// A constraint `Σ coef·lit >= degree` in normal form.
///
/// Every variable occurs once, all coefficients are positive and at most the degree, the degree
/// is positive and at most the sum of the coefficients. Terms are sorted by descending
/// coefficient. [`normalize_at_least`] breaks ties by descending literal, learnt constraints by
/// descending decision level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtLeast {
    pub terms: Vec<(BigInt, Lit)>,
    pub degree: BigInt,
}

impl AtLeast {
    /// The clause over `lits`, keeping their order.
    ///
    /// The variables of `lits` have to be distinct.
    pub fn clause(lits: &[Lit]) -> AtLeast {
        AtLeast {
            terms: lits.iter().map(|&lit| (BigInt::one(), lit)).collect(),
            degree: BigInt::one(),
        }
    }

    pub fn lits(&self) -> impl Iterator<Item = Lit> + '_ {
        self.terms.iter().map(|&(_, lit)| lit)
    }

    /// All coefficients are one.
    pub fn is_cardinality(&self) -> bool {
        self.terms.iter().all(|(coef, _)| coef.is_one())
    }
}

/// Result of normalizing a single `>=` constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Normalized {
    /// Satisfied by every assignment.
    Trivial,
    /// Violated by every assignment.
    Infeasible,
    Constraint(AtLeast),
}

/// Normalize `Σ coef·lit >= degree`.
///
/// Occurrences of the same variable are merged, a literal and its negation cancel into the degree.
/// Negative coefficients are made positive by negating the literal. Coefficients larger than the
/// degree are reduced to the degree. If every coefficient reaches the degree, the constraint is
/// the clause over its literals.
pub fn normalize_at_least(
    terms: impl IntoIterator<Item = (BigInt, Lit)>,
    degree: BigInt,
) -> Normalized {
    let mut degree = degree;

    // Coefficient of the positive literal per variable, in order of first occurrence.
    let mut index: FxHashMap<Var, usize> = FxHashMap::default();
    let mut merged: Vec<(Var, BigInt)> = vec![];

    for (coef, lit) in terms {
        if coef.is_zero() {
            continue;
        }
        let slot = *index.entry(lit.var()).or_insert_with(|| {
            merged.push((lit.var(), BigInt::zero()));
            merged.len() - 1
        });
        if lit.is_negative() {
            // c·!x = c - c·x
            degree -= &coef;
            merged[slot].1 -= coef;
        } else {
            merged[slot].1 += coef;
        }
    }

    let mut normalized = vec![];

    for (var, coef) in merged {
        if coef.is_positive() {
            normalized.push((coef, var.positive()));
        } else if coef.is_negative() {
            // c·x = c - (-c)·!x
            degree -= &coef;
            normalized.push((-coef, var.negative()));
        }
    }

    if !degree.is_positive() {
        return Normalized::Trivial;
    }

    let mut sum = BigInt::zero();
    for (coef, _) in normalized.iter_mut() {
        if *coef > degree {
            *coef = degree.clone();
        }
        sum += &*coef;
    }

    if sum < degree {
        return Normalized::Infeasible;
    }

    if normalized.iter().all(|(coef, _)| *coef == degree) {
        for (coef, _) in normalized.iter_mut() {
            *coef = BigInt::one();
        }
        degree = BigInt::one();
    }

    sort_terms(&mut normalized);

    Normalized::Constraint(AtLeast {
        terms: normalized,
        degree,
    })
}

/// Normalize a linear constraint of any relation.
///
/// An equality yields the normalized `>=` and `<=` halves.
pub fn normalize(constraint: &LinearConstraint) -> Vec<Normalized> {
    let at_least = || normalize_at_least(constraint.terms.iter().cloned(), constraint.rhs.clone());
    let at_most = || {
        normalize_at_least(
            constraint
                .terms
                .iter()
                .map(|(coef, lit)| (-coef, *lit)),
            -&constraint.rhs,
        )
    };

    match constraint.relation {
        Relation::AtLeast => vec![at_least()],
        Relation::AtMost => vec![at_most()],
        Relation::Equal => vec![at_least(), at_most()],
    }
}

/// Sort terms by descending coefficient, ties broken by descending literal.
pub fn sort_terms(terms: &mut [(BigInt, Lit)]) {
    terms.sort_by_key(|(coef, lit)| Reverse((coef.clone(), *lit)));
}

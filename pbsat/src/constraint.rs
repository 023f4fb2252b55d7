//! Constraints over literals.
//!
//! Clauses, cardinality constraints and general pseudo-Boolean constraints are all stored as a
//! [`Constraint`] and share the same interface for watching, propagating and explaining
//! propagations. Every stored constraint has the form `Σ coef·lit >= degree` with positive
//! coefficients, see [`normalize`].
use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};

use crate::lit::Lit;
use crate::prop::{Assignment, ImplGraph, Watchlists};

mod activity;
mod card;
mod clause;
mod coef;
mod db;
mod normalize;
mod pb;
mod reduce;

pub use activity::{bump_constraint_activity, decay_constraint_activities, ConstraintActivity};
pub use card::Card;
pub use clause::Clause;
pub use coef::{fits_fixed_width, Coef};
pub use db::{
    add_constraint, collect_garbage, ConstraintDb, ConstraintHeader, ConstraintId, ConstraintRef,
};
pub use normalize::{normalize, normalize_at_least, AtLeast, Normalized};
pub use pb::PbConstraint;
pub use reduce::reduce_learnts;

/// Representation chosen for a stored constraint.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ConstraintKind {
    /// At least one literal is true.
    Clause = 0,
    /// At least `k` literals are true.
    Cardinality = 1,
    /// Pseudo-Boolean constraint with coefficients in fixed width arithmetic.
    PbLong = 2,
    /// Pseudo-Boolean constraint with arbitrary precision coefficients.
    PbBig = 3,
}

impl ConstraintKind {
    /// Total number of kinds.
    pub const fn count() -> usize {
        4
    }

    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Clause => "clause",
            ConstraintKind::Cardinality => "cardinality",
            ConstraintKind::PbLong => "pb-long",
            ConstraintKind::PbBig => "pb-big",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of updating a constraint after a watched literal became false.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Propagation {
    /// Keep the watch, using the given blocking literal.
    Keep(Lit),
    /// The watch was replaced by watches on other literals.
    Moved,
    /// The constraint is falsified.
    Conflict,
}

/// A stored constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    Clause(Clause),
    Card(Card),
    PbLong(PbConstraint<i64>),
    PbBig(PbConstraint<BigInt>),
}

impl Default for Constraint {
    fn default() -> Constraint {
        Constraint::Clause(Clause::default())
    }
}

/// Evaluates `$body` with `$inner` bound to the constraint of any variant.
macro_rules! dispatch {
    ($constraint:expr, $inner:ident => $body:expr) => {
        match $constraint {
            Constraint::Clause($inner) => $body,
            Constraint::Card($inner) => $body,
            Constraint::PbLong($inner) => $body,
            Constraint::PbBig($inner) => $body,
        }
    };
}

/// Choose the representation for a normalized constraint of at least two literals.
///
/// The first matching rule wins: degree one gives a clause, unit coefficients a cardinality
/// constraint, coefficients that [fit](fits_fixed_width) a fixed width pseudo-Boolean constraint
/// and everything else an arbitrary precision pseudo-Boolean constraint.
pub fn build_constraint(at_least: AtLeast) -> Constraint {
    debug_assert!(at_least.terms.len() >= 2);

    if at_least.degree.is_one() {
        return Constraint::Clause(Clause::new(at_least.lits().collect()));
    }

    if at_least.is_cardinality() {
        if let Some(degree) = at_least.degree.to_usize() {
            return Constraint::Card(Card::new(at_least.lits().collect(), degree));
        }
    }

    let AtLeast { terms, degree } = at_least;
    let (coefs, lits): (Vec<BigInt>, Vec<Lit>) = terms.into_iter().unzip();

    if fits_fixed_width(&coefs, &degree) {
        let long_coefs: Option<Vec<i64>> = coefs.iter().map(i64::from_big).collect();
        if let (Some(long_coefs), Some(long_degree)) = (long_coefs, i64::from_big(&degree)) {
            return Constraint::PbLong(PbConstraint::new(long_coefs, lits, long_degree));
        }
    }

    Constraint::PbBig(PbConstraint::new(coefs, lits, degree))
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Clause(_) => ConstraintKind::Clause,
            Constraint::Card(_) => ConstraintKind::Cardinality,
            Constraint::PbLong(_) => ConstraintKind::PbLong,
            Constraint::PbBig(_) => ConstraintKind::PbBig,
        }
    }

    pub fn lits(&self) -> &[Lit] {
        dispatch!(self, inner => inner.lits())
    }

    pub fn degree(&self) -> BigInt {
        match self {
            Constraint::Clause(_) => BigInt::one(),
            Constraint::Card(card) => BigInt::from(card.degree()),
            Constraint::PbLong(pb) => BigInt::from(*pb.degree()),
            Constraint::PbBig(pb) => pb.degree().clone(),
        }
    }

    /// Coefficient-literal pairs in the stored order.
    pub fn terms(&self) -> Vec<(BigInt, Lit)> {
        match self {
            Constraint::Clause(_) | Constraint::Card(_) => self
                .lits()
                .iter()
                .map(|&lit| (BigInt::one(), lit))
                .collect(),
            Constraint::PbLong(pb) => pb
                .coefs()
                .iter()
                .zip(pb.lits())
                .map(|(&coef, &lit)| (BigInt::from(coef), lit))
                .collect(),
            Constraint::PbBig(pb) => pb
                .coefs()
                .iter()
                .cloned()
                .zip(pb.lits().iter().cloned())
                .collect(),
        }
    }

    /// Add the watches for this constraint.
    pub fn attach(
        &mut self,
        cref: ConstraintRef,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
    ) {
        dispatch!(self, inner => inner.attach(cref, assignment, watchlists))
    }

    /// Update the constraint after the watched `false_lit` became false.
    ///
    /// Literals forced by the constraint are appended to `forced`.
    pub fn propagate(
        &mut self,
        cref: ConstraintRef,
        false_lit: Lit,
        assignment: &Assignment,
        watchlists: &mut Watchlists,
        forced: &mut Vec<Lit>,
    ) -> Propagation {
        dispatch!(self, inner => inner.propagate(cref, false_lit, assignment, watchlists, forced))
    }

    /// Append the negations of false literals that explain a propagation of `propagated` or, when
    /// `None`, the falsification of the constraint.
    ///
    /// These are the true literals implying the propagation in the implication graph.
    pub fn reason(
        &self,
        propagated: Option<Lit>,
        assignment: &Assignment,
        impl_graph: &ImplGraph,
        out: &mut Vec<Lit>,
    ) {
        match self {
            Constraint::Clause(clause) => clause.reason(propagated, out),
            Constraint::Card(card) => card.reason(propagated, assignment, impl_graph, out),
            Constraint::PbLong(pb) => pb.reason(propagated, assignment, impl_graph, out),
            Constraint::PbBig(pb) => pb.reason(propagated, assignment, impl_graph, out),
        }
    }

    /// Sum of the coefficients of non-false literals minus the degree.
    pub fn slack(&self, assignment: &Assignment) -> BigInt {
        match self {
            Constraint::Clause(clause) => BigInt::from(clause.slack(assignment)),
            Constraint::Card(card) => BigInt::from(card.slack(assignment)),
            Constraint::PbLong(pb) => BigInt::from(pb.slack(assignment)),
            Constraint::PbBig(pb) => pb.slack(assignment),
        }
    }

    /// Append the unassigned literals whose coefficient exceeds the slack.
    ///
    /// The slack has to be non-negative.
    pub fn forced_lits(&self, assignment: &Assignment, out: &mut Vec<Lit>) {
        match self {
            Constraint::Clause(_) | Constraint::Card(_) => {
                if self.slack(assignment).is_zero() {
                    for &lit in self.lits() {
                        if assignment.lit_is_unassigned(lit) {
                            out.push(lit);
                        }
                    }
                }
            }
            Constraint::PbLong(pb) => forced_pb_lits(pb, assignment, out),
            Constraint::PbBig(pb) => forced_pb_lits(pb, assignment, out),
        }
    }

    /// Whether the constraint is satisfied by the current assignment.
    ///
    /// On the root level a satisfied constraint can be discarded. Does not modify the constraint.
    pub fn simplify(&self, assignment: &Assignment) -> bool {
        match self {
            Constraint::Clause(clause) => {
                clause.lits().iter().any(|&lit| assignment.lit_is_true(lit))
            }
            Constraint::Card(card) => {
                let true_count = card
                    .lits()
                    .iter()
                    .filter(|&&lit| assignment.lit_is_true(lit))
                    .count();
                true_count >= card.degree()
            }
            Constraint::PbLong(pb) => pb.is_satisfied(assignment),
            Constraint::PbBig(pb) => pb.is_satisfied(assignment),
        }
    }

    /// Whether the constraint propagates a literal when all assignments on `level` and above are
    /// undone.
    pub fn is_assertive(
        &self,
        level: usize,
        assignment: &Assignment,
        impl_graph: &ImplGraph,
    ) -> bool {
        match self {
            Constraint::Clause(clause) => {
                unit_coefs_assertive(clause.lits(), 1, level, assignment, impl_graph)
            }
            Constraint::Card(card) => {
                unit_coefs_assertive(card.lits(), card.degree(), level, assignment, impl_graph)
            }
            Constraint::PbLong(pb) => pb.is_assertive(level, assignment, impl_graph),
            Constraint::PbBig(pb) => pb.is_assertive(level, assignment, impl_graph),
        }
    }

    /// A clause over the literals with the largest coefficients implied by this constraint alone.
    ///
    /// Only returned when it is less than half the size of the constraint.
    pub fn compute_implied_clause(&self) -> Option<Vec<Lit>> {
        match self {
            Constraint::Clause(_) => None,
            Constraint::Card(card) => card.implied_clause(),
            Constraint::PbLong(pb) => pb.implied_clause(),
            Constraint::PbBig(pb) => pb.implied_clause(),
        }
    }
}

fn forced_pb_lits<C: Coef>(pb: &PbConstraint<C>, assignment: &Assignment, out: &mut Vec<Lit>) {
    let slack = pb.slack(assignment);
    debug_assert!(slack >= C::zero());
    for (&lit, coef) in pb.lits().iter().zip(pb.coefs()) {
        if *coef <= slack {
            break;
        }
        if assignment.lit_is_unassigned(lit) {
            out.push(lit);
        }
    }
}

/// [`Constraint::is_assertive`] for constraints with unit coefficients.
fn unit_coefs_assertive(
    lits: &[Lit],
    degree: usize,
    level: usize,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
) -> bool {
    let mut non_false = 0;
    let mut any_undone = false;
    for &lit in lits {
        let undone = assignment.lit_is_unassigned(lit) || impl_graph.level(lit.var()) >= level;
        if undone || !assignment.lit_is_false(lit) {
            non_false += 1;
        }
        any_undone |= undone;
    }
    // With unit coefficients a literal is forced exactly when the slack is zero.
    non_false == degree && any_undone
}

//! Linear pseudo-Boolean constraints and objectives.
use std::cmp::max;
use std::fmt;

use num_traits::Zero;
use serde::{Deserialize, Serialize};

pub use num_bigint::BigInt;

use crate::lit::Lit;

/// Comparison between the weighted sum and the right hand side.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub enum Relation {
    AtLeast,
    AtMost,
    Equal,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Relation::AtLeast => ">=",
            Relation::AtMost => "<=",
            Relation::Equal => "=",
        })
    }
}

/// `Σ coef·lit ⋈ rhs` where a literal counts as 1 when true and 0 when false.
///
/// Coefficients may be negative and literals may repeat, the solver normalizes on load.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub terms: Vec<(BigInt, Lit)>,
    pub relation: Relation,
    pub rhs: BigInt,
}

impl LinearConstraint {
    pub fn new(
        terms: Vec<(BigInt, Lit)>,
        relation: Relation,
        rhs: impl Into<BigInt>,
    ) -> LinearConstraint {
        LinearConstraint {
            terms,
            relation,
            rhs: rhs.into(),
        }
    }

    /// A clause as the constraint `Σ lit >= 1`.
    pub fn clause(lits: &[Lit]) -> LinearConstraint {
        LinearConstraint::new(
            lits.iter().map(|&lit| (BigInt::from(1), lit)).collect(),
            Relation::AtLeast,
            1,
        )
    }

    /// At least `degree` of `lits` are true.
    pub fn at_least(lits: &[Lit], degree: impl Into<BigInt>) -> LinearConstraint {
        LinearConstraint::new(
            lits.iter().map(|&lit| (BigInt::from(1), lit)).collect(),
            Relation::AtLeast,
            degree,
        )
    }

    /// One more than the largest variable index used.
    pub fn var_count(&self) -> usize {
        self.terms
            .iter()
            .map(|(_, lit)| lit.index() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Weighted sum of the true literals under `assignment` (indexed by variable).
    pub fn lhs_value(&self, assignment: &[bool]) -> BigInt {
        weighted_sum(&self.terms, assignment)
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        let lhs = self.lhs_value(assignment);
        match self.relation {
            Relation::AtLeast => lhs >= self.rhs,
            Relation::AtMost => lhs <= self.rhs,
            Relation::Equal => lhs == self.rhs,
        }
    }
}

impl fmt::Display for LinearConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (coef, lit) in self.terms.iter() {
            write!(f, "{:+} {} ", coef, lit)?;
        }
        write!(f, "{} {}", self.relation, self.rhs)
    }
}

/// A linear function to minimize.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Objective {
    pub terms: Vec<(BigInt, Lit)>,
}

impl Objective {
    pub fn new(terms: Vec<(BigInt, Lit)>) -> Objective {
        Objective { terms }
    }

    /// Objective value under `assignment` (indexed by variable).
    pub fn value(&self, assignment: &[bool]) -> BigInt {
        weighted_sum(&self.terms, assignment)
    }

    /// Constraint stating that the objective is at most `bound`.
    pub fn at_most(&self, bound: BigInt) -> LinearConstraint {
        LinearConstraint::new(self.terms.clone(), Relation::AtMost, bound)
    }
}

fn weighted_sum(terms: &[(BigInt, Lit)], assignment: &[bool]) -> BigInt {
    let mut sum = BigInt::zero();
    for (coef, lit) in terms.iter() {
        if assignment.get(lit.index()) == Some(&lit.is_positive()) {
            sum += coef;
        }
    }
    sum
}

/// A set of linear constraints with an optional objective.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PbFormula {
    var_count: usize,
    constraints: Vec<LinearConstraint>,
    objective: Option<Objective>,
}

impl PbFormula {
    pub fn new() -> PbFormula {
        PbFormula::default()
    }

    pub fn var_count(&self) -> usize {
        self.var_count
    }

    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count);
    }

    pub fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.var_count = max(self.var_count, constraint.var_count());
        self.constraints.push(constraint);
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.add_constraint(LinearConstraint::clause(lits));
    }

    pub fn set_objective(&mut self, objective: Objective) {
        for (_, lit) in objective.terms.iter() {
            self.var_count = max(self.var_count, lit.index() + 1);
        }
        self.objective = Some(objective);
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.is_satisfied_by(assignment))
    }
}

//! Clause sets and their pseudo-Boolean view.
use std::cmp::max;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lit::Lit;
use crate::pb::{LinearConstraint, PbFormula};

/// A conjunction of clauses.
///
/// Clauses are stored back to back in a single literal buffer. Clause `i` ends at `ends[i]` and
/// starts where clause `i - 1` ends.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnfFormula {
    var_count: usize,
    lits: Vec<Lit>,
    ends: Vec<usize>,
}

impl CnfFormula {
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// One more than the largest variable index used or reserved.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Reserve variables up to `count`, never lowers the variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Append a clause given as literals or references to literals.
    pub fn add_clause<L>(&mut self, lits: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.lits.len();
        self.lits.extend(lits);

        for lit in &self.lits[begin..] {
            self.var_count = max(self.var_count, lit.index() + 1);
        }

        self.ends.push(self.lits.len());
    }

    /// The clause at position `index`.
    ///
    /// Panics when `index` is not less than [`len`](CnfFormula::len).
    pub fn clause(&self, index: usize) -> &[Lit] {
        let begin = if index == 0 { 0 } else { self.ends[index - 1] };
        &self.lits[begin..self.ends[index]]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        (0..self.len()).map(move |index| self.clause(index))
    }

    /// Position of the first clause without a literal that is true under `assignment`.
    ///
    /// `assignment` is indexed by variable, missing variables count as false.
    pub fn first_falsified(&self, assignment: &[bool]) -> Option<usize> {
        self.iter().position(|clause| {
            !clause
                .iter()
                .any(|lit| assignment.get(lit.index()) == Some(&lit.is_positive()))
        })
    }

    pub fn is_satisfied_by(&self, assignment: &[bool]) -> bool {
        self.first_falsified(assignment).is_none()
    }

    /// The clauses as linear constraints `Σ lit >= 1`.
    pub fn linear_constraints(&self) -> impl Iterator<Item = LinearConstraint> + '_ {
        self.iter().map(LinearConstraint::clause)
    }
}

impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(clauses: F) -> CnfFormula {
        let mut formula = CnfFormula::new();
        clauses
            .into_iter()
            .for_each(|clause| formula.add_clause(clause));
        formula
    }
}

/// A pseudo-Boolean formula without objective, keeping the variable count.
impl From<&CnfFormula> for PbFormula {
    fn from(cnf: &CnfFormula) -> PbFormula {
        let mut formula = PbFormula::new();
        formula.set_var_count(cnf.var_count());
        for constraint in cnf.linear_constraints() {
            formula.add_constraint(constraint);
        }
        formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CnfFormula")
            .field("var_count", &self.var_count)
            .field("clauses", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

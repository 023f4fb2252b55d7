//! Satisfying assignments.
use serde::{Deserialize, Serialize};

use crate::lit::{Lit, Var};
use crate::prop::Assignment;

/// A full assignment satisfying the formula.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    values: Vec<bool>,
}

impl Model {
    /// Copy a full assignment.
    pub(crate) fn from_assignment(assignment: &Assignment) -> Model {
        Model {
            values: assignment
                .assignment()
                .iter()
                .map(|value| value.unwrap_or(false))
                .collect(),
        }
    }

    /// Number of variables of the model.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Value of a variable, variables unknown to the solver are false.
    pub fn value(&self, var: Var) -> bool {
        self.values.get(var.index()).cloned().unwrap_or(false)
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.value(lit.var()) ^ lit.is_negative()
    }

    /// The true literal of every variable.
    pub fn lits(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &value)| Lit::from_index(index, value))
            .collect()
    }

    /// Values indexed by variable, as used by the `is_satisfied_by` checks of formulas.
    pub fn assignment(&self) -> &[bool] {
        &self.values
    }
}

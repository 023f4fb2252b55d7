//! The implication graph.
use crate::constraint::ConstraintRef;
use crate::lit::{LitIdx, Var};

/// Cause of an assignment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// A decision, an assumption or a fact of the root level.
    Unit,
    /// Propagated by a stored constraint.
    Constraint(ConstraintRef),
}

impl Reason {
    /// True if a unit clause or assumption and not a propagation.
    pub fn is_unit(&self) -> bool {
        match self {
            Reason::Unit => true,
            _ => false,
        }
    }
}

/// A constraint falsified by the current assignment.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Conflict {
    pub cref: ConstraintRef,
}

/// Node and incoming edges of the implication graph.
#[derive(Copy, Clone)]
pub struct ImplNode {
    pub reason: Reason,
    pub level: LitIdx,
    /// Position in the trail when assigned.
    pub depth: LitIdx,
}

/// The implication graph.
///
/// This is a DAG having all assigned variables as nodes. Decisions, assumptions and root level
/// facts are sources. A propagated assignment has incoming edges from the assignments that made its
/// reason constraint propagate, which are always earlier in the trail.
#[derive(Default)]
pub struct ImplGraph {
    /// Contains only valid data for indices of assigned variables.
    pub nodes: Vec<ImplNode>,
}

impl ImplGraph {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.nodes.resize(
            count,
            ImplNode {
                reason: Reason::Unit,
                level: 0,
                depth: 0,
            },
        );
    }

    /// Get the reason for an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn reason(&self, var: Var) -> &Reason {
        &self.nodes[var.index()].reason
    }

    /// Get the decision level of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn level(&self, var: Var) -> usize {
        self.nodes[var.index()].level as usize
    }

    /// Get the trail depth of an assigned variable.
    ///
    /// Returns stale data if the variable isn't assigned.
    pub fn depth(&self, var: Var) -> usize {
        self.nodes[var.index()].depth as usize
    }

    /// Updates the reason for an assigned variable.
    pub fn update_reason(&mut self, var: Var, reason: Reason) {
        self.nodes[var.index()].reason = reason
    }
}

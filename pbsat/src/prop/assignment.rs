//! Partial assignment and the trail.
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::lit::{Lit, LitIdx, Var};

use super::Reason;

/// Current partial assignment.
#[derive(Default)]
pub struct Assignment {
    assignment: Vec<Option<bool>>,
    /// Value each variable had when it was last unassigned, used for phase saving.
    last_value: Vec<bool>,
}

impl Assignment {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.assignment.resize(count, None);
        self.last_value.resize(count, false);
    }

    /// Current partial assignment as slice.
    pub fn assignment(&self) -> &[Option<bool>] {
        &self.assignment
    }

    pub fn var_value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// The last value of a variable, false if it was never assigned.
    pub fn last_var_value(&self, var: Var) -> bool {
        self.last_value[var.index()]
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_positive())
    }

    pub fn lit_is_false(&self, lit: Lit) -> bool {
        self.assignment[lit.index()] == Some(lit.is_negative())
    }

    pub fn lit_is_unassigned(&self, lit: Lit) -> bool {
        self.assignment[lit.index()].is_none()
    }

    pub fn assign_lit(&mut self, lit: Lit) {
        self.assignment[lit.index()] = lit.is_positive().into()
    }

    /// Unassign a variable, remembering its value.
    pub fn unassign_var(&mut self, var: Var) {
        if let Some(value) = self.assignment[var.index()].take() {
            self.last_value[var.index()] = value;
        }
    }
}

/// Decision and propagation history.
#[derive(Default)]
pub struct Trail {
    /// Stack of all propagated and all enqueued assignments
    trail: Vec<Lit>,
    /// Next assignment in trail to propagate
    queue_head_pos: usize,
    /// Decision levels as trail indices.
    decisions: Vec<LitIdx>,
}

impl Trail {
    /// Return the next assigned literal to propagate.
    pub fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).cloned()
    }

    pub fn pop_queue(&mut self) {
        self.queue_head_pos += 1;
        debug_assert!(self.queue_head_pos <= self.trail.len());
    }

    /// Assigned literals in assignment order.
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    /// Start a new decision level.
    ///
    /// Does not enqueue the decision itself.
    pub fn new_decision_level(&mut self) {
        self.decisions.push(self.trail.len() as LitIdx)
    }

    /// Current decision level.
    pub fn current_level(&self) -> usize {
        self.decisions.len()
    }

    /// Whether all assignments are propagated.
    pub fn fully_propagated(&self) -> bool {
        self.queue_head_pos == self.trail.len()
    }

    /// Number of assignments made at the root level.
    pub fn root_len(&self) -> usize {
        match self.decisions.first() {
            Some(&start) => start as usize,
            None => self.trail.len(),
        }
    }
}

/// Enqueues the assignment of true to a literal.
///
/// This updates the assignment and trail, but does not perform any propagation. The literal has to
/// be unassigned when calling this.
pub fn enqueue_assignment(
    mut ctx: partial!(Context, mut AssignmentP, mut ImplGraphP, mut TrailP),
    lit: Lit,
    reason: Reason,
) {
    let assignment = ctx.part_mut(AssignmentP);
    debug_assert!(assignment.lit_value(lit) == None);

    assignment.assign_lit(lit);

    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    let node = &mut ctx.part_mut(ImplGraphP).nodes[lit.index()];
    node.reason = reason;
    node.level = trail.decisions.len() as LitIdx;
    node.depth = trail.trail.len() as LitIdx;

    trail.trail.push(lit);
}

/// Undo all assignments in decision levels deeper than the given level.
///
/// Unassigned variables keep their value as saved phase and become available for decisions again.
pub fn backtrack(
    mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP),
    level: usize,
) {
    let (assignment, mut ctx) = ctx.split_part_mut(AssignmentP);
    let (trail, mut ctx) = ctx.split_part_mut(TrailP);

    if level >= trail.decisions.len() {
        return;
    }

    let new_trail_len = trail.decisions[level] as usize;

    trail.queue_head_pos = new_trail_len;
    trail.decisions.truncate(level);

    let vsids = ctx.part_mut(VsidsP);
    for &lit in trail.trail[new_trail_len..].iter() {
        assignment.unassign_var(lit.var());
        vsids.make_available(lit.var());
    }
    trail.trail.truncate(new_trail_len);
}

/// Backtrack to the root level.
pub fn restart(mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP)) {
    backtrack(ctx.borrow(), 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::context::set_var_count;

    #[test]
    fn backtrack_saves_phases() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), 4);

        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Unit);
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(2), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(-3), Reason::Unit);
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(4), Reason::Unit);

        assert_eq!(ctx.part(ImplGraphP).level(var!(3)), 1);
        assert_eq!(ctx.part(ImplGraphP).depth(var!(4)), 3);
        assert_eq!(ctx.part(TrailP).root_len(), 1);

        backtrack(ctx.borrow(), 1);

        assert_eq!(ctx.part(TrailP).trail(), &lits![1, 2, -3]);
        assert_eq!(ctx.part(AssignmentP).var_value(var!(4)), None);
        assert!(ctx.part(AssignmentP).last_var_value(var!(4)));

        restart(ctx.borrow());

        assert_eq!(ctx.part(TrailP).trail(), &lits![1]);
        assert_eq!(ctx.part(TrailP).current_level(), 0);
        assert!(ctx.part(AssignmentP).lit_is_true(lit!(1)));
        assert!(!ctx.part(AssignmentP).last_var_value(var!(3)));
        assert!(ctx.part(AssignmentP).last_var_value(var!(2)));
    }
}

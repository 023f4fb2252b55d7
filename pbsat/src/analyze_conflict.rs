//! Learns a new clause by analyzing a conflict.
use std::mem::{swap, take};

use partial_ref::{partial, PartialRef};

use crate::config::SimplificationLevel;
use crate::constraint::{ConstraintDb, ConstraintRef};
use crate::context::{parts::*, Context};
use crate::decision::vsids::Vsids;
use crate::lit::{Lit, Var};
use crate::prop::{Assignment, Conflict, ImplGraph, Reason};

/// Temporaries for conflict analysis
#[derive(Default)]
pub struct AnalyzeConflict {
    /// This is the learned clause after analysis finishes.
    clause: Vec<Lit>,
    /// Number of literals in the current clause at the current level.
    current_level_count: usize,
    /// Variables in the current clause or shown to be implied by it.
    var_flags: Vec<bool>,
    /// Entries to clean in `var_flags`.
    to_clean: Vec<Var>,
    /// Constraints resolved with during analysis.
    involved: Vec<ConstraintRef>,
    /// Literals removed by minimization.
    minimized: usize,
    /// Buffer for reason literals.
    reason: Vec<Lit>,
    /// Pending literals of the recursive redundancy check.
    stack: Vec<Lit>,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_flags.resize(count, false);
    }

    /// The learned clause.
    ///
    /// The asserted literal is at position 0 and a literal of the backjump level at position 1.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }

    /// The falsified constraint and all reasons used for the learned clause.
    pub fn involved(&self) -> &[ConstraintRef] {
        &self.involved
    }

    /// Number of literals removed from the learned clause by minimization.
    pub fn minimized(&self) -> usize {
        self.minimized
    }

    /// Add the negation of a true literal to the current clause.
    ///
    /// Literals of the current level are only counted, the trail walk resolves them away.
    fn add_literal(
        &mut self,
        true_lit: Lit,
        current_level: usize,
        impl_graph: &ImplGraph,
        vsids: &mut Vsids,
    ) {
        let level = impl_graph.level(true_lit.var());
        // Root level assignments are never undone, so they need not appear in the clause.
        if level > 0 && !self.var_flags[true_lit.index()] {
            vsids.bump(true_lit.var());
            self.var_flags[true_lit.index()] = true;
            if level == current_level {
                self.current_level_count += 1;
            } else {
                self.clause.push(!true_lit);
                self.to_clean.push(true_lit.var());
            }
        }
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// Returns the lowest decision level that makes the learned clause asserting. On the root level
/// the learned clause is empty.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut VsidsP,
        AssignmentP,
        ConstraintDbP,
        ImplGraphP,
        SolverConfigP,
        TrailP,
    ),
    conflict: Conflict,
) -> usize {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let (vsids, ctx) = ctx.split_part_mut(VsidsP);

    analyze.clause.clear();
    analyze.involved.clear();
    analyze.current_level_count = 0;
    analyze.minimized = 0;

    let trail = ctx.part(TrailP);
    let current_level = trail.current_level();

    if current_level == 0 {
        return 0;
    }

    let assignment = ctx.part(AssignmentP);
    let impl_graph = ctx.part(ImplGraphP);
    let db = ctx.part(ConstraintDbP);

    let mut reason = take(&mut analyze.reason);

    // We start with the literals falsifying the conflicting constraint
    reason.clear();
    db.constraint(conflict.cref)
        .reason(None, assignment, impl_graph, &mut reason);
    analyze.involved.push(conflict.cref);
    for &lit in reason.iter() {
        analyze.add_literal(lit, current_level, impl_graph, vsids);
    }

    // Resolve away the literals of the current level in reverse chronological order until only
    // one is left. That one is the first unique implication point.
    for &lit in trail.trail().iter().rev() {
        if !analyze.var_flags[lit.index()] {
            continue;
        }
        analyze.var_flags[lit.index()] = false;
        analyze.current_level_count -= 1;

        if analyze.current_level_count == 0 {
            analyze.clause.push(!lit);
            let end = analyze.clause.len() - 1;
            analyze.clause.swap(0, end);
            analyze.var_flags[lit.index()] = true;
            analyze.to_clean.push(lit.var());
            break;
        }

        debug_assert!(!impl_graph.reason(lit.var()).is_unit());
        if let Reason::Constraint(cref) = *impl_graph.reason(lit.var()) {
            analyze.involved.push(cref);
            reason.clear();
            db.constraint(cref)
                .reason(Some(lit), assignment, impl_graph, &mut reason);
            for &reason_lit in reason.iter() {
                analyze.add_literal(reason_lit, current_level, impl_graph, vsids);
            }
        }
    }

    analyze.reason = reason;

    let level = ctx.part(SolverConfigP).simplification;
    if level != SimplificationLevel::None {
        minimize_clause(analyze, level, assignment, impl_graph, db);
    }

    for var in analyze.to_clean.drain(..) {
        analyze.var_flags[var.index()] = false;
    }

    // We find the highest level literal besides the asserted literal and move it into position 1.
    // This is important to ensure the watch invariants are not violated on backtracking.
    let mut backtrack_to = 0;

    if analyze.clause.len() > 1 {
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let lit_1 = &mut prefix[1];
        backtrack_to = impl_graph.level(lit_1.var());
        for lit in rest.iter_mut() {
            let lit_level = impl_graph.level(lit.var());
            if lit_level > backtrack_to {
                backtrack_to = lit_level;
                swap(lit_1, lit);
            }
        }
    }

    backtrack_to
}

/// Remove literals implied by the remaining literals of the learned clause.
///
/// Expects the variables of all clause literals to be flagged.
fn minimize_clause(
    analyze: &mut AnalyzeConflict,
    level: SimplificationLevel,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    db: &ConstraintDb,
) {
    let mut kept = 1;
    for index in 1..analyze.clause.len() {
        let lit = analyze.clause[index];
        let redundant = match level {
            SimplificationLevel::None => false,
            SimplificationLevel::Simple => is_implied(analyze, !lit, assignment, impl_graph, db),
            SimplificationLevel::Expensive => {
                is_implied_recursive(analyze, !lit, assignment, impl_graph, db)
            }
        };
        if !redundant {
            analyze.clause[kept] = lit;
            kept += 1;
        }
    }
    analyze.minimized = analyze.clause.len() - kept;
    analyze.clause.truncate(kept);
}

/// Whether all reason literals of a true literal are flagged or on the root level.
fn is_implied(
    analyze: &mut AnalyzeConflict,
    true_lit: Lit,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    db: &ConstraintDb,
) -> bool {
    let cref = match *impl_graph.reason(true_lit.var()) {
        Reason::Constraint(cref) => cref,
        Reason::Unit => return false,
    };
    analyze.reason.clear();
    db.constraint(cref)
        .reason(Some(true_lit), assignment, impl_graph, &mut analyze.reason);

    let flags = &analyze.var_flags;
    analyze
        .reason
        .iter()
        .all(|&lit| flags[lit.index()] || impl_graph.level(lit.var()) == 0)
}

/// Whether a true literal is implied by flagged literals following reasons transitively.
///
/// Variables shown to be implied stay flagged, which speeds up later checks.
fn is_implied_recursive(
    analyze: &mut AnalyzeConflict,
    true_lit: Lit,
    assignment: &Assignment,
    impl_graph: &ImplGraph,
    db: &ConstraintDb,
) -> bool {
    if impl_graph.reason(true_lit.var()).is_unit() {
        return false;
    }

    let clean_from = analyze.to_clean.len();
    analyze.stack.clear();
    analyze.stack.push(true_lit);

    while let Some(lit) = analyze.stack.pop() {
        let cref = match *impl_graph.reason(lit.var()) {
            Reason::Constraint(cref) => cref,
            Reason::Unit => unreachable!("only propagated literals are pushed"),
        };
        analyze.reason.clear();
        db.constraint(cref)
            .reason(Some(lit), assignment, impl_graph, &mut analyze.reason);

        for &reason_lit in analyze.reason.iter() {
            let var = reason_lit.var();
            if analyze.var_flags[var.index()] || impl_graph.level(var) == 0 {
                continue;
            }
            if impl_graph.reason(var).is_unit() {
                // Reached a decision outside of the clause, undo the flags of this check.
                for var in analyze.to_clean.drain(clean_from..) {
                    analyze.var_flags[var.index()] = false;
                }
                return false;
            }
            analyze.var_flags[var.index()] = true;
            analyze.to_clean.push(var);
            analyze.stack.push(reason_lit);
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::constraint::{add_constraint, Clause, Constraint, ConstraintHeader};
    use crate::context::set_var_count;
    use crate::prop::{enqueue_assignment, propagate};

    fn load(
        mut ctx: partial!(Context, mut ConstraintDbP, mut WatchlistsP, AssignmentP),
        clauses: &[&[Lit]],
    ) {
        for clause in clauses {
            let id = ctx.part_mut(ConstraintDbP).issue_id();
            add_constraint(
                ctx.borrow(),
                ConstraintHeader::original(id),
                Constraint::Clause(Clause::new(clause.to_vec())),
            );
        }
    }

    /// Decide `x1` then `x3` and analyze the resulting conflict.
    fn analyze(clauses: &[&[Lit]], level: SimplificationLevel) -> (Vec<Lit>, usize, usize) {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 7);
        ctx.part_mut(SolverConfigP).simplification = level;

        load(ctx.borrow(), clauses);

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Unit);
        assert_eq!(propagate(ctx.borrow()), Ok(()));

        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(3), Reason::Unit);
        let conflict = match propagate(ctx.borrow()) {
            Err(conflict) => conflict,
            Ok(()) => panic!("expected a conflict"),
        };

        let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

        let analyze = ctx.part(AnalyzeConflictP);
        assert!(analyze.var_flags.iter().all(|&flag| !flag));
        assert!(analyze.involved().contains(&conflict.cref));

        let mut clause = analyze.clause().to_vec();
        clause[1..].sort();
        (clause, backtrack_to, analyze.minimized())
    }

    #[test]
    fn first_uip() {
        let clauses = cnf![
            -1, 2;
            -3, 5;
            -3, -2, 6;
            -5, -6;
        ];
        let (clause, backtrack_to, minimized) = analyze(&clauses, SimplificationLevel::Expensive);
        assert_eq!(clause, lits![-3, -2].to_vec());
        assert_eq!(backtrack_to, 1);
        assert_eq!(minimized, 0);
    }

    #[test]
    fn simple_minimization() {
        let clauses = cnf![
            -1, 2;
            -3, -2, 5;
            -3, -1, 6;
            -5, -6;
        ];
        let (clause, backtrack_to, _) = analyze(&clauses, SimplificationLevel::None);
        assert_eq!(clause, lits![-3, -1, -2].to_vec());
        assert_eq!(backtrack_to, 1);

        let (clause, _, minimized) = analyze(&clauses, SimplificationLevel::Simple);
        assert_eq!(clause, lits![-3, -1].to_vec());
        assert_eq!(minimized, 1);
    }

    #[test]
    fn recursive_minimization() {
        let clauses = cnf![
            -1, 2;
            -2, 7;
            -3, -7, 5;
            -3, -1, 6;
            -5, -6;
        ];
        let (clause, _, minimized) = analyze(&clauses, SimplificationLevel::Simple);
        assert_eq!(clause, lits![-3, -1, -7].to_vec());
        assert_eq!(minimized, 0);

        let (clause, backtrack_to, minimized) = analyze(&clauses, SimplificationLevel::Expensive);
        assert_eq!(clause, lits![-3, -1].to_vec());
        assert_eq!(backtrack_to, 1);
        assert_eq!(minimized, 1);
    }
}

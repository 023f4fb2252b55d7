//! Small formulas with known outcomes, solved through the public interface.

use std::sync::{Arc, Mutex};

use num_bigint::BigInt;

use pbsat::listener::SearchListener;
use pbsat::restart::{LubyRestarts, RestartPolicy};
use pbsat::{
    ConstraintId, ConstraintKind, Contradiction, Lit, Objective, OptimizationOutcome, Optimizer,
    PbFormula, SolveLimits, SolveOutcome, Solver,
};
use pbsat_formula::test::pigeon_hole;
use pbsat_formula::{lit, lits, pb};

#[derive(Clone, Default)]
struct Propagations {
    lits: Arc<Mutex<Vec<(Lit, ConstraintId)>>>,
}

impl SearchListener for Propagations {
    fn on_propagate(&mut self, lit: Lit, reason: ConstraintId) {
        self.lits.lock().unwrap().push((lit, reason));
    }
}

#[test]
fn implication_chain_unsat() {
    let mut solver = Solver::new();

    solver.add_clause(&lits![1, 2]).unwrap();
    solver.add_clause(&lits![-1, 2]).unwrap();
    solver.add_clause(&lits![-2]).unwrap();

    assert_eq!(solver.solve(), SolveOutcome::Unsatisfiable);
    assert_eq!(solver.failed_assumptions(), Some(vec![]));
}

#[test]
fn single_clause_sat() {
    let mut solver = Solver::new();

    solver.add_clause(&lits![1, 2]).unwrap();

    let outcome = solver.solve();
    let model = outcome.model().unwrap();
    assert!(model.lit_is_true(lit!(1)) || model.lit_is_true(lit!(2)));
}

#[test]
fn pb_excluded_literal_forces_rest() {
    let mut solver = Solver::new();

    let recorder = Propagations::default();
    solver.set_listener(Box::new(recorder.clone()));

    let coefs = [BigInt::from(2), BigInt::from(2), BigInt::from(1)];
    let id = solver
        .add_pseudo_boolean(&lits![1, 2, 3], &coefs, true, 3)
        .unwrap();
    assert_eq!(solver.constraint_count(ConstraintKind::PbLong), 1);

    let outcome = solver.solve_with(&lits![-3], SolveLimits::unlimited());

    let model = outcome.model().unwrap();
    assert!(model.lit_is_true(lit!(1)));
    assert!(model.lit_is_true(lit!(2)));
    assert!(model.lit_is_true(lit!(-3)));

    let mut propagated = recorder.lits.lock().unwrap().clone();
    propagated.sort();
    assert_eq!(propagated, vec![(lit!(1), id), (lit!(2), id)]);
    assert_eq!(solver.stats().decisions, 0);
}

#[test]
fn pb_excluded_at_root_level() {
    let mut solver = Solver::new();

    solver.add_clause(&lits![-3]).unwrap();
    solver
        .add_constraint(&pb![2 * 1, 2 * 2, 1 * 3; >= 3])
        .unwrap();

    let outcome = solver.solve();
    let model = outcome.model().unwrap();
    assert_eq!(model.lits(), lits![1, 2, -3].to_vec());
    assert_eq!(solver.stats().decisions, 0);
}

#[derive(Debug)]
struct RecordedLuby {
    inner: LubyRestarts,
    conflicts: u64,
    restarts_at: Arc<Mutex<Vec<u64>>>,
}

impl RestartPolicy for RecordedLuby {
    fn name(&self) -> &'static str {
        "recorded-luby"
    }

    fn initial_bound(&self) -> u64 {
        self.inner.initial_bound()
    }

    fn next_bound(&self) -> u64 {
        self.inner.next_bound()
    }

    fn on_conflict(&mut self) {
        self.conflicts += 1;
        self.inner.on_conflict();
    }

    fn on_restart(&mut self) {
        self.restarts_at.lock().unwrap().push(self.conflicts);
        self.inner.on_restart();
    }

    fn should_restart(&self) -> bool {
        self.inner.should_restart()
    }

    fn reset(&mut self) {
        self.conflicts = 0;
        self.inner.reset();
    }
}

#[test]
fn luby_restart_points() {
    let restarts_at = Arc::new(Mutex::new(vec![]));

    let mut solver = Solver::new();
    solver.set_restart_strategy(Box::new(RecordedLuby {
        inner: LubyRestarts::new(1),
        conflicts: 0,
        restarts_at: restarts_at.clone(),
    }));

    solver.add_cnf(&pigeon_hole(5)).unwrap();

    assert_eq!(solver.solve(), SolveOutcome::Unsatisfiable);

    let points = restarts_at.lock().unwrap().clone();
    let expected = [1, 2, 4, 5, 6, 8, 12, 13, 14, 16];
    let compared = points.len().min(expected.len());
    assert!(compared >= 4);
    assert_eq!(points[..compared], expected[..compared]);
    assert_eq!(solver.stats().restarts, points.len() as u64);
}

#[test]
fn luby_factor_100_bounds() {
    let mut policy = LubyRestarts::new(100);
    let mut intervals = vec![];
    let mut conflicts = 0;

    while intervals.len() < 10 {
        policy.on_conflict();
        conflicts += 1;
        if policy.should_restart() {
            intervals.push(conflicts);
            conflicts = 0;
            policy.on_restart();
        }
    }

    assert_eq!(
        intervals,
        vec![100, 100, 200, 100, 100, 200, 400, 100, 100, 200]
    );
}

#[test]
fn pigeon_hole_three_into_two() {
    let mut solver = Solver::new();

    solver.add_cnf(&pigeon_hole(2)).unwrap();

    assert_eq!(solver.solve(), SolveOutcome::Unsatisfiable);
}

#[test]
fn pigeon_hole_as_cardinality_constraints() {
    let holes = 4;
    let sits = |p: usize, h: usize| Lit::from_index(p * holes + h, true);

    let mut solver = Solver::new();
    for p in 0..holes + 1 {
        let row: Vec<_> = (0..holes).map(|h| sits(p, h)).collect();
        solver.add_clause(&row).unwrap();
    }
    for h in 0..holes {
        let column: Vec<_> = (0..holes + 1).map(|p| !sits(p, h)).collect();
        solver.add_cardinality(&column, holes).unwrap();
    }
    assert_eq!(solver.constraint_count(ConstraintKind::Cardinality), holes);

    assert_eq!(solver.solve(), SolveOutcome::Unsatisfiable);
}

#[test]
fn large_coefficients() {
    let big = BigInt::from(1u64 << 62) * BigInt::from(1000);

    let mut solver = Solver::new();
    solver
        .add_pseudo_boolean(
            &lits![1, 2, 3],
            &[big.clone(), big.clone(), BigInt::from(1)],
            true,
            &big + BigInt::from(1),
        )
        .unwrap();
    solver.add_clause(&lits![-3]).unwrap();
    solver.add_clause(&lits![-1]).unwrap();

    assert_eq!(solver.constraint_count(ConstraintKind::PbBig), 1);
    assert_eq!(solver.solve(), SolveOutcome::Unsatisfiable);
}

#[test]
fn equality_constraint() {
    let mut solver = Solver::new();

    solver
        .add_constraint(&pb![3 * 1, 2 * 2, 2 * 3, 1 * 4; == 4])
        .unwrap();
    solver.add_clause(&lits![-2]).unwrap();

    let outcome = solver.solve();
    let model = outcome.model().unwrap();
    assert_eq!(model.lits(), lits![1, -2, -3, 4].to_vec());
}

#[test]
fn contradictions() {
    let mut solver = Solver::new();

    assert_eq!(
        solver.add_cardinality(&lits![1, 2], 3),
        Err(Contradiction::Infeasible)
    );
    solver.add_clause(&lits![1]).unwrap();
    assert_eq!(
        solver.add_clause(&lits![-1]),
        Err(Contradiction::Falsified)
    );

    assert!(solver.solve().is_sat());
}

#[test]
fn optimize_formula() {
    let mut formula = PbFormula::new();
    // Cover the edges of a triangle with a tail, minimizing the weighted vertex count
    formula.add_clause(&lits![1, 2]);
    formula.add_clause(&lits![2, 3]);
    formula.add_clause(&lits![1, 3]);
    formula.add_clause(&lits![3, 4]);
    formula.set_objective(Objective::new(vec![
        (BigInt::from(1), lit!(1)),
        (BigInt::from(3), lit!(2)),
        (BigInt::from(2), lit!(3)),
        (BigInt::from(2), lit!(4)),
    ]));

    let mut optimizer = Optimizer::from_formula(Solver::new(), &formula).unwrap();

    match optimizer.optimize(SolveLimits::unlimited()) {
        OptimizationOutcome::Optimal { model, value } => {
            assert_eq!(value, BigInt::from(3));
            assert!(model.lit_is_true(lit!(1)));
            assert!(model.lit_is_true(lit!(3)));
            assert!(formula.is_satisfied_by(model.assignment()));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

//! Minimization of a linear objective.
//!
//! The optimizer solves the formula, then repeatedly requires the objective to be smaller than
//! the best value found so far and solves again. The search ends when the tightened formula is
//! unsatisfiable, which proves the last model optimal.
//!
//! [`LexicographicOptimizer`] minimizes a list of objectives by priority.
use std::time::Instant;

use log::{debug, info};
use num_bigint::BigInt;
use num_traits::{One, Signed};

use crate::control::SolveLimits;
use crate::lit::Lit;
use crate::model::Model;
use crate::pb::{LinearConstraint, Objective, PbFormula, Relation};
use crate::solver::{Contradiction, SolveOutcome, Solver};

/// Result of an optimization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptimizationOutcome {
    /// The model minimizes the objective.
    Optimal { model: Model, value: BigInt },
    /// The best model found before the limits were reached, it may not be optimal.
    Satisfiable { model: Model, value: BigInt },
    Unsatisfiable,
    /// The limits were reached before any model was found.
    Unknown,
}

impl OptimizationOutcome {
    pub fn model(&self) -> Option<&Model> {
        match self {
            OptimizationOutcome::Optimal { model, .. }
            | OptimizationOutcome::Satisfiable { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&BigInt> {
        match self {
            OptimizationOutcome::Optimal { value, .. }
            | OptimizationOutcome::Satisfiable { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        match self {
            OptimizationOutcome::Optimal { .. } => true,
            _ => false,
        }
    }
}

/// Minimizes an objective over the constraints of a solver.
///
/// Each improvement adds a bound on the objective to the solver, so the solver keeps excluding
/// all models that are not better than the best one found.
pub struct Optimizer {
    solver: Solver,
    objective: Objective,
    best: Option<(Model, BigInt)>,
}

impl Optimizer {
    /// Minimize `objective` subject to the constraints already added to `solver`.
    pub fn new(mut solver: Solver, objective: Objective) -> Optimizer {
        let var_count = objective
            .terms
            .iter()
            .map(|(_, lit)| lit.index() + 1)
            .max()
            .unwrap_or(0);
        solver.reserve_vars(var_count);

        Optimizer {
            solver,
            objective,
            best: None,
        }
    }

    /// Minimize the objective of a formula over its constraints.
    ///
    /// A formula without objective is only checked for satisfiability, any model is optimal.
    pub fn from_formula(solver: Solver, formula: &PbFormula) -> Result<Optimizer, Contradiction> {
        let objective = formula.objective().cloned().unwrap_or_default();
        let mut optimizer = Optimizer::new(solver, objective);
        optimizer.solver.add_formula(formula)?;
        Ok(optimizer)
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// The solver holding the constraints and the bounds added so far.
    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Modify the solver, e.g. to add further constraints or steer the search.
    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    /// The best model found so far with its objective value.
    pub fn best(&self) -> Option<(&Model, &BigInt)> {
        self.best.as_ref().map(|(model, value)| (model, value))
    }

    /// Search for an optimal model.
    ///
    /// The limits apply to the whole optimization. Calling this again after the limits were hit
    /// continues from the best model found.
    pub fn optimize(&mut self, limits: SolveLimits) -> OptimizationOutcome {
        let budget = Budget::start(&self.solver, limits);

        loop {
            let remaining = match budget.remaining(&self.solver) {
                Some(remaining) => remaining,
                None => return self.interrupted(),
            };

            match self.solver.solve_with(&[], remaining) {
                SolveOutcome::Satisfiable(model) => {
                    let value = self.objective.value(model.assignment());
                    debug!("found model with objective value {}", value);

                    let bound = self.objective.at_most(&value - BigInt::one());
                    self.best = Some((model, value));

                    if let Err(contradiction) = self.solver.add_constraint(&bound) {
                        debug!("objective bound rejected: {}", contradiction);
                        return self.finished();
                    }
                }
                SolveOutcome::Unsatisfiable => return self.finished(),
                SolveOutcome::Unknown => return self.interrupted(),
            }
        }
    }

    fn finished(&self) -> OptimizationOutcome {
        match &self.best {
            Some((model, value)) => {
                info!("optimum found, objective value {}", value);
                OptimizationOutcome::Optimal {
                    model: model.clone(),
                    value: value.clone(),
                }
            }
            None => OptimizationOutcome::Unsatisfiable,
        }
    }

    fn interrupted(&self) -> OptimizationOutcome {
        match &self.best {
            Some((model, value)) => {
                info!("optimization stopped, best objective value {}", value);
                OptimizationOutcome::Satisfiable {
                    model: model.clone(),
                    value: value.clone(),
                }
            }
            None => OptimizationOutcome::Unknown,
        }
    }
}

/// Limits shared by the solve calls of one optimization run.
struct Budget {
    limits: SolveLimits,
    start: Instant,
    start_conflicts: u64,
}

impl Budget {
    fn start(solver: &Solver, limits: SolveLimits) -> Budget {
        Budget {
            limits,
            start: Instant::now(),
            start_conflicts: solver.stats().conflicts,
        }
    }

    /// Limits for the next solve call, `None` when the budget is used up.
    fn remaining(&self, solver: &Solver) -> Option<SolveLimits> {
        let timeout = match self.limits.timeout {
            Some(timeout) => Some(timeout.checked_sub(self.start.elapsed())?),
            None => None,
        };
        let conflicts = match self.limits.conflicts {
            Some(limit) => {
                let used = solver.stats().conflicts - self.start_conflicts;
                match limit.checked_sub(used) {
                    Some(remaining) if remaining > 0 => Some(remaining),
                    _ => return None,
                }
            }
            None => None,
        };
        Some(SolveLimits { timeout, conflicts })
    }
}

/// Result of a lexicographic optimization.
///
/// `values` holds the value of every objective under `model`, in order of priority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexicographicOutcome {
    /// No model has a lexicographically smaller value vector.
    Optimal { model: Model, values: Vec<BigInt> },
    /// The best model found before the limits were reached.
    Satisfiable { model: Model, values: Vec<BigInt> },
    Unsatisfiable,
    Unknown,
}

impl LexicographicOutcome {
    pub fn model(&self) -> Option<&Model> {
        match self {
            LexicographicOutcome::Optimal { model, .. }
            | LexicographicOutcome::Satisfiable { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn values(&self) -> Option<&[BigInt]> {
        match self {
            LexicographicOutcome::Optimal { values, .. }
            | LexicographicOutcome::Satisfiable { values, .. } => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        match self {
            LexicographicOutcome::Optimal { .. } => true,
            _ => false,
        }
    }
}

/// Minimizes several objectives, each one only among the models minimizing the ones before it.
///
/// Bounds on the objective currently minimized are guarded by a fresh selector literal that is
/// passed as an assumption, so proving that no better model exists leaves the solver usable. The
/// optimum of an objective is then fixed by a permanent bound before moving to the next one.
/// Models returned include the selector variables.
pub struct LexicographicOptimizer {
    solver: Solver,
    objectives: Vec<Objective>,
    /// Objectives with a proven and fixed optimum.
    fixed: usize,
    /// Guards the bound on `objectives[fixed]`.
    selector: Option<Lit>,
    best: Option<Model>,
}

impl LexicographicOptimizer {
    /// Minimize `objectives`, most important first, subject to the constraints of `solver`.
    pub fn new(mut solver: Solver, objectives: Vec<Objective>) -> LexicographicOptimizer {
        let var_count = objectives
            .iter()
            .flat_map(|objective| objective.terms.iter())
            .map(|(_, lit)| lit.index() + 1)
            .max()
            .unwrap_or(0);
        solver.reserve_vars(var_count);

        LexicographicOptimizer {
            solver,
            objectives,
            fixed: 0,
            selector: None,
            best: None,
        }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Values of all objectives under the best model found so far.
    pub fn best_values(&self) -> Option<Vec<BigInt>> {
        self.best.as_ref().map(|model| self.values(model))
    }

    /// Search for a lexicographically optimal model.
    ///
    /// The limits apply to the whole optimization. Calling this again continues where the last
    /// call stopped.
    pub fn optimize(&mut self, limits: SolveLimits) -> LexicographicOutcome {
        let budget = Budget::start(&self.solver, limits);

        loop {
            if self.best.is_some() && self.fixed == self.objectives.len() {
                return self.outcome(true);
            }

            let remaining = match budget.remaining(&self.solver) {
                Some(remaining) => remaining,
                None => return self.outcome(false),
            };

            let assumptions = match self.selector {
                Some(selector) => vec![selector],
                None if self.best.is_some() => match self.guard_bound() {
                    Some(selector) => vec![selector],
                    None => {
                        self.fix_optimum();
                        continue;
                    }
                },
                None => vec![],
            };

            match self.solver.solve_with(&assumptions, remaining) {
                SolveOutcome::Satisfiable(model) => {
                    debug!("found model with objective values {:?}", self.values(&model));
                    self.best = Some(model);
                    self.retire_selector();
                }
                SolveOutcome::Unsatisfiable if self.best.is_none() => {
                    return LexicographicOutcome::Unsatisfiable
                }
                SolveOutcome::Unsatisfiable => self.fix_optimum(),
                SolveOutcome::Unknown => return self.outcome(false),
            }
        }
    }

    fn values(&self, model: &Model) -> Vec<BigInt> {
        self.objectives
            .iter()
            .map(|objective| objective.value(model.assignment()))
            .collect()
    }

    /// Require the current objective to be below its value in the best model, when `selector`
    /// is assumed.
    ///
    /// Returns `None` when the solver rejects the guarded bound.
    fn guard_bound(&mut self) -> Option<Lit> {
        let objective = &self.objectives[self.fixed];
        let best = objective.value(self.best.as_ref()?.assignment());
        let bound = &best - BigInt::one();

        // With the selector false the left hand side never exceeds the right hand side
        let max_value: BigInt = objective
            .terms
            .iter()
            .map(|(coef, _)| coef)
            .filter(|coef| coef.is_positive())
            .sum();
        let relax = &max_value - &bound;

        let selector = Lit::from_index(self.solver.var_count(), true);
        self.solver.reserve_vars(selector.index() + 1);

        let mut terms = objective.terms.clone();
        terms.push((relax.clone(), selector));
        let guarded = LinearConstraint::new(terms, Relation::AtMost, bound + relax);

        match self.solver.add_constraint(&guarded) {
            Ok(_) => {
                self.selector = Some(selector);
                Some(selector)
            }
            Err(contradiction) => {
                debug!("guarded objective bound rejected: {}", contradiction);
                None
            }
        }
    }

    /// Disable the guarded bound for good.
    fn retire_selector(&mut self) {
        if let Some(selector) = self.selector.take() {
            if let Err(contradiction) = self.solver.add_clause(&[!selector]) {
                debug!("retiring selector rejected: {}", contradiction);
            }
        }
    }

    /// The best model minimizes the current objective, bound it permanently to that value.
    fn fix_optimum(&mut self) {
        self.retire_selector();

        let bound = match &self.best {
            Some(model) => {
                let objective = &self.objectives[self.fixed];
                objective.at_most(objective.value(model.assignment()))
            }
            None => return,
        };
        info!(
            "objective {} of {} optimal, value {}",
            self.fixed + 1,
            self.objectives.len(),
            bound.rhs
        );
        if let Err(contradiction) = self.solver.add_constraint(&bound) {
            debug!("objective bound rejected: {}", contradiction);
        }
        self.fixed += 1;
    }

    fn outcome(&self, optimal: bool) -> LexicographicOutcome {
        match &self.best {
            Some(model) if optimal => LexicographicOutcome::Optimal {
                model: model.clone(),
                values: self.values(model),
            },
            Some(model) => LexicographicOutcome::Satisfiable {
                model: model.clone(),
                values: self.values(model),
            },
            None => LexicographicOutcome::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use proptest::collection;

    use pbsat_formula::lit::strategy::lit;
    use pbsat_formula::test::{pigeon_hole, sat_pb_formula};

    /// Smallest objective value over all assignments satisfying the formula.
    fn brute_force_minimum(formula: &PbFormula, objective: &Objective) -> Option<BigInt> {
        let var_count = formula.var_count();
        let mut best: Option<BigInt> = None;
        for bits in 0..1u32 << var_count {
            let assignment: Vec<bool> = (0..var_count).map(|i| bits & (1 << i) != 0).collect();
            if formula.is_satisfied_by(&assignment) {
                let value = objective.value(&assignment);
                if best.as_ref().map_or(true, |best| &value < best) {
                    best = Some(value);
                }
            }
        }
        best
    }

    /// Lexicographically smallest value vector over all assignments satisfying the formula.
    fn brute_force_lexicographic(
        formula: &PbFormula,
        objectives: &[Objective],
    ) -> Option<Vec<BigInt>> {
        let var_count = formula.var_count();
        (0..1u32 << var_count)
            .map(|bits| (0..var_count).map(|i| bits & (1 << i) != 0).collect::<Vec<_>>())
            .filter(|assignment| formula.is_satisfied_by(assignment))
            .map(|assignment| {
                objectives
                    .iter()
                    .map(|objective| objective.value(&assignment))
                    .collect::<Vec<_>>()
            })
            .min()
    }

    fn unit_objective(lit: Lit) -> Objective {
        Objective::new(vec![(BigInt::from(1), lit)])
    }

    #[test]
    fn minimizes_weighted_sum() {
        let mut formula = PbFormula::new();
        formula.add_constraint(pb![1 * 1, 1 * 2, 1 * 3, 1 * 4; >= 2]);
        formula.add_constraint(pb![1 * -1, 1 * -2; >= 1]);
        formula.set_objective(Objective::new(vec![
            (BigInt::from(5), lit!(1)),
            (BigInt::from(4), lit!(2)),
            (BigInt::from(3), lit!(3)),
            (BigInt::from(7), lit!(4)),
        ]));

        let mut optimizer = Optimizer::from_formula(Solver::new(), &formula).unwrap();
        let outcome = optimizer.optimize(SolveLimits::unlimited());

        assert!(outcome.is_optimal());
        assert_eq!(outcome.value(), Some(&BigInt::from(7)));

        let model = outcome.model().unwrap();
        assert!(model.lit_is_true(lit!(2)));
        assert!(model.lit_is_true(lit!(3)));
        assert!(formula.is_satisfied_by(model.assignment()));
    }

    #[test]
    fn unsatisfiable_formula() {
        let mut formula = PbFormula::new();
        formula.add_constraint(pb![1 * 1, 1 * 2, 1 * 3; >= 2]);
        formula.add_constraint(pb![1 * 1, 1 * 2, 1 * 3; <= 1]);
        formula.set_objective(Objective::new(vec![(BigInt::from(1), lit!(1))]));

        let mut optimizer = Optimizer::from_formula(Solver::new(), &formula).unwrap();
        assert_eq!(
            optimizer.optimize(SolveLimits::unlimited()),
            OptimizationOutcome::Unsatisfiable
        );
    }

    #[test]
    fn zero_conflict_budget() {
        let mut formula = PbFormula::new();
        formula.add_constraint(pb![1 * 1, 1 * 2; >= 1]);

        let mut optimizer = Optimizer::from_formula(Solver::new(), &formula).unwrap();
        assert_eq!(
            optimizer.optimize(SolveLimits::with_conflicts(0)),
            OptimizationOutcome::Unknown
        );
    }

    #[test]
    fn objectives_by_priority() {
        let mut formula = PbFormula::new();
        formula.add_constraint(pb![1 * 1, 1 * 2, 1 * 3; >= 2]);

        let objectives = vec![
            Objective::new(vec![
                (BigInt::from(3), lit!(1)),
                (BigInt::from(3), lit!(2)),
                (BigInt::from(1), lit!(3)),
            ]),
            Objective::new(vec![(BigInt::from(1), lit!(1)), (BigInt::from(2), lit!(2))]),
        ];

        let mut solver = Solver::new();
        solver.add_formula(&formula).unwrap();
        let mut optimizer = LexicographicOptimizer::new(solver, objectives);

        let outcome = optimizer.optimize(SolveLimits::unlimited());
        assert!(outcome.is_optimal());
        assert_eq!(
            outcome.values(),
            Some(&[BigInt::from(4), BigInt::from(1)][..])
        );

        let model = outcome.model().unwrap();
        assert!(model.lit_is_true(lit!(1)));
        assert!(model.lit_is_true(lit!(-2)));
        assert!(model.lit_is_true(lit!(3)));
    }

    #[test]
    fn order_of_objectives_decides() {
        for &(first, second) in &[(lit!(1), lit!(2)), (lit!(2), lit!(1))] {
            let mut solver = Solver::new();
            solver.add_clause(&lits![1, 2]).unwrap();

            let objectives = vec![unit_objective(first), unit_objective(second)];
            let mut optimizer = LexicographicOptimizer::new(solver, objectives);

            let outcome = optimizer.optimize(SolveLimits::unlimited());
            assert_eq!(
                outcome.values(),
                Some(&[BigInt::from(0), BigInt::from(1)][..])
            );
            let model = outcome.model().unwrap();
            assert!(model.lit_is_true(!first));
            assert!(model.lit_is_true(second));

            // Nothing is left to improve
            assert_eq!(optimizer.optimize(SolveLimits::with_conflicts(0)), outcome);
        }
    }

    #[test]
    fn lexicographic_edge_cases() {
        let mut solver = Solver::new();
        solver.add_clause(&lits![1, 2]).unwrap();
        solver.add_clause(&lits![-1]).unwrap();
        solver.add_clause(&lits![-2, 3]).unwrap();
        let mut optimizer = LexicographicOptimizer::new(solver, vec![]);
        let outcome = optimizer.optimize(SolveLimits::unlimited());
        assert!(outcome.is_optimal());
        assert_eq!(outcome.values(), Some(&[][..]));

        let mut solver = Solver::new();
        solver.add_cnf(&pigeon_hole(2)).unwrap();
        let mut optimizer = LexicographicOptimizer::new(solver, vec![unit_objective(lit!(1))]);
        assert_eq!(
            optimizer.optimize(SolveLimits::unlimited()),
            LexicographicOutcome::Unsatisfiable
        );

        let mut solver = Solver::new();
        solver.add_clause(&lits![1, 2]).unwrap();
        let mut optimizer = LexicographicOptimizer::new(solver, vec![unit_objective(lit!(1))]);
        assert_eq!(
            optimizer.optimize(SolveLimits::with_conflicts(0)),
            LexicographicOutcome::Unknown
        );
        // Continues after the budget ran out
        assert!(optimizer.optimize(SolveLimits::unlimited()).is_optimal());
        assert_eq!(optimizer.best_values(), Some(vec![BigInt::from(0)]));
    }

    proptest! {
        #[test]
        fn lexicographic_matches_brute_force(
            formula in sat_pb_formula(2..9usize, 1..8usize, 1..5usize, 1..20i64),
            terms in collection::vec((-5..10i64, lit(0..2usize)), 0..4),
        ) {
            let secondary = Objective::new(
                terms.into_iter().map(|(coef, lit)| (BigInt::from(coef), lit)).collect(),
            );
            let primary = formula.objective().cloned().unwrap_or_default();
            let objectives = vec![secondary, primary];

            let expected = brute_force_lexicographic(&formula, &objectives);
            prop_assert!(expected.is_some());

            let mut solver = Solver::new();
            solver.add_formula(&formula).unwrap();
            let mut optimizer = LexicographicOptimizer::new(solver, objectives);
            let outcome = optimizer.optimize(SolveLimits::unlimited());

            prop_assert!(outcome.is_optimal());
            prop_assert_eq!(outcome.values(), expected.as_ref().map(|values| &values[..]));
            prop_assert!(formula.is_satisfied_by(outcome.model().unwrap().assignment()));
        }

        #[test]
        fn optimum_matches_brute_force(
            formula in sat_pb_formula(2..10usize, 1..8usize, 1..5usize, 1..20i64),
        ) {
            let objective = formula.objective().cloned().unwrap_or_default();
            let expected = brute_force_minimum(&formula, &objective);
            prop_assert!(expected.is_some());

            let mut optimizer = Optimizer::from_formula(Solver::new(), &formula).unwrap();
            let outcome = optimizer.optimize(SolveLimits::unlimited());

            prop_assert!(outcome.is_optimal());
            prop_assert_eq!(outcome.value(), expected.as_ref());
            prop_assert!(formula.is_satisfied_by(outcome.model().unwrap().assignment()));
        }
    }
}

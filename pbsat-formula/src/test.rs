//! Formula generators for tests.
use proptest::{prelude::*, *};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::cnf::CnfFormula;
use crate::lit::Lit;
use crate::pb::{BigInt, LinearConstraint, Objective, PbFormula, Relation};

/// Small but hard unsatisfiable CNF formulas.
///
/// Follows the sgen construction with randomly chosen partitions.
pub fn sgen_unsat_formula(
    blocks: impl Strategy<Value = usize>,
) -> impl Strategy<Value = CnfFormula> {
    blocks.prop_flat_map(|blocks| {
        collection::vec(bool::ANY, blocks * 4 + 1).prop_perturb(|polarity, mut rng| {
            let mut clauses: Vec<Vec<Lit>> = vec![];
            let mut lits = hidden_lits(polarity);

            for &invert in [false, true].iter() {
                lits.shuffle(&mut rng);
                for block in lits.chunks_exact(4) {
                    for a in 0..4 {
                        for b in 0..a {
                            for c in 0..b {
                                let mut clause =
                                    vec![block[a] ^ invert, block[b] ^ invert, block[c] ^ invert];
                                clause.shuffle(&mut rng);
                                clauses.push(clause);
                            }
                        }
                    }
                }
                let extra = lits[lits.len() - 1];
                for b in 0..4 {
                    for c in 0..b {
                        let mut clause = vec![extra ^ invert, lits[b] ^ invert, lits[c] ^ invert];
                        clause.shuffle(&mut rng);
                        clauses.push(clause);
                    }
                }
            }

            clauses.shuffle(&mut rng);
            CnfFormula::from(clauses)
        })
    })
}

/// Satisfiable CNF formulas.
///
/// Picks a hidden full assignment and only emits clauses containing at least one literal true
/// under it.
pub fn sat_formula(
    vars: impl Strategy<Value = usize>,
    clause_count: impl Strategy<Value = usize>,
    density: impl Strategy<Value = f64>,
    polarity_dist: impl Strategy<Value = f64>,
) -> impl Strategy<Value = CnfFormula> {
    (vars, clause_count, density, polarity_dist).prop_flat_map(
        |(vars, clause_count, density, polarity_dist)| {
            collection::vec(bool::ANY, vars).prop_perturb(move |polarity, mut rng| {
                let mut clauses: Vec<Vec<Lit>> = vec![];
                let lits = hidden_lits(polarity);

                for _ in 0..clause_count {
                    let &fixed_lit = lits.choose(&mut rng).unwrap();
                    let mut clause = vec![fixed_lit];
                    for &lit in lits.iter() {
                        if lit != fixed_lit && rng.gen_bool(density) {
                            clause.push(lit ^ rng.gen_bool(polarity_dist));
                        }
                    }
                    clause.shuffle(&mut rng);
                    clauses.push(clause);
                }

                clauses.shuffle(&mut rng);
                CnfFormula::from(clauses)
            })
        },
    )
}

/// Satisfiable pseudo-Boolean formulas with an objective.
///
/// Every constraint holds under a hidden full assignment. Relations, signs of coefficients and
/// the slack left by each constraint are random, so some constraints are tight and force values.
pub fn sat_pb_formula(
    vars: impl Strategy<Value = usize>,
    constraint_count: impl Strategy<Value = usize>,
    term_count: impl Strategy<Value = usize>,
    max_coef: impl Strategy<Value = i64>,
) -> impl Strategy<Value = PbFormula> {
    (vars, constraint_count, term_count, max_coef).prop_flat_map(
        |(vars, constraint_count, term_count, max_coef)| {
            collection::vec(bool::ANY, vars).prop_perturb(move |polarity, mut rng| {
                let assignment = polarity.clone();
                let lits = hidden_lits(polarity);
                let mut formula = PbFormula::new();
                formula.set_var_count(lits.len());

                for _ in 0..constraint_count {
                    let mut chosen: Vec<Lit> = lits
                        .choose_multiple(&mut rng, term_count.min(lits.len()))
                        .map(|&lit| lit ^ rng.gen_bool(0.5))
                        .collect();
                    chosen.shuffle(&mut rng);

                    let terms: Vec<(BigInt, Lit)> = chosen
                        .into_iter()
                        .map(|lit| {
                            let magnitude = rng.gen_range(1, max_coef + 1);
                            let coef = if rng.gen_bool(0.1) {
                                -magnitude
                            } else {
                                magnitude
                            };
                            (BigInt::from(coef), lit)
                        })
                        .collect();

                    let value = LinearConstraint::new(terms.clone(), Relation::Equal, 0)
                        .lhs_value(&assignment);
                    let slack = BigInt::from(rng.gen_range(0, max_coef + 1));

                    let constraint = match rng.gen_range(0, 5) {
                        0 => LinearConstraint::new(terms, Relation::Equal, value),
                        1 | 2 => LinearConstraint::new(terms, Relation::AtMost, value + slack),
                        _ => LinearConstraint::new(terms, Relation::AtLeast, value - slack),
                    };
                    formula.add_constraint(constraint);
                }

                let mut objective = vec![];
                for &lit in lits.iter() {
                    if rng.gen_bool(0.5) {
                        let coef = BigInt::from(rng.gen_range(1, max_coef + 1));
                        objective.push((coef, lit ^ rng.gen_bool(0.5)));
                    }
                }
                formula.set_objective(Objective::new(objective));

                formula
            })
        },
    )
}

/// Pigeon hole formulas with the holes enabled through selector literals.
///
/// Returns the selector literals, the number of holes and the formula. The formula is
/// unsatisfiable when more than `columns` of the selectors are assumed true.
pub fn conditional_pigeon_hole(
    columns: impl Strategy<Value = usize>,
    extra_rows: impl Strategy<Value = usize>,
) -> impl Strategy<Value = (Vec<Lit>, usize, CnfFormula)> {
    (columns, extra_rows).prop_flat_map(|(columns, extra_rows)| {
        let rows = columns + extra_rows;
        let vars = (columns + 1) * rows;

        collection::vec(bool::ANY, vars).prop_perturb(move |polarity, mut rng| {
            let mut clauses: Vec<Vec<Lit>> = vec![];
            let lits = hidden_lits(polarity);

            for i in 1..columns + 1 {
                for j in 0..rows {
                    for k in 0..j {
                        let mut clause = vec![lits[i * rows + j], lits[i * rows + k]];
                        clause.shuffle(&mut rng);
                        clauses.push(clause);
                    }
                }
            }

            for j in 0..rows {
                let mut clause: Vec<_> = (0..columns + 1).map(|i| !lits[i * rows + j]).collect();
                clause.shuffle(&mut rng);
                clauses.push(clause);
            }

            clauses.shuffle(&mut rng);
            (lits[0..rows].to_owned(), columns, CnfFormula::from(clauses))
        })
    })
}

/// The pigeon hole principle for `holes + 1` pigeons as clauses.
///
/// Variable `p * holes + h` states that pigeon `p` sits in hole `h`.
pub fn pigeon_hole(holes: usize) -> CnfFormula {
    let pigeons = holes + 1;
    let sits = |p: usize, h: usize| Lit::from_index(p * holes + h, true);
    let mut formula = CnfFormula::new();

    for p in 0..pigeons {
        formula.add_clause((0..holes).map(|h| sits(p, h)));
    }
    for h in 0..holes {
        for p in 0..pigeons {
            for q in 0..p {
                formula.add_clause(&[!sits(p, h), !sits(q, h)]);
            }
        }
    }

    formula
}

fn hidden_lits(polarity: Vec<bool>) -> Vec<Lit> {
    polarity
        .into_iter()
        .enumerate()
        .map(|(index, polarity)| Lit::from_index(index, polarity))
        .collect()
}

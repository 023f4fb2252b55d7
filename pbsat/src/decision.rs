//! Decision heuristics.
//!
//! Decisions branch on the most active unassigned variable of [`vsids`] using the polarity chosen
//! by [`PhaseSelection`]. With the random walk probability a uniformly random variable with a
//! random polarity is chosen instead.
use partial_ref::{partial, PartialRef};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{PhaseSelection, SolverConfig};
use crate::context::{parts::*, Context};
use crate::lit::Var;
use crate::prop::{enqueue_assignment, Reason};

pub mod vsids;

/// Variable and polarity selection for decisions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrderPolicy {
    pub phase: PhaseSelection,
    /// Probability of deciding on a uniformly random variable instead of the most active one.
    pub random_walk: f64,
    /// Seed for random walk and random phases.
    pub seed: u64,
}

impl Default for OrderPolicy {
    fn default() -> OrderPolicy {
        SolverConfig::default().order_policy()
    }
}

/// State of the decision order apart from variable activities.
pub struct Order {
    policy: OrderPolicy,
    rng: SmallRng,
    var_count: usize,
}

impl Default for Order {
    fn default() -> Order {
        let policy = OrderPolicy::default();
        Order {
            policy,
            rng: SmallRng::seed_from_u64(policy.seed),
            var_count: 0,
        }
    }
}

impl Order {
    /// Replace the policy, reseeding the random number generator.
    pub fn set_policy(&mut self, policy: OrderPolicy) {
        self.rng = SmallRng::seed_from_u64(policy.seed);
        self.policy = policy;
    }

    pub fn policy(&self) -> &OrderPolicy {
        &self.policy
    }

    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = count;
    }

    /// A random variable when the random walk fires.
    fn walk(&mut self) -> Option<Var> {
        let probability = self.policy.random_walk.max(0.0).min(1.0);
        if self.var_count == 0 || probability == 0.0 || !self.rng.gen_bool(probability) {
            return None;
        }
        Some(Var::from_index(self.rng.gen_range(0, self.var_count)))
    }

    /// Polarity for a decision on a variable with the given saved phase.
    ///
    /// Variables chosen by the random walk get a random polarity.
    fn polarity(&mut self, saved: bool, walked: bool) -> bool {
        if walked {
            return self.rng.gen_bool(0.5);
        }
        match self.policy.phase {
            PhaseSelection::Saved => saved,
            PhaseSelection::Positive => true,
            PhaseSelection::Negative => false,
            PhaseSelection::Random => self.rng.gen_bool(0.5),
        }
    }
}

/// Make a decision and enqueue it.
///
/// Returns `false` if no decision was made because all variables are assigned.
pub fn make_decision(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut ListenerP,
        mut OrderP,
        mut StatsP,
        mut TrailP,
        mut VsidsP,
    ),
) -> bool {
    let (order, mut ctx) = ctx.split_part_mut(OrderP);
    let (vsids, mut ctx) = ctx.split_part_mut(VsidsP);

    let decision = {
        let assignment = ctx.part(AssignmentP);
        let is_free = |var: Var| assignment.var_value(var).is_none();

        let (decision_var, walked) = match order.walk() {
            Some(var) if is_free(var) => (Some(var), true),
            _ => (vsids.pop_available(is_free), false),
        };

        match decision_var {
            Some(var) => var.lit(order.polarity(assignment.last_var_value(var), walked)),
            None => return false,
        }
    };

    ctx.part_mut(TrailP).new_decision_level();
    enqueue_assignment(ctx.borrow(), decision, Reason::Unit);

    ctx.part_mut(StatsP).decisions += 1;
    ctx.part_mut(ListenerP).get_mut().on_decision(decision);

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::context::set_var_count;
    use crate::listener::test::{Event, Recorder};
    use crate::prop::backtrack;

    #[test]
    fn activity_and_phase() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 3);

        let recorder = Recorder::default();
        ctx.part_mut(ListenerP).set(Box::new(recorder.clone()));

        ctx.part_mut(VsidsP).bump(var!(2));
        ctx.part_mut(VsidsP).bump(var!(2));
        ctx.part_mut(VsidsP).bump(var!(3));

        ctx.part_mut(OrderP).set_policy(OrderPolicy {
            phase: PhaseSelection::Positive,
            ..OrderPolicy::default()
        });
        assert!(make_decision(ctx.borrow()));

        ctx.part_mut(OrderP).set_policy(OrderPolicy {
            phase: PhaseSelection::Negative,
            ..OrderPolicy::default()
        });
        assert!(make_decision(ctx.borrow()));
        assert!(make_decision(ctx.borrow()));
        assert!(!make_decision(ctx.borrow()));

        assert_eq!(ctx.part(TrailP).trail(), &lits![2, -3, -1][..]);
        assert_eq!(ctx.part(TrailP).current_level(), 3);
        assert_eq!(ctx.part(StatsP).decisions, 3);
        assert_eq!(
            recorder.events(),
            vec![
                Event::Decision(lit!(2)),
                Event::Decision(lit!(-3)),
                Event::Decision(lit!(-1)),
            ]
        );
    }

    #[test]
    fn saved_phase_after_backtrack() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 2);

        ctx.part_mut(VsidsP).bump(var!(2));
        ctx.part_mut(TrailP).new_decision_level();
        enqueue_assignment(ctx.borrow(), lit!(-2), Reason::Unit);
        enqueue_assignment(ctx.borrow(), lit!(1), Reason::Unit);
        backtrack(ctx.borrow(), 0);

        assert!(make_decision(ctx.borrow()));
        assert!(make_decision(ctx.borrow()));
        assert_eq!(ctx.part(TrailP).trail(), &lits![-2, 1][..]);
    }

    #[test]
    fn random_walk_assigns_every_var_once() {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();
        set_var_count(ctx.borrow(), 20);

        ctx.part_mut(OrderP).set_policy(OrderPolicy {
            phase: PhaseSelection::Random,
            random_walk: 1.0,
            seed: 7,
        });

        let mut decisions = 0;
        while make_decision(ctx.borrow()) {
            decisions += 1;
        }

        assert_eq!(decisions, 20);
        let mut vars: Vec<_> = ctx.part(TrailP).trail().iter().map(|lit| lit.var()).collect();
        vars.sort();
        vars.dedup();
        assert_eq!(vars.len(), 20);
    }
}

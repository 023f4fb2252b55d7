//! Solver configuration.
//!
//! Strategies are selected by name here. The search itself only ever sees the policy objects
//! built by [`SolverConfig::restart_policy`], [`SolverConfig::deletion_policy`] and
//! [`SolverConfig::order_policy`].
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pbsat_macros::DocDefault;

use crate::decision::OrderPolicy;
use crate::deletion::{ActivityDeletion, DeletionPolicy, LbdDeletion, NoDeletion};
use crate::restart::{
    ArminRestarts, FixedPeriodRestarts, GeometricRestarts, GlucoseRestarts, LubyRestarts,
    NoRestarts, RestartPolicy,
};

/// A strategy name that is not known.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {kind} strategy {name:?}, expected one of {expected}")]
pub struct UnknownPolicy {
    pub kind: &'static str,
    pub name: String,
    pub expected: String,
}

macro_rules! named_strategies {
    (
        $(#[$attr:meta])*
        pub enum $enum:ident($kind:literal) {
            $( $(#[$variant_attr:meta])* $variant:ident = $name:literal, )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
        pub enum $enum {
            $( $(#[$variant_attr])* #[serde(rename = $name)] $variant, )*
        }

        impl $enum {
            /// Names of all variants.
            pub const NAMES: &'static [&'static str] = &[ $( $name ),* ];

            pub fn name(self) -> &'static str {
                match self {
                    $( $enum::$variant => $name, )*
                }
            }
        }

        impl FromStr for $enum {
            type Err = UnknownPolicy;

            fn from_str(name: &str) -> Result<$enum, UnknownPolicy> {
                match name {
                    $( $name => Ok($enum::$variant), )*
                    _ => Err(UnknownPolicy {
                        kind: $kind,
                        name: name.to_owned(),
                        expected: Self::NAMES.join(", "),
                    }),
                }
            }
        }

        impl fmt::Display for $enum {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_strategies! {
    /// When to restart the search.
    pub enum RestartStrategy("restart") {
        /// Never restart.
        NoRestarts = "none",
        /// Restart every `restart_initial_bound` conflicts.
        FixedPeriod = "fixed",
        /// Geometrically growing restart intervals.
        MiniSat = "minisat",
        /// Restart intervals following the Luby sequence.
        Luby = "luby",
        /// Inner/outer geometric schedule with frequent short and occasional long runs.
        Armin = "armin",
        /// Restart when recently learnt constraints have a high LBD compared to the average.
        Glucose = "glucose",
    }
}

named_strategies! {
    /// Which learnt constraints to remove during database reductions.
    pub enum DeletionStrategy("deletion") {
        /// Remove the least active half.
        Activity = "activity",
        /// Remove the half with the largest literal block distance.
        Lbd = "lbd",
        /// Keep all learnt constraints.
        Never = "never",
    }
}

named_strategies! {
    /// Polarity chosen for decision variables.
    pub enum PhaseSelection("phase") {
        /// The last value the variable had, false for unassigned variables.
        Saved = "saved",
        Positive = "positive",
        Negative = "negative",
        /// Uniformly random, using the configured seed.
        Random = "random",
    }
}

named_strategies! {
    /// Minimization applied to learnt clauses.
    pub enum SimplificationLevel("simplification") {
        /// Keep the first UIP clause as derived.
        None = "none",
        /// Remove literals whose reason only has literals present in the clause.
        Simple = "simple",
        /// Remove literals implied by the other literals of the clause, following reasons
        /// recursively.
        Expensive = "expensive",
    }
}

named_strategies! {
    /// Derivation of learnt constraints from conflicts.
    pub enum LearningScheme("learning") {
        /// First UIP clause learning.
        Clause = "clause",
        /// Pseudo-Boolean constraints derived by cutting planes, falling back to first UIP
        /// clauses when the derivation does not assert a literal.
        CuttingPlanes = "cutting-planes",
    }
}

/// Configurable parameters used during solving.
#[derive(DocDefault, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Multiplicative decay for the VSIDS decision heuristic. (Default: 0.95)
    pub vsids_decay: f32,

    /// Multiplicative decay for learnt constraint activities. (Default: 0.999)
    pub constraint_activity_decay: f32,

    /// Restart strategy. (Default: RestartStrategy::Luby)
    pub restart_strategy: RestartStrategy,

    /// Conflicts before the first restart of the fixed, geometric and inner/outer strategies.
    /// (Default: 100)
    pub restart_initial_bound: u64,

    /// Growth factor of the geometric and inner/outer restart strategies. (Default: 1.5)
    pub restart_growth_factor: f64,

    /// Scaling factor for Luby sequence based restarts (number of conflicts). (Default: 100)
    pub luby_restart_factor: u64,

    /// Deletion strategy for learnt constraints. (Default: DeletionStrategy::Activity)
    pub deletion_strategy: DeletionStrategy,

    /// Number of conflicts between learnt constraint database reductions. (Default: 10000)
    pub clean_interval: u64,

    /// Growth of the reduction interval after each LBD based reduction. (Default: 1000)
    pub clean_interval_increment: u64,

    /// Learnt constraints with at most this LBD are kept by the LBD strategy. (Default: 2)
    pub protected_lbd: u32,

    /// Phase selection for decisions. (Default: PhaseSelection::Saved)
    pub phase: PhaseSelection,

    /// Probability of deciding on a random variable with a random polarity. (Default: 0.0)
    pub random_walk: f64,

    /// Seed for random decisions and random phases. (Default: 0)
    pub random_seed: u64,

    /// Minimization of learnt clauses. (Default: SimplificationLevel::Expensive)
    pub simplification: SimplificationLevel,

    /// Derivation of learnt constraints. (Default: LearningScheme::Clause)
    pub learning: LearningScheme,

    /// Additionally add the clause implied by each added cardinality or pseudo-Boolean
    /// constraint. (Default: false)
    pub implied_clauses: bool,
}

impl SolverConfig {
    /// Build the configured restart policy.
    pub fn restart_policy(&self) -> Box<dyn RestartPolicy> {
        match self.restart_strategy {
            RestartStrategy::NoRestarts => Box::new(NoRestarts),
            RestartStrategy::FixedPeriod => {
                Box::new(FixedPeriodRestarts::new(self.restart_initial_bound))
            }
            RestartStrategy::MiniSat => Box::new(GeometricRestarts::new(
                self.restart_initial_bound,
                self.restart_growth_factor,
            )),
            RestartStrategy::Luby => Box::new(LubyRestarts::new(self.luby_restart_factor)),
            RestartStrategy::Armin => Box::new(ArminRestarts::new(
                self.restart_initial_bound,
                self.restart_growth_factor,
            )),
            RestartStrategy::Glucose => Box::new(GlucoseRestarts::default()),
        }
    }

    /// Build the configured deletion policy.
    pub fn deletion_policy(&self) -> Box<dyn DeletionPolicy> {
        match self.deletion_strategy {
            DeletionStrategy::Activity => Box::new(ActivityDeletion::new(self.clean_interval)),
            DeletionStrategy::Lbd => Box::new(LbdDeletion::new(
                self.clean_interval,
                self.clean_interval_increment,
                self.protected_lbd,
            )),
            DeletionStrategy::Never => Box::new(NoDeletion),
        }
    }

    /// The configured decision order.
    pub fn order_policy(&self) -> OrderPolicy {
        OrderPolicy {
            phase: self.phase,
            random_walk: self.random_walk,
            seed: self.random_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names() {
        for &name in RestartStrategy::NAMES {
            let strategy: RestartStrategy = name.parse().unwrap();
            assert_eq!(strategy.to_string(), name);
        }
        for &name in DeletionStrategy::NAMES {
            let strategy: DeletionStrategy = name.parse().unwrap();
            assert_eq!(strategy.name(), name);
        }
        for &name in LearningScheme::NAMES {
            let scheme: LearningScheme = name.parse().unwrap();
            assert_eq!(scheme.name(), name);
        }

        let err = "lazy".parse::<RestartStrategy>().unwrap_err();
        assert_eq!(err.kind, "restart");
        assert_eq!(err.name, "lazy");
        assert!(err.to_string().contains("luby"));
    }

    #[test]
    fn documented_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.restart_strategy, RestartStrategy::Luby);
        assert_eq!(config.luby_restart_factor, 100);
        assert_eq!(config.clean_interval, 10000);
        assert_eq!(config.random_walk, 0.0);

        let docs = SolverConfig::option_docs();
        assert!(docs.contains(&("vsids_decay", "0.95")));
        assert!(docs.contains(&("phase", "PhaseSelection::Saved")));
        assert!(docs.contains(&("learning", "LearningScheme::Clause")));
        assert_eq!(docs.len(), 16);
    }

    #[test]
    fn partial_toml_config() {
        let config: SolverConfig = toml::from_str(
            r#"
            restart_strategy = "armin"
            deletion_strategy = "lbd"
            phase = "random"
            random_walk = 0.02
            learning = "cutting-planes"
            "#,
        )
        .unwrap();

        assert_eq!(config.restart_strategy, RestartStrategy::Armin);
        assert_eq!(config.deletion_strategy, DeletionStrategy::Lbd);
        assert_eq!(config.phase, PhaseSelection::Random);
        assert_eq!(config.random_walk, 0.02);
        assert_eq!(config.learning, LearningScheme::CuttingPlanes);
        assert_eq!(config.vsids_decay, 0.95);

        assert_eq!(config.restart_policy().name(), "armin");
        assert_eq!(config.deletion_policy().name(), "lbd");

        assert!(toml::from_str::<SolverConfig>("phase = \"sideways\"").is_err());
    }
}

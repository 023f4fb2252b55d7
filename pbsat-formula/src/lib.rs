//! Literals, clauses and linear pseudo-Boolean constraints used by the pbsat solver.

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! lit {
    ($x:expr) => {
        $crate::lit::Lit::from_dimacs($x)
    };
}

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! var {
    ($x:expr) => {
        $crate::lit::Var::from_dimacs($x)
    };
}

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! lits {
    ( $( $x:expr ),* ) => { [ $( $crate::lit!( $x ) ),* ] };
    ( $( $x:expr ),* , ) => { $crate::lits! [ $( $ x),* ] };
}

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! cnf {
    ( $( $( $x:expr ),* );* ; ) => { [ $( &[ $( $crate::lit!( $x ) ),* ] as &[$crate::Lit] ),* ] };
}

/// Shortcut for tests
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! cnf_formula {
    ( $( $t:tt )* ) => { $crate::cnf::CnfFormula::from($crate::cnf![ $($t)* ].iter().cloned()) };
}

/// Shortcut for tests, builds a `LinearConstraint` from `coef * dimacs_lit` terms.
///
/// `pb![2 * 1, 2 * 2, 1 * 3; >= 3]` is the constraint `2 x1 + 2 x2 + x3 >= 3`.
#[cfg(any(test, feature = "internal-testing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! pb {
    ( $( $c:literal * $x:expr ),* ; >= $rhs:expr ) => {
        $crate::pb::LinearConstraint::new(
            vec![ $( ($crate::pb::BigInt::from($c), $crate::lit!($x)) ),* ],
            $crate::pb::Relation::AtLeast,
            $rhs,
        )
    };
    ( $( $c:literal * $x:expr ),* ; <= $rhs:expr ) => {
        $crate::pb::LinearConstraint::new(
            vec![ $( ($crate::pb::BigInt::from($c), $crate::lit!($x)) ),* ],
            $crate::pb::Relation::AtMost,
            $rhs,
        )
    };
    ( $( $c:literal * $x:expr ),* ; == $rhs:expr ) => {
        $crate::pb::LinearConstraint::new(
            vec![ $( ($crate::pb::BigInt::from($c), $crate::lit!($x)) ),* ],
            $crate::pb::Relation::Equal,
            $rhs,
        )
    };
}

pub mod cnf;
pub mod lit;
pub mod pb;

#[cfg(any(test, feature = "internal-testing"))]
pub mod test;

pub use cnf::CnfFormula;
pub use lit::{Lit, LitIdx, Var};
pub use pb::{LinearConstraint, Objective, PbFormula, Relation};

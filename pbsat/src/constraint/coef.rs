//! Coefficient arithmetic shared by the fixed width and arbitrary precision representations.
use std::fmt::Debug;
use std::ops::{AddAssign, SubAssign};

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive, Zero};

/// Integer type used for the coefficients and the degree of a pseudo-Boolean constraint.
pub trait Coef:
    Clone
    + Ord
    + Debug
    + Zero
    + One
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + Send
{
    /// Converts from arbitrary precision, `None` when the value does not fit.
    fn from_big(value: &BigInt) -> Option<Self>;

    fn to_big(&self) -> BigInt;
}

impl Coef for i64 {
    fn from_big(value: &BigInt) -> Option<i64> {
        value.to_i64()
    }

    fn to_big(&self) -> BigInt {
        BigInt::from(*self)
    }
}

impl Coef for BigInt {
    fn from_big(value: &BigInt) -> Option<BigInt> {
        Some(value.clone())
    }

    fn to_big(&self) -> BigInt {
        self.clone()
    }
}

/// Whether coefficients sorted in descending order and a degree fit the fixed width
/// representation.
///
/// The degree plus the two largest coefficients has to have a bit length below 64. Propagation also
/// sums all coefficients, so that sum is held to the same bound.
pub fn fits_fixed_width(coefs: &[BigInt], degree: &BigInt) -> bool {
    debug_assert!(coefs.windows(2).all(|pair| pair[0] >= pair[1]));

    let mut top_two = degree.clone();
    for coef in coefs.iter().take(2) {
        top_two += coef;
    }

    let mut sum = BigInt::zero();
    for coef in coefs {
        sum += coef;
    }

    top_two.bits() < 64 && sum.bits() < 64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&value| BigInt::from(value)).collect()
    }

    #[test]
    fn fixed_width_threshold() {
        assert!(fits_fixed_width(&big(&[5, 3, 1]), &BigInt::from(4)));

        let quarter = 1i64 << 61;
        assert!(fits_fixed_width(&big(&[quarter, quarter]), &BigInt::from(quarter)));

        let half = 1i64 << 62;
        assert!(!fits_fixed_width(&big(&[half, half]), &BigInt::from(half)));
        assert!(!fits_fixed_width(&big(&[half, 1, 1, 1]), &BigInt::from(half)));

        let wide = BigInt::from(1u64 << 63);
        assert!(!fits_fixed_width(&[wide.clone()], &wide));
    }

    #[test]
    fn conversions() {
        assert_eq!(i64::from_big(&BigInt::from(-7)), Some(-7));
        assert_eq!(i64::from_big(&(BigInt::from(1) << 70)), None);
        assert_eq!(42i64.to_big(), BigInt::from(42));
    }
}

//! Bounded-denominator rational reconstruction of simplex output.
//!
//! Tableau entries are exact rationals corrupted by round-off: `0.9999999`
//! is really `1`, `0.33333334` is really `1/3`. Floors and fractional parts
//! are taken on the reconstructed value, never on the raw float.

use num_integer::Integer;
use num_rational::Ratio;
use num_traits::{CheckedMul, Zero};

pub type Rational = Ratio<i128>;

/// Continued-fraction approximation with a denominator bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approximator {
    pub max_denominator: i128,
    /// Largest accepted distance between the float and its reconstruction
    pub tolerance: f64,
}

impl Default for Approximator {
    fn default() -> Self {
        Self {
            max_denominator: 10_000,
            tolerance: 1e-6,
        }
    }
}

impl Approximator {
    pub fn new(max_denominator: i128, tolerance: f64) -> Self {
        Self {
            max_denominator: max_denominator.max(1),
            tolerance,
        }
    }

    pub fn approximate(&self, value: f64) -> Option<Rational> {
        approximate(value, self.max_denominator, self.tolerance)
    }
}

/// Best continued-fraction convergent of `value` whose denominator does not
/// exceed `max_denominator`, or `None` if that convergent is farther than
/// `tolerance` from `value`.
pub fn approximate(value: f64, max_denominator: i128, tolerance: f64) -> Option<Rational> {
    if !value.is_finite() || value.abs() >= 1e15 {
        return None;
    }

    // h/k are the convergent numerators/denominators: (h_{-2}, h_{-1}) = (0, 1),
    // (k_{-2}, k_{-1}) = (1, 0)
    let (mut h_prev, mut h) = (0i128, 1i128);
    let (mut k_prev, mut k) = (1i128, 0i128);
    let mut x = value;

    for _ in 0..64 {
        let a = x.floor();
        let a_int = a as i128;
        let h_next = a_int.checked_mul(h)?.checked_add(h_prev)?;
        let k_next = a_int.checked_mul(k)?.checked_add(k_prev)?;
        if k_next > max_denominator {
            break;
        }
        (h_prev, h) = (h, h_next);
        (k_prev, k) = (k, k_next);

        let remainder = x - a;
        let error = (value - h as f64 / k as f64).abs();
        if remainder <= f64::EPSILON || error <= f64::EPSILON * value.abs().max(1.0) {
            break;
        }
        x = 1.0 / remainder;
    }

    if k == 0 {
        return None;
    }
    let approx = Rational::new(h, k);
    if (to_f64(&approx) - value).abs() <= tolerance {
        Some(approx)
    } else {
        None
    }
}

/// `q - floor(q)`, always in `[0, 1)`
pub fn fractional_part(q: &Rational) -> Rational {
    q - q.floor()
}

pub fn to_f64(q: &Rational) -> f64 {
    *q.numer() as f64 / *q.denom() as f64
}

/// Least common multiple of the denominators, `None` once it passes `bound`
/// or overflows
pub fn common_denominator<'a>(values: impl IntoIterator<Item = &'a Rational>, bound: i128) -> Option<i128> {
    let mut lcm: i128 = 1;
    for q in values {
        let d = *q.denom();
        let g = lcm.gcd(&d);
        lcm = (lcm / g).checked_mul(d)?;
        if lcm > bound {
            return None;
        }
    }
    Some(lcm)
}

/// Greatest common divisor of the numerators of integral values; zero if all
/// are zero
pub fn common_divisor<'a>(values: impl IntoIterator<Item = &'a Rational>) -> i128 {
    values
        .into_iter()
        .filter(|q| !q.is_zero())
        .fold(0i128, |g, q| g.gcd(&q.numer().abs()))
}

/// `q` scaled by `factor`, `None` on overflow
pub fn scale(q: &Rational, factor: i128) -> Option<Rational> {
    q.checked_mul(&Rational::from_integer(factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i128, d: i128) -> Rational {
        Rational::new(n, d)
    }

    #[test]
    fn test_noise_snaps_to_integers() {
        assert_eq!(approximate(0.9999999, 10_000, 1e-6), Some(q(1, 1)));
        assert_eq!(approximate(2.0000001, 10_000, 1e-6), Some(q(2, 1)));
        assert_eq!(approximate(-0.0000001, 10_000, 1e-6), Some(q(0, 1)));
    }

    #[test]
    fn test_recovers_simple_fractions() {
        assert_eq!(approximate(1.0 / 3.0, 10_000, 1e-6), Some(q(1, 3)));
        assert_eq!(approximate(0.33333334, 10_000, 1e-6), Some(q(1, 3)));
        assert_eq!(approximate(-2.5, 10_000, 1e-6), Some(q(-5, 2)));
        assert_eq!(approximate(0.2857142857, 10_000, 1e-6), Some(q(2, 7)));
    }

    #[test]
    fn test_rejects_values_needing_large_denominators() {
        // sqrt(2) - 1 has no convergent within 1e-6 below denominator 100
        assert_eq!(approximate(std::f64::consts::SQRT_2 - 1.0, 100, 1e-6), None);
        assert_eq!(approximate(f64::NAN, 100, 1e-6), None);
        assert_eq!(approximate(f64::INFINITY, 100, 1e-6), None);
    }

    #[test]
    fn test_fractional_part_of_negatives() {
        assert_eq!(fractional_part(&q(-1, 3)), q(2, 3));
        assert_eq!(fractional_part(&q(7, 2)), q(1, 2));
        assert_eq!(fractional_part(&q(4, 1)), q(0, 1));
    }

    #[test]
    fn test_common_denominator_and_divisor() {
        let values = [q(1, 2), q(1, 3), q(5, 6)];
        assert_eq!(common_denominator(&values, 1_000), Some(6));
        assert_eq!(common_denominator(&values, 5), None);

        let ints = [q(4, 1), q(-6, 1), q(0, 1)];
        assert_eq!(common_divisor(&ints), 2);
    }
}

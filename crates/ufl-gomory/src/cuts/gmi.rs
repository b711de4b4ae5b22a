use num_traits::{Signed, Zero};

use super::{CutGenerator, CutKind, RawCut, one_minus, proper_fraction, ratio_times};
use crate::rational;
use crate::tableau::ExactRow;

/// Gomory mixed-integer cut.
///
/// With `f0 = frac(b)` and `fj = frac(a_j)`, integer columns get `fj` when
/// `fj ≤ f0` and `f0/(1-f0)·(1-fj)` otherwise; continuous columns get `a_j`
/// when `a_j ≥ 0` and `f0/(1-f0)·(-a_j)` otherwise. The cut is `Σ ≥ f0`.
#[derive(Debug, Clone, Copy)]
pub struct MixedIntegerGomory {
    /// Rows with `1 - f0` below this are skipped
    pub tolerance: f64,
}

impl Default for MixedIntegerGomory {
    fn default() -> Self {
        Self { tolerance: 1e-6 }
    }
}

impl MixedIntegerGomory {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl CutGenerator for MixedIntegerGomory {
    fn kind(&self) -> CutKind {
        CutKind::Gmi
    }

    fn derive(&self, row: &ExactRow, integer_columns: &[bool]) -> Option<RawCut> {
        let f0 = proper_fraction(&row.value)?;
        let complement = one_minus(&f0)?;
        if rational::to_f64(&complement) < self.tolerance || rational::to_f64(&f0) < self.tolerance {
            return None;
        }

        let mut terms = Vec::with_capacity(row.entries.len());
        for (j, a) in &row.entries {
            let coefficient = if integer_columns.get(*j).copied().unwrap_or(false) {
                let fj = rational::fractional_part(a);
                if fj <= f0 {
                    fj
                } else {
                    ratio_times(&f0, &one_minus(&fj)?, &complement)?
                }
            } else if !a.is_negative() {
                *a
            } else {
                ratio_times(&f0, &a.abs(), &complement)?
            };
            if !coefficient.is_zero() {
                terms.push((*j, coefficient));
            }
        }
        if terms.is_empty() {
            return None;
        }
        Some(RawCut { terms, rhs: f0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::FractionalGomory;
    use crate::rational::Rational;

    /// Every coefficient of `strong` is at most the matching one of `weak`
    fn dominates(strong: &RawCut, weak: &RawCut) -> bool {
        weak.terms.iter().all(|(j, w)| {
            let s = strong
                .terms
                .iter()
                .find(|(k, _)| k == j)
                .map(|(_, s)| *s)
                .unwrap_or_else(Rational::zero);
            s <= *w
        })
    }

    fn q(n: i128, d: i128) -> Rational {
        Rational::new(n, d)
    }

    fn row(value: Rational, entries: Vec<(usize, Rational)>) -> ExactRow {
        ExactRow {
            row: 0,
            basic: 0,
            value,
            entries,
        }
    }

    #[test]
    fn test_integer_columns_pick_the_smaller_rule() {
        // f0 = 1/4; f1 = 1/8 <= f0 keeps 1/8; f2 = 3/4 > f0 gives 1/3 * 1/4
        let source = row(q(5, 4), vec![(1, q(1, 8)), (2, q(3, 4))]);
        let cut = MixedIntegerGomory::default().derive(&source, &[true; 3]).unwrap();
        assert_eq!(cut.rhs, q(1, 4));
        assert_eq!(cut.terms, vec![(1, q(1, 8)), (2, q(1, 12))]);
    }

    #[test]
    fn test_continuous_columns() {
        // f0 = 1/2, so f0/(1-f0) = 1
        let source = row(q(1, 2), vec![(1, q(3, 2)), (2, q(-2, 1))]);
        let cut = MixedIntegerGomory::default().derive(&source, &[true, false, false]).unwrap();
        assert_eq!(cut.terms, vec![(1, q(3, 2)), (2, q(2, 1))]);
    }

    #[test]
    fn test_guards() {
        let gmi = MixedIntegerGomory::new(1e-3);
        assert!(gmi.derive(&row(q(2, 1), vec![(1, q(1, 2))]), &[true; 2]).is_none());
        // 1 - f0 = 1/10000 is below the guard
        assert!(gmi.derive(&row(q(9999, 10000), vec![(1, q(1, 2))]), &[true; 2]).is_none());
        assert!(gmi.derive(&row(q(1, 2), vec![(1, q(3, 1))]), &[true; 2]).is_none());
    }

    #[test]
    fn test_dominates_gfc_on_pure_integer_rows() {
        let source = row(q(2, 5), vec![(1, q(1, 5)), (2, q(4, 5)), (3, q(-7, 5))]);
        let integer = [true; 4];
        let gmi = MixedIntegerGomory::default().derive(&source, &integer).unwrap();
        let gfc = FractionalGomory.derive(&source, &integer).unwrap();
        assert_eq!(gmi.rhs, gfc.rhs);
        assert!(dominates(&gmi, &gfc));
    }
}

use num_traits::Zero;

use super::{CutGenerator, CutKind, RawCut, proper_fraction};
use crate::rational;
use crate::tableau::ExactRow;

/// Fractional Gomory cut: `Σ frac(a_j)·x_j ≥ frac(b)`.
///
/// Only valid when every nonbasic column in the row is integral, so rows
/// touching a continuous column are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FractionalGomory;

impl CutGenerator for FractionalGomory {
    fn kind(&self) -> CutKind {
        CutKind::Gfc
    }

    fn derive(&self, row: &ExactRow, integer_columns: &[bool]) -> Option<RawCut> {
        let f0 = proper_fraction(&row.value)?;
        let mut terms = Vec::with_capacity(row.entries.len());
        for (j, a) in &row.entries {
            if !integer_columns.get(*j).copied().unwrap_or(false) {
                return None;
            }
            let fj = rational::fractional_part(a);
            if !fj.is_zero() {
                terms.push((*j, fj));
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
    use crate::rational::Rational;

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
    fn test_fractional_parts_of_negative_entries() {
        // x0 + 1/2 x1 - 3/2 x2 = 5/2
        let source = row(q(5, 2), vec![(1, q(1, 2)), (2, q(-3, 2))]);
        let cut = FractionalGomory.derive(&source, &[true; 3]).unwrap();
        assert_eq!(cut.rhs, q(1, 2));
        assert_eq!(cut.terms, vec![(1, q(1, 2)), (2, q(1, 2))]);
    }

    #[test]
    fn test_integral_entries_drop_out() {
        let source = row(q(1, 3), vec![(1, q(2, 1)), (2, q(1, 3))]);
        let cut = FractionalGomory.derive(&source, &[true; 3]).unwrap();
        assert_eq!(cut.terms, vec![(2, q(1, 3))]);
    }

    #[test]
    fn test_skips_integral_rows_and_continuous_columns() {
        assert!(FractionalGomory.derive(&row(q(1, 1), vec![(1, q(1, 2))]), &[true; 2]).is_none());
        assert!(
            FractionalGomory
                .derive(&row(q(1, 2), vec![(1, q(1, 2))]), &[true, false])
                .is_none()
        );
    }
}

use crate::rational::{Approximator, Rational};
use crate::relaxation::{BasisStatus, LpRelaxation, RelaxationError};
use num_traits::Zero;

/// Entries smaller than this are treated as exact zeros before
/// reconstruction
const ENTRY_EPSILON: f64 = 1e-11;

/// One row of the optimal basis: which column is basic in it and at what value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicRow {
    pub row: usize,
    pub basic: usize,
    pub value: f64,
}

/// Primal values and basis of an optimal relaxation.
///
/// Tableau rows are not read until asked for with [`BasisSnapshot::row`].
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSnapshot {
    pub num_structural: usize,
    pub num_rows: usize,
    /// Values of structural then slack columns
    pub values: Vec<f64>,
    pub status: Vec<BasisStatus>,
    pub rows: Vec<BasicRow>,
}

impl BasisSnapshot {
    /// Read the basis of the last optimal solve.
    ///
    /// Fails with [`RelaxationError::TableauUnavailable`] if the solver
    /// reports a basic column outside the structural and slack range, or any
    /// column resting at an upper bound (all columns here are bounded only
    /// from below).
    pub fn extract<R: LpRelaxation + ?Sized>(relaxation: &R) -> Result<Self, RelaxationError> {
        let num_structural = relaxation.num_structural();
        let num_rows = relaxation.num_rows();
        let num_columns = num_structural + num_rows;

        let values = relaxation.column_values()?;
        let status = relaxation.basis_status()?;
        let basics = relaxation.basic_variables()?;

        if values.len() != num_columns || status.len() != num_columns || basics.len() != num_rows {
            return Err(RelaxationError::TableauUnavailable(format!(
                "basis covers {} values, {} statuses and {} rows for {} columns and {} rows",
                values.len(),
                status.len(),
                basics.len(),
                num_columns,
                num_rows
            )));
        }
        if let Some(j) = status.iter().position(|s| *s == BasisStatus::AtUpperBound) {
            return Err(RelaxationError::TableauUnavailable(format!(
                "column {} is nonbasic at its upper bound",
                j
            )));
        }

        let mut rows = Vec::with_capacity(num_rows);
        for (row, &basic) in basics.iter().enumerate() {
            if basic >= num_columns {
                return Err(RelaxationError::TableauUnavailable(format!(
                    "row {} has basic column {} outside {} columns",
                    row, basic, num_columns
                )));
            }
            rows.push(BasicRow {
                row,
                basic,
                value: values[basic],
            });
        }

        Ok(Self {
            num_structural,
            num_rows,
            values,
            status,
            rows,
        })
    }

    /// Structural part of the primal solution
    pub fn structural_values(&self) -> &[f64] {
        &self.values[..self.num_structural]
    }

    pub fn is_structural(&self, column: usize) -> bool {
        column < self.num_structural
    }

    /// Fetch tableau row `row` and keep its nonzero nonbasic entries
    pub fn row<R: LpRelaxation + ?Sized>(&self, relaxation: &R, row: usize) -> Result<TableauRow, RelaxationError> {
        let basic = self
            .rows
            .get(row)
            .ok_or_else(|| RelaxationError::TableauUnavailable(format!("row {} not in basis", row)))?;
        let (coefficients, rhs) = relaxation.tableau_row(row)?;

        let entries = coefficients
            .iter()
            .enumerate()
            .filter(|&(j, a)| j != basic.basic && self.status.get(j) != Some(&BasisStatus::Basic) && a.abs() > ENTRY_EPSILON)
            .map(|(j, &a)| (j, a))
            .collect();

        Ok(TableauRow {
            row,
            basic: basic.basic,
            value: rhs,
            entries,
        })
    }
}

/// `x_basic + Σ a_j x_j = value` over the nonbasic columns `j`
#[derive(Debug, Clone, PartialEq)]
pub struct TableauRow {
    pub row: usize,
    pub basic: usize,
    pub value: f64,
    pub entries: Vec<(usize, f64)>,
}

/// A tableau row with every number recovered as an exact rational
#[derive(Debug, Clone, PartialEq)]
pub struct ExactRow {
    pub row: usize,
    pub basic: usize,
    pub value: Rational,
    /// Nonzero entries only
    pub entries: Vec<(usize, Rational)>,
}

impl TableauRow {
    /// Recover exact values; `None` if any number has no close rational
    pub fn reconstruct(&self, approximator: &Approximator) -> Option<ExactRow> {
        let value = approximator.approximate(self.value)?;
        let mut entries = Vec::with_capacity(self.entries.len());
        for &(j, a) in &self.entries {
            let q = approximator.approximate(a)?;
            if !q.is_zero() {
                entries.push((j, q));
            }
        }
        Some(ExactRow {
            row: self.row,
            basic: self.basic,
            value,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relaxation::{LpStatus, Sense};
    use gomory_lp::{LpProblem, Session};

    fn knapsack() -> Session {
        // Minimize -x - y subject to 2x + 2y <= 3, x <= 1, y <= 1
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![-1.0, -1.0], true);
        let mut session = Session::new(problem);
        session.add_constraint("cap", vec![2.0, 2.0], Sense::Le, 3.0).unwrap();
        session.add_constraint("x_ub", vec![1.0, 0.0], Sense::Le, 1.0).unwrap();
        session.add_constraint("y_ub", vec![0.0, 1.0], Sense::Le, 1.0).unwrap();
        session
    }

    #[test]
    fn test_snapshot_matches_basis() {
        let mut session = knapsack();
        assert_eq!(session.solve().unwrap(), LpStatus::Optimal);
        let snapshot = BasisSnapshot::extract(&session).unwrap();
        assert_eq!(snapshot.num_structural, 2);
        assert_eq!(snapshot.rows.len(), 3);
        assert_eq!(snapshot.values.len(), 5);
        let x = snapshot.structural_values();
        assert!((x[0] + x[1] - 1.5).abs() < 1e-9);
        for basic in &snapshot.rows {
            assert_eq!(snapshot.status[basic.basic], BasisStatus::Basic);
        }
    }

    #[test]
    fn test_rows_only_hold_nonbasic_entries() {
        let mut session = knapsack();
        session.solve().unwrap();
        let snapshot = BasisSnapshot::extract(&session).unwrap();
        for i in 0..snapshot.num_rows {
            let row = snapshot.row(&session, i).unwrap();
            assert!((row.value - snapshot.rows[i].value).abs() < 1e-9);
            for &(j, _) in &row.entries {
                assert_ne!(snapshot.status[j], BasisStatus::Basic);
            }
            let exact = row.reconstruct(&Approximator::default()).unwrap();
            assert_eq!(exact.basic, row.basic);
        }
        assert!(matches!(
            snapshot.row(&session, 7),
            Err(RelaxationError::TableauUnavailable(_))
        ));
    }

    #[test]
    fn test_unsolved_relaxation_has_no_basis() {
        let session = knapsack();
        assert!(matches!(
            BasisSnapshot::extract(&session),
            Err(RelaxationError::TableauUnavailable(_))
        ));
    }
}

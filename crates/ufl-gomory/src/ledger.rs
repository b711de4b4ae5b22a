use crate::cuts::Cut;
use crate::formulation::ProblemData;
use crate::rational::{Approximator, Rational};
use crate::relaxation::Sense;
use num_traits::Zero;

/// Exact copy of one row of the relaxation
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub name: String,
    pub terms: Vec<(usize, Rational)>,
    pub rhs: Rational,
    pub sense: Sense,
    /// Integer coefficients and rhs, so the row's slack is integral
    pub integral: bool,
    /// Every number was recovered exactly; otherwise the row cannot be
    /// substituted into a cut
    pub exact: bool,
}

/// The rows of the relaxation, in relaxation order, as exact rationals.
///
/// Kept in step with the session: a cut is pushed only once it survives
/// its re-solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowLedger {
    rows: Vec<LedgerRow>,
}

impl RowLedger {
    pub fn from_problem(data: &ProblemData, approximator: &Approximator) -> Self {
        let rows = data
            .matrix
            .iter()
            .zip(&data.rhs)
            .zip(&data.row_names)
            .map(|((coefficients, &rhs), name)| exact_row(name, coefficients, rhs, approximator))
            .collect();
        Self { rows }
    }

    pub fn push_cut(&mut self, cut: &Cut) {
        self.rows.push(LedgerRow {
            name: cut.name.clone(),
            terms: cut.coefficients.iter().map(|(&j, q)| (j, *q)).collect(),
            rhs: cut.rhs,
            sense: cut.sense(),
            integral: cut.integral,
            exact: true,
        });
    }

    pub fn row(&self, index: usize) -> Option<&LedgerRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Integrality of every structural then slack column
    pub fn column_integrality(&self, num_structural: usize) -> Vec<bool> {
        let mut columns = vec![true; num_structural];
        columns.extend(self.rows.iter().map(|row| row.integral && row.exact));
        columns
    }
}

fn exact_row(name: &str, coefficients: &[f64], rhs: f64, approximator: &Approximator) -> LedgerRow {
    let mut terms = Vec::new();
    let mut exact = true;
    for (j, &a) in coefficients.iter().enumerate() {
        if a == 0.0 {
            continue;
        }
        match approximator.approximate(a) {
            Some(q) if !q.is_zero() => terms.push((j, q)),
            Some(_) => {}
            None => exact = false,
        }
    }
    let rhs = match approximator.approximate(rhs) {
        Some(q) => q,
        None => {
            exact = false;
            Rational::zero()
        }
    };
    let integral = exact && rhs.is_integer() && terms.iter().all(|(_, q)| q.is_integer());
    LedgerRow {
        name: name.to_string(),
        terms,
        rhs,
        sense: Sense::Le,
        integral,
        exact,
    }
}

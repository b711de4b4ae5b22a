use gomory_lp::{LpError, Session};
use thiserror::Error;

pub use gomory_lp::{BasisStatus, ConstraintOp as Sense, LpStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelaxationError {
    /// The solver cannot hand out its basis or tableau in the current state
    #[error("Tableau unavailable: {0}")]
    TableauUnavailable(String),
    /// The solver call itself failed
    #[error("Solver call failed: {0}")]
    SolverCall(String),
}

impl From<LpError> for RelaxationError {
    fn from(e: LpError) -> Self {
        match e {
            LpError::NoBasis | LpError::RowOutOfRange { .. } => RelaxationError::TableauUnavailable(e.to_string()),
            _ => RelaxationError::SolverCall(e.to_string()),
        }
    }
}

/// The simplex internals the cutting-plane engine needs from an LP backend.
///
/// Columns `0..num_structural()` are the structural variables and column
/// `num_structural() + k` is the slack of row `k`, with
/// `s_k = rhs_k - a_k·x` for [`Sense::Le`] rows and `s_k = a_k·x - rhs_k`
/// for [`Sense::Ge`] rows. Rows keep their insertion order; removing a row
/// shifts the slack columns of later rows down by one.
pub trait LpRelaxation {
    fn solve(&mut self) -> Result<LpStatus, RelaxationError>;

    fn objective_value(&self) -> Result<f64, RelaxationError>;

    /// Values of all structural and slack columns
    fn column_values(&self) -> Result<Vec<f64>, RelaxationError>;

    fn basis_status(&self) -> Result<Vec<BasisStatus>, RelaxationError>;

    /// Column that is basic in each row
    fn basic_variables(&self) -> Result<Vec<usize>, RelaxationError>;

    /// Row `row` of `B⁻¹[A I]` over all structural and slack columns,
    /// together with its right-hand side
    fn tableau_row(&self, row: usize) -> Result<(Vec<f64>, f64), RelaxationError>;

    fn constraint_rhs(&self) -> Vec<f64>;

    fn add_constraint(
        &mut self,
        coefficients: &[(usize, f64)],
        sense: Sense,
        rhs: f64,
        name: &str,
    ) -> Result<(), RelaxationError>;

    fn remove_constraint(&mut self, name: &str) -> Result<(), RelaxationError>;

    fn num_structural(&self) -> usize;

    fn num_rows(&self) -> usize;

    /// Release the session. Later calls may fail.
    fn close(&mut self);
}

impl LpRelaxation for Session {
    fn solve(&mut self) -> Result<LpStatus, RelaxationError> {
        Ok(Session::solve(self)?)
    }

    fn objective_value(&self) -> Result<f64, RelaxationError> {
        Ok(Session::objective_value(self)?)
    }

    fn column_values(&self) -> Result<Vec<f64>, RelaxationError> {
        Ok(Session::column_values(self)?)
    }

    fn basis_status(&self) -> Result<Vec<BasisStatus>, RelaxationError> {
        Ok(Session::basis_status(self)?)
    }

    fn basic_variables(&self) -> Result<Vec<usize>, RelaxationError> {
        Ok(Session::basic_variables(self)?.to_vec())
    }

    fn tableau_row(&self, row: usize) -> Result<(Vec<f64>, f64), RelaxationError> {
        Ok(Session::tableau_row(self, row)?)
    }

    fn constraint_rhs(&self) -> Vec<f64> {
        Session::constraint_rhs(self)
    }

    fn add_constraint(
        &mut self,
        coefficients: &[(usize, f64)],
        sense: Sense,
        rhs: f64,
        name: &str,
    ) -> Result<(), RelaxationError> {
        let mut dense = vec![0.0; self.num_variables()];
        for &(j, a) in coefficients {
            let slot = dense
                .get_mut(j)
                .ok_or_else(|| RelaxationError::SolverCall(format!("column {} out of range in {}", j, name)))?;
            *slot += a;
        }
        Ok(Session::add_constraint(self, name, dense, sense, rhs)?)
    }

    fn remove_constraint(&mut self, name: &str) -> Result<(), RelaxationError> {
        Session::remove_constraint(self, name)?;
        Ok(())
    }

    fn num_structural(&self) -> usize {
        self.num_variables()
    }

    fn num_rows(&self) -> usize {
        self.num_constraints()
    }

    fn close(&mut self) {
        Session::close(self)
    }
}

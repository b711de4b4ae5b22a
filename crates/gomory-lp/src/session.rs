use crate::problem::{Constraint, ConstraintOp, LpProblem};
use crate::simplex::{Solver, Tableau};
use crate::solution::{BasisStatus, LpError, LpStatus};

/// A mutable LP relaxation that keeps its last optimal tableau around.
///
/// Rows can be appended and removed between solves; each call to
/// [`Session::solve`] re-optimizes the current row set from scratch. The
/// basis, values and tableau rows refer to the most recent optimal solve and
/// are invalidated by any change to the rows.
///
/// Column `j < n` is structural variable `j`; column `n + i` is the slack of
/// row `i` (see [`Solver`] for its orientation).
#[derive(Debug)]
pub struct Session {
    problem: LpProblem,
    solver: Solver,
    tableau: Option<Tableau>,
    status: Option<LpStatus>,
    closed: bool,
}

impl Session {
    /// Open a session on the objective of `problem` and all of its rows
    pub fn new(problem: LpProblem) -> Self {
        Self::with_solver(problem, Solver::default())
    }

    pub fn with_solver(problem: LpProblem, solver: Solver) -> Self {
        Self {
            problem,
            solver,
            tableau: None,
            status: None,
            closed: false,
        }
    }

    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    pub fn num_variables(&self) -> usize {
        self.problem.num_variables()
    }

    pub fn num_constraints(&self) -> usize {
        self.problem.num_constraints()
    }

    /// Status of the last solve, if any since the rows last changed
    pub fn status(&self) -> Option<LpStatus> {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn solve(&mut self) -> Result<LpStatus, LpError> {
        self.ensure_open()?;
        let status = match self.solver.optimize(&self.problem) {
            Ok(tableau) => {
                self.tableau = Some(tableau);
                LpStatus::Optimal
            }
            Err(status) => {
                self.tableau = None;
                status
            }
        };
        self.status = Some(status);
        Ok(status)
    }

    pub fn objective_value(&self) -> Result<f64, LpError> {
        let tableau = self.tableau()?;
        Ok(self.solver.objective_value(tableau, &self.problem))
    }

    /// Values of all structural and slack columns
    pub fn column_values(&self) -> Result<Vec<f64>, LpError> {
        Ok(self.tableau()?.column_values())
    }

    /// Per-column basis status; every nonbasic column rests at its lower bound
    pub fn basis_status(&self) -> Result<Vec<BasisStatus>, LpError> {
        let tableau = self.tableau()?;
        let mut status = vec![BasisStatus::AtLowerBound; tableau.artificial_start()];
        for &basic in &tableau.basic_vars {
            if let Some(s) = status.get_mut(basic) {
                *s = BasisStatus::Basic;
            }
        }
        Ok(status)
    }

    /// Column that is basic in each row
    pub fn basic_variables(&self) -> Result<&[usize], LpError> {
        Ok(&self.tableau()?.basic_vars)
    }

    /// Row `row` of `B⁻¹[A I]` over all structural and slack columns, with
    /// its right-hand side `B⁻¹b`
    pub fn tableau_row(&self, row: usize) -> Result<(Vec<f64>, f64), LpError> {
        let tableau = self.tableau()?;
        let rows = tableau.basic_vars.len();
        if row >= rows {
            return Err(LpError::RowOutOfRange { row, rows });
        }
        Ok((tableau.row(row).to_vec(), tableau.rhs(row)))
    }

    pub fn constraint_rhs(&self) -> Vec<f64> {
        self.problem.constraints.iter().map(|c| c.rhs).collect()
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) -> Result<(), LpError> {
        self.ensure_open()?;
        let name = name.into();
        if coefficients.len() != self.problem.num_variables() {
            return Err(LpError::DimensionMismatch {
                name,
                expected: self.problem.num_variables(),
                found: coefficients.len(),
            });
        }
        if !rhs.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(LpError::NonFinite(name));
        }
        if self.problem.constraint_index(&name).is_some() {
            return Err(LpError::DuplicateConstraint(name));
        }
        self.problem.add_constraint(name, coefficients, op, rhs);
        self.invalidate();
        Ok(())
    }

    pub fn remove_constraint(&mut self, name: &str) -> Result<Constraint, LpError> {
        self.ensure_open()?;
        let removed = self
            .problem
            .remove_constraint(name)
            .ok_or_else(|| LpError::UnknownConstraint(name.to_string()))?;
        self.invalidate();
        Ok(removed)
    }

    /// Release the tableau; any further call fails with [`LpError::Closed`]
    pub fn close(&mut self) {
        self.tableau = None;
        self.status = None;
        self.closed = true;
    }

    fn invalidate(&mut self) {
        self.tableau = None;
        self.status = None;
    }

    fn ensure_open(&self) -> Result<(), LpError> {
        if self.closed { Err(LpError::Closed) } else { Ok(()) }
    }

    fn tableau(&self) -> Result<&Tableau, LpError> {
        self.ensure_open()?;
        self.tableau.as_ref().ok_or(LpError::NoBasis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knapsack_like() -> Session {
        // Minimize -x - y subject to 2x + 2y <= 3, x <= 1, y <= 1
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![-1.0, -1.0], true);
        problem.add_constraint("cap", vec![2.0, 2.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("x_ub", vec![1.0, 0.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("y_ub", vec![0.0, 1.0], ConstraintOp::Le, 1.0);
        Session::new(problem)
    }

    #[test]
    fn test_tableau_rows_reproduce_basic_values() {
        let mut session = knapsack_like();
        assert_eq!(session.solve().unwrap(), LpStatus::Optimal);
        assert!((session.objective_value().unwrap() + 1.5).abs() < 1e-9);

        let values = session.column_values().unwrap();
        let status = session.basis_status().unwrap();
        let basic = session.basic_variables().unwrap().to_vec();
        for (row, &col) in basic.iter().enumerate() {
            let (coefficients, rhs) = session.tableau_row(row).unwrap();
            assert_eq!(status[col], BasisStatus::Basic);
            assert!((coefficients[col] - 1.0).abs() < 1e-9);
            assert!((values[col] - rhs).abs() < 1e-9);
            // Nonbasic columns sit at zero, so the row reads x_B = rhs
            let lhs: f64 = coefficients.iter().zip(&values).map(|(a, x)| a * x).sum();
            assert!((lhs - rhs).abs() < 1e-9);
        }
    }

    #[test]
    fn test_slack_orientation() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("floor", vec![1.0], ConstraintOp::Ge, 0.25);
        problem.add_constraint("ceiling", vec![1.0], ConstraintOp::Le, 2.0);
        let mut session = Session::new(problem);
        session.solve().unwrap();

        let values = session.column_values().unwrap();
        assert!((values[0] - 0.25).abs() < 1e-9);
        // s_floor = x - 0.25, s_ceiling = 2 - x
        assert!(values[1].abs() < 1e-9);
        assert!((values[2] - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_add_and_remove_constraint() {
        let mut session = knapsack_like();
        session.solve().unwrap();
        let before = session.objective_value().unwrap();

        session
            .add_constraint("cut", vec![1.0, 1.0], ConstraintOp::Le, 1.0)
            .unwrap();
        assert_eq!(session.objective_value(), Err(LpError::NoBasis));
        session.solve().unwrap();
        assert!((session.objective_value().unwrap() + 1.0).abs() < 1e-9);
        let values = session.column_values().unwrap();
        assert!(session
            .problem()
            .constraints
            .iter()
            .all(|row| row.is_satisfied(&values, 1e-9)));

        session.remove_constraint("cut").unwrap();
        session.solve().unwrap();
        assert!((session.objective_value().unwrap() - before).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_rows() {
        let mut session = knapsack_like();
        assert!(matches!(
            session.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0),
            Err(LpError::DimensionMismatch { .. })
        ));
        assert_eq!(
            session.add_constraint("cap", vec![1.0, 1.0], ConstraintOp::Le, 1.0),
            Err(LpError::DuplicateConstraint("cap".to_string()))
        );
        assert!(matches!(
            session.remove_constraint("missing"),
            Err(LpError::UnknownConstraint(_))
        ));
    }

    #[test]
    fn test_closed_session_refuses_work() {
        let mut session = knapsack_like();
        session.solve().unwrap();
        session.close();
        assert!(session.is_closed());
        assert_eq!(session.solve(), Err(LpError::Closed));
        assert_eq!(session.basic_variables().err(), Some(LpError::Closed));
    }
}

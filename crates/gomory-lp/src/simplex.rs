use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::LpStatus;

/// Dense two-phase simplex for problems in inequality form.
///
/// Every row `i` receives its own slack column `n + i`, oriented so that
/// `s_i = rhs_i - a_i·x` for `Le` rows and `s_i = a_i·x - rhs_i` for `Ge`
/// rows. Rows whose right-hand side makes the slack basis infeasible get a
/// phase 1 artificial, which is driven out of the basis before phase 2, so
/// an optimal tableau only ever has structural or slack columns in its basis.
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 50_000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Run both phases and hand back the optimal tableau, or the status that
    /// prevented one from being reached.
    pub(crate) fn optimize(&self, problem: &LpProblem) -> Result<Tableau, LpStatus> {
        let mut tableau = self.build_tableau(problem);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            self.phase1(&mut tableau)?;
        }

        // Phase 2: Optimize
        self.phase2(&mut tableau)?;
        Ok(tableau)
    }

    pub(crate) fn objective_value(&self, tableau: &Tableau, problem: &LpProblem) -> f64 {
        problem
            .objective
            .coefficients
            .iter()
            .zip(tableau.column_values())
            .map(|(c, x)| c * x)
            .sum()
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // A row needs an artificial when its slack would start out negative
        let oriented_rhs: Vec<f64> = problem
            .constraints
            .iter()
            .map(|c| match c.op {
                ConstraintOp::Le => c.rhs,
                ConstraintOp::Ge => -c.rhs,
            })
            .collect();
        let n_artificial = oriented_rhs.iter().filter(|&&rhs| rhs < 0.0).count();

        let total_cols = n_vars + n_constraints + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack: n_constraints,
            n_artificial,
        };

        let rhs_col = total_cols - 1;
        let mut artificial_idx = n_vars + n_constraints;

        for (i, c) in problem.constraints.iter().enumerate() {
            let orient = match c.op {
                ConstraintOp::Le => 1.0,
                ConstraintOp::Ge => -1.0,
            };
            // Keep the RHS non-negative
            let flip = if oriented_rhs[i] < 0.0 { -1.0 } else { 1.0 };

            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = flip * orient * coef;
            }
            tableau.data[i][n_vars + i] = flip;
            tableau.data[i][rhs_col] = flip * oriented_rhs[i];

            if flip < 0.0 {
                tableau.data[i][artificial_idx] = 1.0;
                tableau.basic_vars[i] = artificial_idx;
                artificial_idx += 1;
            } else {
                tableau.basic_vars[i] = n_vars + i;
            }
        }

        // Objective row (last row)
        // Simplex maximizes, so for minimization we negate the coefficients
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> Result<(), LpStatus> {
        // Auxiliary objective: maximize -sum of artificials
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.artificial_start();

        // Save original objective
        let orig_obj = tableau.data[n_constraints].clone();

        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }

        // Make objective row consistent with basic artificial variables
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        // Phase 1 is bounded below by zero, so Unbounded cannot happen here
        self.iterate(tableau, n_cols - 1)?;

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance.max(1e-7) {
                return Err(LpStatus::Infeasible);
            }
        }

        self.drive_out_artificials(tableau);

        // Restore original objective and adjust for basic variables
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > 0.0 {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Ok(())
    }

    /// Replace artificials left in the basis at level zero by a structural or
    /// slack column of the same row. The slack block has full row rank, so a
    /// usable pivot always exists unless round-off has wiped the row out.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.artificial_start();
        for i in 0..tableau.basic_vars.len() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let pivot_col = (0..art_start)
                .filter(|&j| tableau.data[i][j].abs() > self.tolerance)
                .max_by(|&a, &b| tableau.data[i][a].abs().total_cmp(&tableau.data[i][b].abs()));
            if let Some(col) = pivot_col {
                self.pivot(tableau, i, col);
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau) -> Result<(), LpStatus> {
        // Exclude artificial variable columns from pivoting
        let exclude_from = tableau.artificial_start();
        self.iterate(tableau, exclude_from)
    }

    /// Pivot until no column below `limit` improves the objective. Starts
    /// with the largest-coefficient rule and falls back to Bland's rule once
    /// the pivot count suggests the tableau is cycling on a degenerate vertex.
    fn iterate(&self, tableau: &mut Tableau, limit: usize) -> Result<(), LpStatus> {
        let bland_after = tableau.data.len() + tableau.data[0].len();

        for iteration in 0..self.max_iterations {
            let bland = iteration >= bland_after;
            let Some(pivot_col) = self.find_pivot_column(tableau, limit, bland) else {
                return Ok(());
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Err(LpStatus::Unbounded);
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        Err(LpStatus::IterationLimit)
    }

    fn find_pivot_column(&self, tableau: &Tableau, limit: usize, bland: bool) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        // Look for the most positive reduced cost (can improve objective)
        let mut max_val = self.tolerance;
        let mut max_col = None;

        for j in 0..limit {
            if tableau.data[obj_row][j] > max_val {
                if bland {
                    return Some(j);
                }
                max_val = tableau.data[obj_row][j];
                max_col = Some(j);
            }
        }

        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val > self.tolerance {
                let ratio = (tableau.data[i][rhs_col] / val).max(0.0);
                let better = match min_row {
                    None => true,
                    Some(row) => {
                        ratio < min_ratio - self.tolerance
                            || (ratio <= min_ratio + self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[row])
                    }
                };
                if better {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }
}

/// Simplex tableau: one row per constraint plus the objective row, one
/// column per structural, slack and artificial variable plus the RHS.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    pub(crate) data: Vec<Vec<f64>>,
    pub(crate) basic_vars: Vec<usize>,
    pub(crate) n_vars: usize,
    pub(crate) n_slack: usize,
    pub(crate) n_artificial: usize,
}

impl Tableau {
    pub(crate) fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }

    fn rhs_col(&self) -> usize {
        self.data[0].len() - 1
    }

    /// Values of every structural and slack column; nonbasic columns sit at zero
    pub(crate) fn column_values(&self) -> Vec<f64> {
        let n_cols = self.artificial_start();
        let rhs_col = self.rhs_col();
        let mut values = vec![0.0; n_cols];
        for (i, &basic) in self.basic_vars.iter().enumerate() {
            if basic < n_cols {
                values[basic] = self.data[i][rhs_col];
            }
        }
        values
    }

    /// Row `i` restricted to structural and slack columns
    pub(crate) fn row(&self, i: usize) -> &[f64] {
        &self.data[i][..self.artificial_start()]
    }

    pub(crate) fn rhs(&self, i: usize) -> f64 {
        self.data[i][self.rhs_col()]
    }
}

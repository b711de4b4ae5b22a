use gomory_lp::{LpProblem, Session};

use crate::error::ValidationError;
use crate::instance::Instance;

/// Linear form `minimize c·x subject to A x <= b, x >= 0` of a 0/1 program.
///
/// Every variable is required to be integral. Rows only ever get appended;
/// cuts live in the relaxation, not here.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData {
    /// Objective coefficients `c`
    pub objective: Vec<f64>,
    /// Constraint matrix `A`, one dense row per constraint
    pub matrix: Vec<Vec<f64>>,
    /// Right-hand side `b`
    pub rhs: Vec<f64>,
    /// Row names, unique within the problem
    pub row_names: Vec<String>,
    variable_names: Vec<String>,
}

impl ProblemData {
    pub fn new(
        objective: Vec<f64>,
        matrix: Vec<Vec<f64>>,
        rhs: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let n = objective.len();
        if rhs.len() != matrix.len() {
            return Err(ValidationError::RhsLength {
                expected: matrix.len(),
                found: rhs.len(),
            });
        }
        for (row, coefficients) in matrix.iter().enumerate() {
            if coefficients.len() != n {
                return Err(ValidationError::RowLength {
                    row,
                    expected: n,
                    found: coefficients.len(),
                });
            }
            if coefficients.iter().any(|a| !a.is_finite()) || !rhs[row].is_finite() {
                return Err(ValidationError::NonFinite(format!("row {}", row)));
            }
        }
        if let Some(j) = objective.iter().position(|c| !c.is_finite()) {
            return Err(ValidationError::NonFinite(format!("objective coefficient {}", j)));
        }

        let row_names = (0..matrix.len()).map(|i| format!("c{}", i)).collect();
        let variable_names = (0..n).map(|j| format!("x{}", j)).collect();
        Ok(Self {
            objective,
            matrix,
            rhs,
            row_names,
            variable_names,
        })
    }

    /// Build the UFL formulation.
    ///
    /// Variables: `y[u]` at `u`, `x[u,v]` at `p + u*r + v`. Rows: each
    /// customer's assignment equality as a `<=`/`>=` pair (the latter negated
    /// into `<=` form), the linking rows `x[u,v] - y[u] <= 0`, and an explicit
    /// `<= 1` bound row per variable.
    pub fn from_instance(instance: &Instance) -> Self {
        let p = instance.num_facilities();
        let r = instance.num_customers();
        let n = p + p * r;

        let mut objective = vec![0.0; n];
        objective[..p].copy_from_slice(instance.fixed_costs());
        for u in 0..p {
            for v in 0..r {
                objective[assignment_index(p, r, u, v)] = instance.assignment_cost(v, u);
            }
        }

        let mut data = Self {
            objective,
            matrix: Vec::new(),
            rhs: Vec::new(),
            row_names: Vec::new(),
            variable_names: Vec::with_capacity(n),
        };
        data.variable_names.extend((0..p).map(|u| format!("y{}", u)));
        for u in 0..p {
            data.variable_names.extend((0..r).map(|v| format!("x{}_{}", u, v)));
        }

        for v in 0..r {
            let mut row = vec![0.0; n];
            for u in 0..p {
                row[assignment_index(p, r, u, v)] = 1.0;
            }
            let negated = row.iter().map(|a| -a).collect();
            data.push_row(format!("assign_le_{}", v), row, 1.0);
            data.push_row(format!("assign_ge_{}", v), negated, -1.0);
        }

        for u in 0..p {
            for v in 0..r {
                let mut row = vec![0.0; n];
                row[assignment_index(p, r, u, v)] = 1.0;
                row[u] = -1.0;
                data.push_row(format!("link_{}_{}", u, v), row, 0.0);
            }
        }

        for j in 0..n {
            let mut row = vec![0.0; n];
            row[j] = 1.0;
            data.push_row(format!("ub_{}", j), row, 1.0);
        }

        data
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_rows(&self) -> usize {
        self.matrix.len()
    }

    /// Pin variable `index` to `value` with a `<=`/`>=` row pair
    pub fn fix_variable(&mut self, index: usize, value: f64) -> Result<(), ValidationError> {
        let n = self.num_variables();
        if index >= n {
            return Err(ValidationError::VariableOutOfRange {
                index,
                num_variables: n,
            });
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(format!("fixing of variable {}", index)));
        }
        let mut row = vec![0.0; n];
        row[index] = 1.0;
        let negated = row.iter().map(|a| -a).collect();
        let prefix = format!("fix_le_{}_", index);
        let k = self.row_names.iter().filter(|name| name.starts_with(&prefix)).count();
        self.push_row(format!("fix_le_{}_{}", index, k), row, value);
        self.push_row(format!("fix_ge_{}_{}", index, k), negated, -value);
        Ok(())
    }

    pub fn objective_value(&self, point: &[f64]) -> f64 {
        self.objective.iter().zip(point).map(|(c, x)| c * x).sum()
    }

    /// Whether `point` satisfies every row and the sign restrictions
    pub fn is_feasible(&self, point: &[f64], tolerance: f64) -> bool {
        point.len() == self.num_variables()
            && point.iter().all(|&x| x >= -tolerance)
            && self.matrix.iter().zip(&self.rhs).all(|(row, &b)| {
                let lhs: f64 = row.iter().zip(point).map(|(a, x)| a * x).sum();
                lhs <= b + tolerance
            })
    }

    /// An LP problem with this objective (minimized) and no rows yet
    pub fn empty_lp(&self) -> LpProblem {
        let mut problem = LpProblem::new(self.variable_names.clone());
        problem.set_objective(self.objective.clone(), true);
        problem
    }

    /// Open a relaxation session ready to be handed to the engine
    pub fn relaxation(&self) -> Session {
        Session::new(self.empty_lp())
    }

    fn push_row(&mut self, name: String, row: Vec<f64>, rhs: f64) {
        self.row_names.push(name);
        self.matrix.push(row);
        self.rhs.push(rhs);
    }
}

/// Column of `x[u,v]` in the UFL layout
pub fn assignment_index(num_facilities: usize, num_customers: usize, facility: usize, customer: usize) -> usize {
    num_facilities + facility * num_customers + customer
}

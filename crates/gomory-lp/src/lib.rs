mod problem;
mod session;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use session::Session;
pub use simplex::Solver;
pub use solution::{BasisStatus, LpError, LpStatus};

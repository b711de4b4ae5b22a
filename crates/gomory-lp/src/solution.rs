use thiserror::Error;

/// Outcome of a simplex solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    /// An optimal basic solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before optimality was proven
    IterationLimit,
}

/// Position of a column relative to the current basis
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisStatus {
    Basic,
    AtLowerBound,
    AtUpperBound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    #[error("Session has been closed")]
    Closed,
    #[error("No optimal basis available; solve the relaxation first")]
    NoBasis,
    #[error("Constraint {name} has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Constraint {0} already exists")]
    DuplicateConstraint(String),
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),
    #[error("Row {row} out of range ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("Non-finite value in constraint {0}")]
    NonFinite(String),
}

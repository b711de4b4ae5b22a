use thiserror::Error;

/// Malformed input. Always fatal: nothing is solved when one of these is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Instance has no facilities")]
    NoFacilities,
    #[error("Expected {expected} fixed costs, found {found}")]
    FixedCostCount { expected: usize, found: usize },
    #[error("Expected {expected} customer rows of assignment costs, found {found}")]
    CustomerCount { expected: usize, found: usize },
    #[error("Customer {customer} has {found} assignment costs, expected {expected}")]
    CustomerRowLength {
        customer: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid {what}: {value} (costs must be finite and non-negative)")]
    InvalidCost { what: String, value: f64 },
    #[error("Row {row} has {found} coefficients, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Expected {expected} right-hand side values, found {found}")]
    RhsLength { expected: usize, found: usize },
    #[error("Non-finite value in problem data at {0}")]
    NonFinite(String),
    #[error("Variable index {index} out of range ({num_variables} variables)")]
    VariableOutOfRange { index: usize, num_variables: usize },
    #[error("Reference optimum must be finite, got {0}")]
    InvalidReference(f64),
    #[error("Relaxation has {found} columns, problem has {expected} variables")]
    RelaxationDimension { expected: usize, found: usize },
    #[error("Relaxation must start without rows, found {0}")]
    RelaxationNotEmpty(usize),
}

/// Errors that escape the cutting-plane engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

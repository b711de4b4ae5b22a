use std::fmt;
use std::path::Path;

use crate::error::ValidationError;
use crate::parser::{LoadError, Parser};

/// Uncapacitated facility location data: `p` facilities with opening costs
/// and an `r × p` matrix of customer-to-facility assignment costs.
///
/// Only constructible through [`Instance::new`], which enforces the
/// dimension and sign invariants, and never mutated afterwards.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    num_facilities: usize,
    num_customers: usize,
    fixed_costs: Vec<f64>,
    assignment_costs: Vec<Vec<f64>>,
}

impl Instance {
    pub fn new(
        num_facilities: usize,
        num_customers: usize,
        fixed_costs: Vec<f64>,
        assignment_costs: Vec<Vec<f64>>,
    ) -> Result<Self, ValidationError> {
        if num_facilities == 0 {
            return Err(ValidationError::NoFacilities);
        }
        if fixed_costs.len() != num_facilities {
            return Err(ValidationError::FixedCostCount {
                expected: num_facilities,
                found: fixed_costs.len(),
            });
        }
        if assignment_costs.len() != num_customers {
            return Err(ValidationError::CustomerCount {
                expected: num_customers,
                found: assignment_costs.len(),
            });
        }
        for (customer, row) in assignment_costs.iter().enumerate() {
            if row.len() != num_facilities {
                return Err(ValidationError::CustomerRowLength {
                    customer,
                    expected: num_facilities,
                    found: row.len(),
                });
            }
        }

        for (u, &cost) in fixed_costs.iter().enumerate() {
            check_cost(cost, || format!("fixed cost of facility {}", u))?;
        }
        for (v, row) in assignment_costs.iter().enumerate() {
            for (u, &cost) in row.iter().enumerate() {
                check_cost(cost, || format!("assignment cost of customer {} to facility {}", v, u))?;
            }
        }

        Ok(Self {
            num_facilities,
            num_customers,
            fixed_costs,
            assignment_costs,
        })
    }

    /// Read an instance in OR-Library UFL format
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        source.parse()
    }

    pub fn num_facilities(&self) -> usize {
        self.num_facilities
    }

    pub fn num_customers(&self) -> usize {
        self.num_customers
    }

    pub fn fixed_costs(&self) -> &[f64] {
        &self.fixed_costs
    }

    /// Row `v` holds the cost of serving customer `v` from each facility
    pub fn assignment_costs(&self) -> &[Vec<f64>] {
        &self.assignment_costs
    }

    pub fn assignment_cost(&self, customer: usize, facility: usize) -> f64 {
        self.assignment_costs[customer][facility]
    }

    /// Write the instance in the plain OR-Library layout: the header, one
    /// fixed cost per line, then one line of assignment costs per customer.
    pub fn to_orlib_string(&self) -> String {
        let mut out = format!("{} {}\n", self.num_facilities, self.num_customers);
        for cost in &self.fixed_costs {
            out.push_str(&format_cost(*cost));
            out.push('\n');
        }
        for row in &self.assignment_costs {
            let line: Vec<String> = row.iter().map(|c| format_cost(*c)).collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }
}

impl std::str::FromStr for Instance {
    type Err = LoadError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let raw = Parser::parse(source)?;
        Ok(Instance::new(
            raw.num_facilities,
            raw.num_customers,
            raw.fixed_costs,
            raw.assignment_costs,
        )?)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "UFL instance: {} facilities, {} customers",
            self.num_facilities, self.num_customers
        )
    }
}

fn check_cost(value: f64, what: impl FnOnce() -> String) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidCost { what: what(), value })
    }
}

fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 && cost.abs() < 1e15 {
        format!("{}", cost as i64)
    } else {
        format!("{}", cost)
    }
}

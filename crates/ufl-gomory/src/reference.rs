//! Exact UFL optimum by enumerating the open-facility sets.

use thiserror::Error;

use crate::formulation::assignment_index;
use crate::instance::Instance;

/// Largest facility count [`enumerate_optimum`] accepts
pub const MAX_ENUMERATED_FACILITIES: usize = 16;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("Enumerating {facilities} facilities is not supported (limit {limit})")]
    TooManyFacilities { facilities: usize, limit: usize },
}

/// An optimal integer solution
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSolution {
    pub cost: f64,
    pub open: Vec<bool>,
    /// Facility serving each customer
    pub assignment: Vec<usize>,
}

impl ReferenceSolution {
    /// The solution as a point in the variable layout of
    /// [`ProblemData::from_instance`](crate::ProblemData::from_instance)
    pub fn to_point(&self) -> Vec<f64> {
        let p = self.open.len();
        let r = self.assignment.len();
        let mut point = vec![0.0; p + p * r];
        for (u, &open) in self.open.iter().enumerate() {
            if open {
                point[u] = 1.0;
            }
        }
        for (v, &u) in self.assignment.iter().enumerate() {
            point[assignment_index(p, r, u, v)] = 1.0;
        }
        point
    }
}

/// Try every non-empty set of open facilities, serving each customer from
/// its cheapest open one. Ties keep the first set found in mask order.
pub fn enumerate_optimum(instance: &Instance) -> Result<ReferenceSolution, ReferenceError> {
    let p = instance.num_facilities();
    if p > MAX_ENUMERATED_FACILITIES {
        return Err(ReferenceError::TooManyFacilities {
            facilities: p,
            limit: MAX_ENUMERATED_FACILITIES,
        });
    }

    let mut best: Option<(f64, u32)> = None;
    for mask in 1u32..(1u32 << p) {
        let fixed: f64 = (0..p)
            .filter(|u| mask & (1 << u) != 0)
            .map(|u| instance.fixed_costs()[u])
            .sum();
        let service: f64 = instance
            .assignment_costs()
            .iter()
            .map(|row| cheapest(row, mask).map_or(0.0, |(_, cost)| cost))
            .sum();
        let cost = fixed + service;
        if best.is_none_or(|(best_cost, _)| cost < best_cost) {
            best = Some((cost, mask));
        }
    }

    // p >= 1, so the loop ran at least once
    let (cost, mask) = best.unwrap_or((0.0, 1));
    let open = (0..p).map(|u| mask & (1 << u) != 0).collect();
    let assignment = instance
        .assignment_costs()
        .iter()
        .map(|row| cheapest(row, mask).map_or(0, |(u, _)| u))
        .collect();
    Ok(ReferenceSolution { cost, open, assignment })
}

fn cheapest(row: &[f64], mask: u32) -> Option<(usize, f64)> {
    row.iter()
        .enumerate()
        .filter(|&(u, _)| mask & (1 << u) != 0)
        .map(|(u, &c)| (u, c))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::ProblemData;

    #[test]
    fn test_scenario_a_optimum() {
        let instance = Instance::new(
            2,
            3,
            vec![10.0, 10.0],
            vec![vec![1.0, 5.0], vec![5.0, 1.0], vec![3.0, 3.0]],
        )
        .unwrap();
        let best = enumerate_optimum(&instance).unwrap();
        assert_eq!(best.cost, 19.0);
        assert_eq!(best.open.iter().filter(|&&o| o).count(), 1);

        let data = ProblemData::from_instance(&instance);
        let point = best.to_point();
        assert!(data.is_feasible(&point, 1e-9));
        assert_eq!(data.objective_value(&point), 19.0);
    }

    #[test]
    fn test_opening_more_pays_off() {
        let instance = Instance::new(2, 2, vec![1.0, 1.0], vec![vec![0.0, 100.0], vec![100.0, 0.0]]).unwrap();
        let best = enumerate_optimum(&instance).unwrap();
        assert_eq!(best.cost, 2.0);
        assert_eq!(best.open, vec![true, true]);
        assert_eq!(best.assignment, vec![0, 1]);
    }

    #[test]
    fn test_limit() {
        let p = MAX_ENUMERATED_FACILITIES + 1;
        let instance = Instance::new(p, 0, vec![1.0; p], vec![]).unwrap();
        assert!(matches!(
            enumerate_optimum(&instance),
            Err(ReferenceError::TooManyFacilities { .. })
        ));
    }
}

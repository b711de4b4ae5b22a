use log::{debug, warn};

use crate::cuts::Cut;
use crate::ledger::RowLedger;
use crate::relaxation::{LpRelaxation, LpStatus, RelaxationError};

/// What happened to one round of cuts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundOutcome {
    /// Cuts offered after dedup and capping
    pub selected: usize,
    /// Cuts that stayed in the relaxation, in the order they were added
    pub added: Vec<Cut>,
    pub rolled_back: usize,
}

/// Ranks cuts and adds them one at a time, re-solving after each and
/// dropping any cut that leaves the relaxation infeasible or pushes its
/// bound past the reference optimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutManager {
    pub max_cuts: usize,
    pub tolerance: f64,
}

impl CutManager {
    pub fn new(max_cuts: usize, tolerance: f64) -> Self {
        Self { max_cuts, tolerance }
    }

    /// Strongest first, duplicates removed, at most `max_cuts`
    pub fn select(&self, mut cuts: Vec<Cut>) -> Vec<Cut> {
        cuts.sort_by(|a, b| b.violation.total_cmp(&a.violation).then_with(|| a.name.cmp(&b.name)));
        let mut selected: Vec<Cut> = Vec::with_capacity(cuts.len().min(self.max_cuts));
        for cut in cuts {
            if selected.len() >= self.max_cuts {
                break;
            }
            let duplicate = selected
                .iter()
                .any(|kept| kept.coefficients == cut.coefficients && kept.rhs == cut.rhs);
            if !duplicate {
                selected.push(cut);
            }
        }
        selected
    }

    /// Add the selected cuts to `relaxation`, keeping `ledger` in step.
    ///
    /// On return the relaxation is solved to optimality with every kept cut.
    /// Errors are solver failures the round cannot recover from.
    pub fn apply<R: LpRelaxation + ?Sized>(
        &self,
        relaxation: &mut R,
        ledger: &mut RowLedger,
        cuts: Vec<Cut>,
        reference: f64,
    ) -> Result<RoundOutcome, RelaxationError> {
        let cuts = self.select(cuts);
        let bound = reference + self.tolerance * (1.0 + reference.abs());
        let mut outcome = RoundOutcome {
            selected: cuts.len(),
            ..RoundOutcome::default()
        };

        for cut in cuts {
            relaxation.add_constraint(&cut.coefficients_f64(), cut.sense(), cut.rhs_f64(), &cut.name)?;
            let status = relaxation.solve()?;
            let objective = match status {
                LpStatus::Optimal => Some(relaxation.objective_value()?),
                _ => None,
            };

            match objective {
                Some(value) if value <= bound => {
                    debug!(
                        "Added {} cut {} (violation {:.3e}), objective {:.6}",
                        cut.kind, cut.name, cut.violation, value
                    );
                    ledger.push_cut(&cut);
                    outcome.added.push(cut);
                }
                _ => {
                    warn!(
                        "Rolling back cut {}: relaxation {} after adding it",
                        cut.name,
                        objective.map_or_else(|| format!("{:?}", status), |v| format!("objective {:.6} above bound {:.6}", v, bound))
                    );
                    relaxation.remove_constraint(&cut.name)?;
                    outcome.rolled_back += 1;
                    let status = relaxation.solve()?;
                    if status != LpStatus::Optimal {
                        return Err(RelaxationError::SolverCall(format!(
                            "relaxation {:?} after rolling back {}",
                            status, cut.name
                        )));
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::CutKind;
    use crate::formulation::ProblemData;
    use crate::rational::{Approximator, Rational};
    use crate::relaxation::Sense;
    use std::collections::BTreeMap;

    fn cut(name: &str, coefficients: &[(usize, i128)], rhs: i128, violation: f64) -> Cut {
        Cut {
            name: name.to_string(),
            kind: CutKind::Gmi,
            iteration: 1,
            source_row: 0,
            coefficients: coefficients
                .iter()
                .map(|&(j, a)| (j, Rational::from_integer(a)))
                .collect::<BTreeMap<_, _>>(),
            rhs: Rational::from_integer(rhs),
            violation,
            integral: true,
        }
    }

    /// Minimize x0 + x1 subject to 2x0 + 2x1 >= 1 and both at most one
    fn setup() -> (gomory_lp::Session, RowLedger) {
        let data = ProblemData::new(
            vec![1.0, 1.0],
            vec![vec![-2.0, -2.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![-1.0, 1.0, 1.0],
        )
        .unwrap();
        let mut session = data.relaxation();
        for ((row, &rhs), name) in data.matrix.iter().zip(&data.rhs).zip(&data.row_names) {
            let sparse: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
            LpRelaxation::add_constraint(&mut session, &sparse, Sense::Le, rhs, name).unwrap();
        }
        assert_eq!(LpRelaxation::solve(&mut session).unwrap(), LpStatus::Optimal);
        let ledger = RowLedger::from_problem(&data, &Approximator::default());
        (session, ledger)
    }

    #[test]
    fn test_select_sorts_dedups_and_caps() {
        let manager = CutManager::new(2, 1e-6);
        let selected = manager.select(vec![
            cut("a", &[(0, 1)], 1, 0.1),
            cut("b", &[(0, 1), (1, 1)], 1, 0.5),
            cut("c", &[(0, 1), (1, 1)], 1, 0.4),
            cut("d", &[(1, 1)], 1, 0.3),
        ]);
        let names: Vec<&str> = selected.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn test_valid_cut_is_kept() {
        let (mut session, mut ledger) = setup();
        let manager = CutManager::new(10, 1e-6);
        // x0 + x1 >= 1 is valid for the 0/1 points and lifts the bound to 1
        let outcome = manager
            .apply(&mut session, &mut ledger, vec![cut("gmi_1_0", &[(0, 1), (1, 1)], 1, 0.3)], 1.0)
            .unwrap();
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.rolled_back, 0);
        assert_eq!(ledger.len(), 4);
        assert!((LpRelaxation::objective_value(&session).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_cuts_are_rolled_back() {
        let (mut session, mut ledger) = setup();
        let manager = CutManager::new(10, 1e-6);
        let outcome = manager
            .apply(
                &mut session,
                &mut ledger,
                vec![
                    // Overshoots the reference optimum of 1
                    cut("gmi_1_1", &[(0, 1), (1, 1)], 2, 0.9),
                    // Infeasible together with x0 <= 1
                    cut("gmi_1_2", &[(0, 1)], 3, 0.8),
                ],
                1.0,
            )
            .unwrap();
        assert!(outcome.added.is_empty());
        assert_eq!(outcome.rolled_back, 2);
        assert_eq!(session.num_constraints(), 3);
        assert_eq!(ledger.len(), 3);
        assert!((LpRelaxation::objective_value(&session).unwrap() - 0.5).abs() < 1e-9);
    }
}

use crate::tableau::BasisSnapshot;

/// A basic structural variable whose value is not integral
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub row: usize,
    pub basic: usize,
    pub value: f64,
    /// Distance to the nearest integer, in `(tolerance, 0.5]`
    pub fractionality: f64,
}

/// Picks the tableau rows that can source a cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalAnalyzer {
    pub tolerance: f64,
    /// Return every candidate rather than just the most fractional one
    pub batch: bool,
}

impl FractionalAnalyzer {
    pub fn new(tolerance: f64, batch: bool) -> Self {
        Self { tolerance, batch }
    }

    /// Candidates sorted by decreasing fractionality, ties by row index.
    ///
    /// Only rows whose basic column is structural qualify; an empty result
    /// means the relaxation optimum is integral.
    pub fn analyze(&self, snapshot: &BasisSnapshot) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = snapshot
            .rows
            .iter()
            .filter(|basic| snapshot.is_structural(basic.basic))
            .filter_map(|basic| {
                let frac = basic.value - basic.value.floor();
                if frac > self.tolerance && frac < 1.0 - self.tolerance {
                    Some(Candidate {
                        row: basic.row,
                        basic: basic.basic,
                        value: basic.value,
                        fractionality: frac.min(1.0 - frac),
                    })
                } else {
                    None
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.fractionality
                .total_cmp(&a.fractionality)
                .then_with(|| a.row.cmp(&b.row))
        });
        if !self.batch {
            candidates.truncate(1);
        }
        candidates
    }
}

/// Whether every structural value is within `tolerance` of an integer
pub fn is_integral_point(values: &[f64], tolerance: f64) -> bool {
    values.iter().all(|x| (x - x.round()).abs() <= tolerance)
}

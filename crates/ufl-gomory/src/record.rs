use std::fmt;

use crate::cuts::Cut;

/// Where a cutting-plane run is, or how it ended
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    InitialRelax,
    Iterating,
    IntegerOptimal,
    GapClosed,
    TimeLimit,
    IterationLimit,
    Stalled,
    Infeasible,
    TableauUnavailable,
    SolverFailure,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EngineState::InitialRelax | EngineState::Iterating)
    }

    /// The relaxation reached an integral point or the reference value
    pub fn is_success(&self) -> bool {
        matches!(self, EngineState::IntegerOptimal | EngineState::GapClosed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::InitialRelax => "initial_relax",
            EngineState::Iterating => "iterating",
            EngineState::IntegerOptimal => "integer_optimal",
            EngineState::GapClosed => "gap_closed",
            EngineState::TimeLimit => "time_limit",
            EngineState::IterationLimit => "iteration_limit",
            EngineState::Stalled => "stalled",
            EngineState::Infeasible => "infeasible",
            EngineState::TableauUnavailable => "tableau_unavailable",
            EngineState::SolverFailure => "solver_failure",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the relaxation after one round. Record 0 is the initial
/// relaxation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub objective: f64,
    /// `|objective - reference|`
    pub gap: f64,
    pub relative_gap: f64,
    pub cuts_added: usize,
    pub total_cuts: usize,
    pub num_constraints: usize,
    pub elapsed_ms: u64,
    pub is_integer: bool,
    pub status: EngineState,
}

/// Outcome of a run: the records, the terminal state and the cuts that
/// stayed in the relaxation
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub records: Vec<IterationRecord>,
    pub state: EngineState,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub cuts: Vec<Cut>,
    pub reference_optimum: f64,
}

impl RunReport {
    pub fn final_objective(&self) -> Option<f64> {
        self.records.last().map(|r| r.objective)
    }

    pub fn total_cuts(&self) -> usize {
        self.cuts.len()
    }

    /// Number of cut rounds, not counting the initial relaxation
    pub fn iterations(&self) -> usize {
        self.records.len().saturating_sub(1)
    }

    pub fn initial_gap(&self) -> Option<f64> {
        self.records.first().map(|r| r.relative_gap)
    }

    pub fn final_gap(&self) -> Option<f64> {
        self.records.last().map(|r| r.relative_gap)
    }

    /// Share of the initial gap closed by the cuts, in `[0, 1]`. A run that
    /// starts without a gap has closed all of it.
    pub fn gap_closure(&self) -> Option<f64> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        if first.gap <= f64::EPSILON {
            return Some(1.0);
        }
        Some(((first.gap - last.gap) / first.gap).clamp(0.0, 1.0))
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.records.last().map_or(0, |r| r.elapsed_ms)
    }
}

/// `|objective - reference| / (|reference| + 1e-10)`
pub fn relative_gap(objective: f64, reference: f64) -> f64 {
    (objective - reference).abs() / (reference.abs() + 1e-10)
}

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::{CutMode, EngineConfig};
use crate::cuts::{Cut, CutContext, CutGenerator, FractionalGomory, MixedIntegerGomory};
use crate::error::{EngineError, ValidationError};
use crate::formulation::ProblemData;
use crate::fractional::{Candidate, FractionalAnalyzer, is_integral_point};
use crate::instance::Instance;
use crate::ledger::RowLedger;
use crate::manager::CutManager;
use crate::rational::Approximator;
use crate::record::{EngineState, IterationRecord, RunReport, relative_gap};
use crate::relaxation::{LpRelaxation, LpStatus, RelaxationError, Sense};
use crate::tableau::BasisSnapshot;

/// Cutting-plane loop over one relaxation session.
///
/// The engine owns the session for its whole life: it loads the problem
/// rows, adds and rolls back cuts, and closes the session when the run ends
/// or the engine is dropped.
pub struct Engine<R: LpRelaxation> {
    relaxation: R,
    problem: ProblemData,
    reference: f64,
    config: EngineConfig,
    ledger: RowLedger,
    approximator: Approximator,
    cuts: Vec<Cut>,
    records: Vec<IterationRecord>,
    started: Instant,
    closed: bool,
}

impl<R: LpRelaxation> Engine<R> {
    /// `relaxation` must have the problem's columns and no rows yet.
    /// `reference` is the known optimum the gap is measured against.
    pub fn new(relaxation: R, problem: ProblemData, reference: f64, config: EngineConfig) -> Result<Self, EngineError> {
        if !reference.is_finite() {
            return Err(ValidationError::InvalidReference(reference).into());
        }
        if relaxation.num_structural() != problem.num_variables() {
            return Err(ValidationError::RelaxationDimension {
                expected: problem.num_variables(),
                found: relaxation.num_structural(),
            }
            .into());
        }
        if relaxation.num_rows() != 0 {
            return Err(ValidationError::RelaxationNotEmpty(relaxation.num_rows()).into());
        }

        let approximator = Approximator::new(config.max_denominator, config.tolerance);
        let ledger = RowLedger::from_problem(&problem, &approximator);
        Ok(Self {
            relaxation,
            problem,
            reference,
            config,
            ledger,
            approximator,
            cuts: Vec::new(),
            records: Vec::new(),
            started: Instant::now(),
            closed: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run to a terminal state. Never fails: solver trouble ends the run in
    /// [`EngineState::TableauUnavailable`] or [`EngineState::SolverFailure`]
    /// with the records gathered so far.
    pub fn run(mut self) -> RunReport {
        self.started = Instant::now();
        let state = match self.iterate() {
            Ok(state) => state,
            Err(RelaxationError::TableauUnavailable(reason)) => {
                warn!("Stopping: tableau unavailable ({})", reason);
                EngineState::TableauUnavailable
            }
            Err(RelaxationError::SolverCall(reason)) => {
                warn!("Stopping: solver call failed ({})", reason);
                EngineState::SolverFailure
            }
        };
        self.close();

        if let Some(last) = self.records.last_mut() {
            last.status = state;
        }
        info!(
            "Finished in state {} after {} rounds: {} cuts, final gap {:.3e}",
            state,
            self.records.len().saturating_sub(1),
            self.cuts.len(),
            self.records.last().map_or(f64::NAN, |r| r.relative_gap)
        );

        RunReport {
            records: std::mem::take(&mut self.records),
            state,
            cuts: std::mem::take(&mut self.cuts),
            reference_optimum: self.reference,
        }
    }

    fn iterate(&mut self) -> Result<EngineState, RelaxationError> {
        self.load_rows()?;
        match self.relaxation.solve()? {
            LpStatus::Optimal => {}
            LpStatus::Infeasible => {
                info!("Initial relaxation is infeasible");
                return Ok(EngineState::Infeasible);
            }
            status => {
                return Err(RelaxationError::SolverCall(format!("initial relaxation {:?}", status)));
            }
        }
        self.push_record(0, 0)?;

        let analyzer = FractionalAnalyzer::new(self.config.tolerance, self.config.batch);
        let manager = CutManager::new(self.config.max_cuts_per_iteration, self.config.tolerance);
        let mut iteration = 0;
        let mut unchanged_rounds = 0;

        loop {
            let snapshot = BasisSnapshot::extract(&self.relaxation)?;
            let candidates = analyzer.analyze(&snapshot);
            if candidates.is_empty() {
                return Ok(EngineState::IntegerOptimal);
            }
            if iteration >= self.config.max_iterations {
                return Ok(EngineState::IterationLimit);
            }
            if self.started.elapsed() > self.config.time_limit() {
                return Ok(EngineState::TimeLimit);
            }

            iteration += 1;
            let previous = self.current_objective();
            let cuts = self.generate(&snapshot, &candidates, iteration)?;
            let generated = cuts.len();
            let outcome = manager.apply(&mut self.relaxation, &mut self.ledger, cuts, self.reference)?;
            debug!(
                "Round {}: {} candidates, {} cuts generated, {} selected, {} rolled back",
                iteration,
                candidates.len(),
                generated,
                outcome.selected,
                outcome.rolled_back
            );
            if outcome.added.is_empty() {
                return Ok(EngineState::Stalled);
            }

            let added = outcome.added.len();
            self.cuts.extend(outcome.added);
            let record = self.push_record(iteration, added)?;
            if record.relative_gap <= self.config.threshold_gap {
                return Ok(EngineState::GapClosed);
            }

            let scale = 1.0 + record.objective.abs();
            if (record.objective - previous).abs() <= self.config.tolerance * scale {
                unchanged_rounds += 1;
            } else {
                unchanged_rounds = 0;
            }
            if unchanged_rounds >= self.config.stall_rounds {
                return Ok(EngineState::Stalled);
            }
        }
    }

    fn load_rows(&mut self) -> Result<(), RelaxationError> {
        for ((row, &rhs), name) in self
            .problem
            .matrix
            .iter()
            .zip(&self.problem.rhs)
            .zip(&self.problem.row_names)
        {
            let sparse: Vec<(usize, f64)> = row
                .iter()
                .enumerate()
                .filter(|&(_, a)| *a != 0.0)
                .map(|(j, &a)| (j, a))
                .collect();
            self.relaxation.add_constraint(&sparse, Sense::Le, rhs, name)?;
        }
        Ok(())
    }

    fn generate(
        &self,
        snapshot: &BasisSnapshot,
        candidates: &[Candidate],
        iteration: usize,
    ) -> Result<Vec<Cut>, RelaxationError> {
        let gfc = FractionalGomory;
        let gmi = MixedIntegerGomory::new(self.config.tolerance);
        let generators: Vec<&dyn CutGenerator> = match self.config.cut_mode {
            CutMode::Gfc => vec![&gfc],
            CutMode::Gmi => vec![&gmi],
            CutMode::Both => vec![&gfc, &gmi],
        };

        let context = CutContext {
            ledger: &self.ledger,
            num_structural: snapshot.num_structural,
            point: snapshot.structural_values(),
            iteration,
            max_scale: self.config.max_scale,
            tolerance: self.config.tolerance,
        };

        let mut cuts = Vec::new();
        for candidate in candidates {
            let row = snapshot.row(&self.relaxation, candidate.row)?;
            let Some(exact) = row.reconstruct(&self.approximator) else {
                debug!("Row {} has no exact reconstruction, skipping", candidate.row);
                continue;
            };
            for generator in &generators {
                if let Some(cut) = context.generate(*generator, &exact) {
                    cuts.push(cut);
                }
            }
        }
        Ok(cuts)
    }

    fn push_record(&mut self, iteration: usize, cuts_added: usize) -> Result<IterationRecord, RelaxationError> {
        let objective = self.relaxation.objective_value()?;
        let values = self.relaxation.column_values()?;
        let n = self.problem.num_variables().min(values.len());
        let gap = (objective - self.reference).abs();
        let record = IterationRecord {
            iteration,
            objective,
            gap,
            relative_gap: relative_gap(objective, self.reference),
            cuts_added,
            total_cuts: self.cuts.len(),
            num_constraints: self.relaxation.num_rows(),
            elapsed_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            is_integer: is_integral_point(&values[..n], self.config.tolerance),
            status: EngineState::Iterating,
        };
        info!(
            "Iteration {}: objective {:.6}, relative gap {:.3e}, {} cuts added ({} total)",
            iteration, objective, record.relative_gap, cuts_added, record.total_cuts
        );
        self.records.push(record.clone());
        Ok(record)
    }

    fn current_objective(&self) -> f64 {
        self.records.last().map_or(f64::NAN, |r| r.objective)
    }

    fn close(&mut self) {
        if !self.closed {
            self.relaxation.close();
            self.closed = true;
        }
    }
}

impl<R: LpRelaxation> Drop for Engine<R> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Formulate `instance`, open a session and run the cutting-plane loop
pub fn solve_with_cutting_planes(
    instance: &Instance,
    reference_optimum: f64,
    config: EngineConfig,
) -> Result<RunReport, EngineError> {
    solve_problem(ProblemData::from_instance(instance), reference_optimum, config)
}

/// Run the cutting-plane loop on an arbitrary 0/1 problem with the bundled
/// simplex backend
pub fn solve_problem(problem: ProblemData, reference_optimum: f64, config: EngineConfig) -> Result<RunReport, EngineError> {
    let relaxation = problem.relaxation();
    Ok(Engine::new(relaxation, problem, reference_optimum, config)?.run())
}

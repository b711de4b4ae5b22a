pub mod config;
pub mod cuts;
pub mod engine;
pub mod error;
pub mod formulation;
pub mod fractional;
pub mod generator;
pub mod instance;
pub mod ledger;
pub mod manager;
pub mod parser;
pub mod rational;
pub mod record;
pub mod reference;
pub mod relaxation;
pub mod tableau;

pub use config::{CutMode, EngineConfig};
pub use cuts::{Cut, CutGenerator, CutKind, FractionalGomory, MixedIntegerGomory};
pub use engine::{Engine, solve_problem, solve_with_cutting_planes};
pub use error::{EngineError, ValidationError};
pub use formulation::{ProblemData, assignment_index};
pub use fractional::{Candidate, FractionalAnalyzer};
pub use generator::{ClusterSpec, GeneratorError, generate_cluster, write_cluster};
pub use instance::Instance;
pub use manager::{CutManager, RoundOutcome};
pub use parser::{LoadError, ParseError, Parser};
pub use record::{EngineState, IterationRecord, RunReport};
pub use reference::{ReferenceError, ReferenceSolution, enumerate_optimum};
pub use relaxation::{BasisStatus, LpRelaxation, LpStatus, RelaxationError, Sense};
pub use tableau::{BasisSnapshot, TableauRow};

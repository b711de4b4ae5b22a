use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which cut families to generate from each candidate row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutMode {
    Gfc,
    #[default]
    Gmi,
    Both,
}

impl fmt::Display for CutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutMode::Gfc => write!(f, "gfc"),
            CutMode::Gmi => write!(f, "gmi"),
            CutMode::Both => write!(f, "both"),
        }
    }
}

impl FromStr for CutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gfc" => Ok(CutMode::Gfc),
            "gmi" => Ok(CutMode::Gmi),
            "both" => Ok(CutMode::Both),
            other => Err(format!("unknown cut mode `{}` (expected gfc, gmi or both)", other)),
        }
    }
}

/// Stopping rules and numerics of a cutting-plane run
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub max_iterations: usize,
    pub time_limit_ms: u64,
    /// Relative gap to the reference optimum at which the run stops
    pub threshold_gap: f64,
    pub cut_mode: CutMode,
    pub max_cuts_per_iteration: usize,
    /// Cut every fractional row per round instead of only the most fractional
    pub batch: bool,
    /// Integrality and violation tolerance
    pub tolerance: f64,
    pub max_denominator: i128,
    /// Largest multiplier used to bring a cut to integer coefficients
    pub max_scale: i128,
    /// Consecutive rounds with an unchanged objective before giving up
    pub stall_rounds: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            time_limit_ms: 3_600_000,
            threshold_gap: 1e-9,
            cut_mode: CutMode::Gmi,
            max_cuts_per_iteration: 50,
            batch: true,
            tolerance: 1e-6,
            max_denominator: 10_000,
            max_scale: 1_000_000_000,
            stall_rounds: 3,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_threshold_gap(mut self, threshold_gap: f64) -> Self {
        self.threshold_gap = threshold_gap;
        self
    }

    pub fn with_cut_mode(mut self, cut_mode: CutMode) -> Self {
        self.cut_mode = cut_mode;
        self
    }

    pub fn with_max_cuts_per_iteration(mut self, max_cuts: usize) -> Self {
        self.max_cuts_per_iteration = max_cuts;
        self
    }

    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_denominator(mut self, max_denominator: i128) -> Self {
        self.max_denominator = max_denominator;
        self
    }

    pub fn with_max_scale(mut self, max_scale: i128) -> Self {
        self.max_scale = max_scale;
        self
    }

    pub fn with_stall_rounds(mut self, stall_rounds: usize) -> Self {
        self.stall_rounds = stall_rounds;
        self
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.time_limit(), Duration::from_secs(3600));
        assert_eq!(config.cut_mode, CutMode::Gmi);
        assert_eq!(config.max_cuts_per_iteration, 50);
        assert!(config.batch);
        assert_eq!(config.stall_rounds, 3);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_iterations(5)
            .with_time_limit(Duration::from_millis(250))
            .with_cut_mode(CutMode::Both)
            .with_batch(false);
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.time_limit_ms, 250);
        assert_eq!(config.cut_mode, CutMode::Both);
        assert!(!config.batch);
    }

    #[test]
    fn test_cut_mode_from_str() {
        assert_eq!("GFC".parse::<CutMode>(), Ok(CutMode::Gfc));
        assert_eq!("both".parse::<CutMode>(), Ok(CutMode::Both));
        assert!("lift".parse::<CutMode>().is_err());
    }
}

/// Study configuration structures
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::evaluator::DEFAULT_MAX_RETRIES;
use super::genetic::GaParams;
use super::variable::{Output, Reduction, Variable};
use crate::error::StudyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Exhaustive aligned sweep.
    Grid,
    /// Generational genetic search.
    Genetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Name of the study; also names the exported CSV.
    pub study_name: String,

    /// Path to the model document the session opens.
    pub model_path: String,

    /// Search strategy to run.
    pub strategy: Strategy,

    /// Bounded retry count for flaky/degenerate solves.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Post-solve stabilization wait in milliseconds. Zero disables it.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Optional result-field export format for the best trial (only "vtk").
    #[serde(default)]
    pub export_format: Option<String>,

    /// One entry per swept constraint: object name, constraint name,
    /// min, max, step count, unit.
    pub variables: Vec<Variable>,

    /// Result fields and their reductions; the first entry is the objective.
    pub outputs: Vec<Output>,

    /// Genetic operator parameters (used when strategy = "genetic").
    #[serde(default)]
    pub genetic: GaParams,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_settle_delay_ms() -> u64 {
    1000
}

impl StudyConfig {
    /// Load a study configuration from a TOML file.
    pub fn from_file(path: &str) -> Result<Self, StudyError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save the study configuration to a TOML file.
    pub fn to_file(&self, path: &str) -> Result<(), StudyError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Generate a sample cantilever study: sweep beam length and section
    /// height, minimize peak von Mises stress.
    pub fn sample(study_name: String, model_path: String, strategy: Strategy) -> Self {
        StudyConfig {
            study_name,
            model_path,
            strategy,
            max_retries: DEFAULT_MAX_RETRIES,
            settle_delay_ms: 0,
            export_format: Some("vtk".to_string()),
            variables: vec![
                Variable::new("Beam", "Length", 50.0, 150.0, 5).with_unit("mm"),
                Variable::new("Beam", "Height", 6.0, 18.0, 5).with_unit("mm"),
            ],
            outputs: vec![Output::new("vonMises", Reduction::Max).with_unit("MPa")],
            genetic: GaParams::default(),
        }
    }
}

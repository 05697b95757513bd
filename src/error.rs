/// Error taxonomy for a parametric study run
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    /// The named object or constraint could not be resolved in the model.
    /// Indicates a structural mismatch between the study configuration and
    /// the model, so it is never retried.
    #[error("unable to resolve {object}.{constraint} in the model")]
    Configuration { object: String, constraint: String },

    /// The solver was retried up to the bound without producing a usable
    /// (non-zero) result for the current configuration.
    #[error("solve failed after {retries} retries without a usable result")]
    SolveExhausted { retries: u32 },

    /// The requested result export format is not supported.
    #[error("export format {0} not available")]
    ExportFormat(String),

    /// Variable/output cardinality mismatch, caught before any persistence
    /// side effect.
    #[error("data shape mismatch: {0}")]
    DataShape(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse study config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write study config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

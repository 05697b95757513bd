/// Collaborator contract for the external CAD/FEA binding
///
/// A session wraps exactly one open model document and one solver context.
/// That pair is a single mutable shared resource: the engine never issues
/// overlapping calls against it, and the `&mut` receiver on the mutating
/// operations lets the borrow checker enforce the single-writer rule.
use std::path::Path;

use crate::error::StudyError;

/// Supported mesh/field export formats for solver results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Vtk,
}

impl ExportFormat {
    /// Parse a user-supplied format name. Unknown names are an
    /// `ExportFormat` error, local to the export call.
    pub fn parse(name: &str) -> Result<Self, StudyError> {
        match name {
            "vtk" => Ok(ExportFormat::Vtk),
            other => Err(StudyError::ExportFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Vtk => "vtk",
        }
    }
}

/// One open model document plus one solver context.
///
/// Implementations bind a real CAD/FEA package (the reference target is a
/// FreeCAD document with a CalculiX solver); `CantileverSession` is the
/// built-in analytic implementation used by the CLI demo and the tests.
pub trait FemSession {
    /// Set a named constraint on a named object to the given value.
    /// Fails with `Configuration` when either name cannot be resolved.
    fn set_constraint(
        &mut self,
        object: &str,
        constraint: &str,
        value: f64,
    ) -> Result<(), StudyError>;

    /// Recompute model geometry so a subsequent solve sees a consistent state.
    fn recompute(&mut self) -> Result<(), StudyError>;

    /// Purge prior results and refresh solver object state.
    fn prepare_solver(&mut self) -> Result<(), StudyError>;

    fn check_prerequisites(&self) -> Result<(), StudyError>;

    /// Run the solver. With `quiet` set, the solver's own console
    /// diagnostics are captured instead of interleaving with engine logging.
    fn solve(&mut self, quiet: bool) -> Result<(), StudyError>;

    /// Whether the last solve left a result container behind.
    fn results_present(&self) -> bool;

    /// Read a named scalar result field from the last solve.
    fn read_result_field(&self, name: &str) -> Result<Vec<f64>, StudyError>;

    /// Export the last solve's result mesh/fields to `path`.
    fn export_results(&self, path: &Path, format: ExportFormat) -> Result<(), StudyError>;

    /// Persist the model in its current configuration.
    fn save_as(&self, path: &Path) -> Result<(), StudyError>;
}

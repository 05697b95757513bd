/// Parametric exploration engine
///
/// This module provides functionality to:
/// - Define swept/searched variables bound to named model constraints
/// - Evaluate configurations against an external solver session, with
///   bounded retries for flaky or degenerate solves
/// - Explore the design space by aligned grid sweep or genetic search
/// - Accumulate every trial into an ordered table and persist the best one

pub mod config;
pub mod evaluator;
pub mod export;
pub mod genetic;
pub mod grid;
pub mod results;
pub mod runner;
pub mod variable;

pub use config::{Strategy, StudyConfig};
pub use evaluator::Evaluator;
pub use export::export_table_to_csv;
pub use genetic::{GaParams, GeneticExplorer};
pub use grid::GridExplorer;
pub use results::{save_best_model, Provenance, ResultsTable, TrialRecord};
pub use runner::StudyRunner;
pub use variable::{Output, Reduction, Variable};

#[cfg(test)]
mod tests;

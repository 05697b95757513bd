/// Deterministic aligned-sweep exploration
use std::time::Duration;

use tracing::info;

use super::evaluator::Evaluator;
use super::results::{Provenance, ResultsTable, TrialRecord};
use super::variable::{Output, Variable};
use crate::error::StudyError;
use crate::session::FemSession;

/// Exhaustive sweep over pre-aligned value sequences.
///
/// Row `i` evaluates the i-th value of every variable's sweep, so all
/// sweeps must materialize to the same length. This is an aligned table,
/// deliberately NOT a Cartesian product.
pub struct GridExplorer {
    pub max_retries: u32,
    pub settle_delay: Duration,
}

impl GridExplorer {
    pub fn run<S: FemSession>(
        &self,
        session: &mut S,
        variables: &[Variable],
        outputs: &[Output],
        table: &mut ResultsTable,
    ) -> Result<(), StudyError> {
        let sweeps: Vec<Vec<f64>> = variables.iter().map(Variable::sweep_values).collect();
        let rows = sweeps.first().map(Vec::len).unwrap_or(0);
        for (variable, sweep) in variables.iter().zip(&sweeps) {
            if sweep.len() != rows {
                return Err(StudyError::DataShape(format!(
                    "sweep for {}.{} has {} values, expected {}",
                    variable.object_name,
                    variable.constraint_name,
                    sweep.len(),
                    rows
                )));
            }
        }

        let mut evaluator = Evaluator::new(session, outputs)
            .with_retry_bound(self.max_retries)
            .with_settle_delay(self.settle_delay);

        for row in 0..rows {
            let assignment: Vec<f64> = sweeps.iter().map(|sweep| sweep[row]).collect();
            let reduced = evaluator.evaluate(variables, &assignment)?;
            info!("row {}/{}: objective {}", row + 1, rows, reduced[0]);
            table.append(TrialRecord {
                values: assignment,
                outputs: reduced,
                provenance: Provenance::Row(row),
            })?;
        }
        Ok(())
    }
}

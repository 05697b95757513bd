/// One simulation run per fully-bound parameter assignment
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use super::variable::{Output, Variable};
use crate::error::StudyError;
use crate::session::FemSession;

/// Bounded retry count for solve failures and degenerate results.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Stabilization wait between a successful solve and the result read, for
/// solvers whose result-availability signal lags their completion signal.
/// A tunable, not a correctness mechanism; tests run with zero.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Drives one solve per assignment against the injected session, with local
/// recovery for two failure classes:
///
/// - solve failure: the solver left no results behind;
/// - degenerate success: results exist but the objective reduces to exactly
///   zero, which is non-physical for a stress study and is retried rather
///   than trusted.
///
/// Constraint application is not redone on retry; only the
/// prepare/check/solve/read cycle repeats.
pub struct Evaluator<'a, S: FemSession> {
    session: &'a mut S,
    outputs: &'a [Output],
    max_retries: u32,
    settle_delay: Duration,
}

impl<'a, S: FemSession> Evaluator<'a, S> {
    pub fn new(session: &'a mut S, outputs: &'a [Output]) -> Self {
        Self {
            session,
            outputs,
            max_retries: DEFAULT_MAX_RETRIES,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_retry_bound(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Evaluate one assignment: one reduced scalar per registered output,
    /// objective first.
    ///
    /// `Configuration` errors from constraint application propagate
    /// immediately; they indicate a config/model mismatch that no retry can
    /// fix. Exhausting the retry bound is terminal for this configuration
    /// and surfaces as `SolveExhausted`, never as a silent zero.
    pub fn evaluate(
        &mut self,
        variables: &[Variable],
        assignment: &[f64],
    ) -> Result<Vec<f64>, StudyError> {
        if assignment.len() != variables.len() {
            return Err(StudyError::DataShape(format!(
                "assignment has {} values for {} variables",
                assignment.len(),
                variables.len()
            )));
        }
        if self.outputs.is_empty() {
            return Err(StudyError::DataShape("no outputs registered".to_string()));
        }

        for (variable, value) in variables.iter().zip(assignment) {
            self.session
                .set_constraint(&variable.object_name, &variable.constraint_name, *value)?;
            debug!(
                "set {}.{} to {}",
                variable.object_name, variable.constraint_name, value
            );
        }
        self.session.recompute()?;

        let mut retries = 0;
        while retries < self.max_retries {
            self.session.prepare_solver()?;
            self.session.check_prerequisites()?;
            self.session.solve(true)?;
            if !self.settle_delay.is_zero() {
                thread::sleep(self.settle_delay);
            }

            if !self.session.results_present() {
                retries += 1;
                warn!("solve left no results, retrying {}/{}", retries, self.max_retries);
                continue;
            }

            match self.reduce_outputs()? {
                Some(reduced) => {
                    if reduced[0] == 0.0 {
                        retries += 1;
                        warn!(
                            "objective is zero, retrying {}/{}",
                            retries, self.max_retries
                        );
                    } else {
                        debug!("solve succeeded, objective {}", reduced[0]);
                        return Ok(reduced);
                    }
                }
                None => {
                    retries += 1;
                    warn!(
                        "result field is empty, retrying {}/{}",
                        retries, self.max_retries
                    );
                }
            }
        }

        Err(StudyError::SolveExhausted {
            retries: self.max_retries,
        })
    }

    /// Reduce every registered output field. `None` when any field came
    /// back empty, which counts as a failed solve.
    fn reduce_outputs(&self) -> Result<Option<Vec<f64>>, StudyError> {
        let mut reduced = Vec::with_capacity(self.outputs.len());
        for output in self.outputs {
            let field = self.session.read_result_field(&output.field)?;
            match output.reduction.apply(&field) {
                Some(value) => reduced.push(value),
                None => return Ok(None),
            }
        }
        Ok(Some(reduced))
    }
}

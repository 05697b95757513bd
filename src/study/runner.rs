/// Orchestration of one exploration run
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, warn};

use super::config::{Strategy, StudyConfig};
use super::export::export_table_to_csv;
use super::genetic::GeneticExplorer;
use super::grid::GridExplorer;
use super::results::{save_best_model, ResultsTable};
use crate::error::StudyError;
use crate::session::{ExportFormat, FemSession};

/// Drives one study end to end: explore, export the trial table, persist
/// the best-configuration snapshot.
pub struct StudyRunner {
    config: StudyConfig,
    output_dir: PathBuf,
}

impl StudyRunner {
    pub fn new(config: StudyConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    /// Run the configured strategy against `session` and persist results.
    ///
    /// Evaluator errors propagate uncaught; on failure the number of trials
    /// that completed is reported and no CSV is written, so export files are
    /// never left half-built.
    pub fn run<S: FemSession>(&self, session: &mut S) -> Result<ResultsTable, StudyError> {
        let mut table = ResultsTable::new(&self.config.variables, &self.config.outputs);
        let started = Instant::now();

        let outcome = match self.config.strategy {
            Strategy::Grid => GridExplorer {
                max_retries: self.config.max_retries,
                settle_delay: self.config.settle_delay(),
            }
            .run(
                session,
                &self.config.variables,
                &self.config.outputs,
                &mut table,
            ),
            Strategy::Genetic => GeneticExplorer {
                params: self.config.genetic.clone(),
                max_retries: self.config.max_retries,
                settle_delay: self.config.settle_delay(),
            }
            .run(
                session,
                &self.config.variables,
                &self.config.outputs,
                &mut table,
            ),
        };

        if let Err(err) = outcome {
            error!(
                "study '{}' failed after {} completed trials: {}",
                self.config.study_name,
                table.len(),
                err
            );
            return Err(err);
        }

        println!(
            "✓ {} trials completed in {:.2}s",
            table.len(),
            started.elapsed().as_secs_f32()
        );

        std::fs::create_dir_all(&self.output_dir)?;
        let csv_path = self
            .output_dir
            .join(format!("{}.csv", self.config.study_name.replace(' ', "_")));
        export_table_to_csv(&table, &csv_path)?;
        println!("✓ Results saved to {}", csv_path.display());

        if let Some(best) = table.best() {
            let suffix = match self.config.strategy {
                Strategy::Grid => "sweep",
                Strategy::Genetic => "GA",
            };
            let snapshot = save_best_model(
                session,
                &self.config.variables,
                best,
                Path::new(&self.config.model_path),
                suffix,
            )?;
            println!(
                "✓ Best objective {} — model saved as {}",
                best.objective(),
                snapshot.display()
            );
            self.export_best_fields(session)?;
        }

        Ok(table)
    }

    /// Optional mesh/field export of the best configuration's results.
    /// An unsupported format is local to this call: it is reported but does
    /// not fail the completed run.
    fn export_best_fields<S: FemSession>(&self, session: &mut S) -> Result<(), StudyError> {
        let Some(name) = &self.config.export_format else {
            return Ok(());
        };
        match ExportFormat::parse(name) {
            Ok(format) => {
                // Re-solve so the exported fields match the saved snapshot;
                // save_best_model re-applied the winning assignment already.
                session.prepare_solver()?;
                session.check_prerequisites()?;
                session.solve(true)?;
                let path = self
                    .output_dir
                    .join(format!("best_result.{}", format.extension()));
                session.export_results(&path, format)?;
                println!("✓ Exported solver results to {}", path.display());
            }
            Err(err) => warn!("skipping result export: {}", err),
        }
        Ok(())
    }
}

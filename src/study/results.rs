/// Trial records and the append-only results table
use std::path::{Path, PathBuf};

use tracing::debug;

use super::variable::{Output, Variable};
use crate::error::StudyError;
use crate::session::FemSession;

/// Where a trial came from within its exploration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Grid sweep row index.
    Row(usize),
    /// Genetic generation index (1-based) and ordinal within the generation.
    Generation { generation: usize, member: usize },
}

impl Provenance {
    /// Label written into the export's provenance column.
    pub fn label(&self) -> String {
        match self {
            Provenance::Row(row) => format!("row {}", row),
            Provenance::Generation { generation, .. } => format!("gen {}", generation),
        }
    }
}

/// One evaluated parameter assignment. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    /// Assigned value per registered variable, in registration order.
    pub values: Vec<f64>,
    /// Reduced scalar per registered output, in registration order.
    pub outputs: Vec<f64>,
    pub provenance: Provenance,
}

impl TrialRecord {
    /// The objective being minimized: the first registered output.
    pub fn objective(&self) -> f64 {
        self.outputs[0]
    }
}

/// Insertion-ordered accumulation of every trial in one exploration run.
///
/// The table owns the column schema; every appended record must match it,
/// which keeps cardinality mismatches from reaching any persistence step.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    variable_headers: Vec<String>,
    output_headers: Vec<String>,
    records: Vec<TrialRecord>,
}

impl ResultsTable {
    pub fn new(variables: &[Variable], outputs: &[Output]) -> Self {
        Self {
            variable_headers: variables.iter().map(Variable::column_header).collect(),
            output_headers: outputs.iter().map(Output::column_header).collect(),
            records: Vec::new(),
        }
    }

    pub fn append(&mut self, record: TrialRecord) -> Result<(), StudyError> {
        if record.values.len() != self.variable_headers.len() {
            return Err(StudyError::DataShape(format!(
                "trial has {} values for {} variable columns",
                record.values.len(),
                self.variable_headers.len()
            )));
        }
        if record.outputs.len() != self.output_headers.len() {
            return Err(StudyError::DataShape(format!(
                "trial has {} outputs for {} output columns",
                record.outputs.len(),
                self.output_headers.len()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn variable_headers(&self) -> &[String] {
        &self.variable_headers
    }

    pub fn output_headers(&self) -> &[String] {
        &self.output_headers
    }

    /// The minimizing trial across the whole table. Ties keep the
    /// first-seen record so repeated seeded runs stay reproducible.
    pub fn best(&self) -> Option<&TrialRecord> {
        let mut best: Option<&TrialRecord> = None;
        for record in &self.records {
            match best {
                Some(current) if record.objective() < current.objective() => best = Some(record),
                None => best = Some(record),
                _ => {}
            }
        }
        best
    }
}

/// Re-apply the winning assignment and persist a model snapshot next to the
/// source model, named from the winning constraint values
/// (e.g. `Length_82.5_Height_12.0_GA.fcstd` under `<model dir>/results/`).
pub fn save_best_model<S: FemSession>(
    session: &mut S,
    variables: &[Variable],
    best: &TrialRecord,
    model_path: &Path,
    suffix: &str,
) -> Result<PathBuf, StudyError> {
    if best.values.len() != variables.len() {
        return Err(StudyError::DataShape(format!(
            "best trial has {} values for {} variables",
            best.values.len(),
            variables.len()
        )));
    }

    for (variable, value) in variables.iter().zip(&best.values) {
        session.set_constraint(&variable.object_name, &variable.constraint_name, *value)?;
    }
    session.recompute()?;

    let results_dir = model_path.parent().unwrap_or(Path::new(".")).join("results");
    std::fs::create_dir_all(&results_dir)?;

    let parts: Vec<String> = variables
        .iter()
        .zip(&best.values)
        .map(|(variable, value)| {
            format!(
                "{}_{}",
                variable.constraint_name,
                (value * 1000.0).round() / 1000.0
            )
        })
        .collect();
    let extension = model_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("fcstd");
    let snapshot = results_dir.join(format!("{}_{}.{}", parts.join("_"), suffix, extension));

    session.save_as(&snapshot)?;
    debug!("best model saved as {}", snapshot.display());
    Ok(snapshot)
}

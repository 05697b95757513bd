/// Study variables and outputs
use serde::{Deserialize, Serialize};

/// One swept/searched simulation input, bound to a named constraint on a
/// named model object. `steps` drives grid materialization only; the
/// genetic explorer samples the `[min, max]` bound directly.
///
/// No validation happens at construction; a malformed domain surfaces when
/// the evaluator tries to apply it, matching the model binding's own error
/// surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub object_name: String,
    pub constraint_name: String,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
    /// Display unit for exported column headers (e.g. "mm").
    #[serde(default)]
    pub unit: Option<String>,
}

impl Variable {
    pub fn new(
        object_name: impl Into<String>,
        constraint_name: impl Into<String>,
        min: f64,
        max: f64,
        steps: usize,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            constraint_name: constraint_name.into(),
            min,
            max,
            steps,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Materialize the grid sweep for this variable: `steps` evenly spaced
    /// values over `[min, max]` inclusive, or exactly the two bound values
    /// when no more than one step is declared.
    pub fn sweep_values(&self) -> Vec<f64> {
        if self.steps > 1 {
            let span = self.max - self.min;
            (0..self.steps)
                .map(|i| self.min + span * i as f64 / (self.steps - 1) as f64)
                .collect()
        } else {
            vec![self.min, self.max]
        }
    }

    /// Column header for tabular export, unit-qualified when a unit was
    /// supplied: constraint "Length", unit "mm" -> "Length [mm]".
    pub fn column_header(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} [{}]", self.constraint_name, unit),
            None => self.constraint_name.clone(),
        }
    }
}

/// How a raw result field collapses to a scalar objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Max,
    Min,
}

impl Reduction {
    /// Reduce a result field. Empty fields have no defined reduction and
    /// must be guarded against by the caller.
    pub fn apply(&self, samples: &[f64]) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        Some(match self {
            Reduction::Max => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Min => samples.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

/// A named simulation result field paired with its reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub field: String,
    pub reduction: Reduction,
    /// Display unit for exported column headers (e.g. "MPa").
    #[serde(default)]
    pub unit: Option<String>,
}

impl Output {
    pub fn new(field: impl Into<String>, reduction: Reduction) -> Self {
        Self {
            field: field.into(),
            reduction,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn column_header(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} [{}]", self.field, unit),
            None => self.field.clone(),
        }
    }
}

/// Built-in analytic cantilever session
///
/// Closed-form stand-in for a real CAD/FEA binding: a rectangular cantilever
/// beam under an end load, solved with Euler-Bernoulli bending stress. The
/// CLI demo and the test suite drive the exploration engine against this
/// session; a production deployment swaps in a FreeCAD-backed `FemSession`.
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StudyError;
use crate::session::{ExportFormat, FemSession};

/// Number of stations along the beam at which stress is sampled.
const STRESS_STATIONS: usize = 20;

pub struct CantileverSession {
    model_path: PathBuf,
    /// Beam length in mm.
    length: f64,
    /// Section width in mm.
    width: f64,
    /// Section height in mm.
    height: f64,
    /// Tip load in N.
    load: f64,
    geometry_stale: bool,
    stress: Option<Vec<f64>>,
}

impl CantileverSession {
    /// Open a cantilever "document". The path is remembered for snapshot
    /// naming; no file needs to exist behind it.
    pub fn open(model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        debug!("opened cantilever model {}", model_path.display());
        Self {
            model_path,
            length: 100.0,
            width: 10.0,
            height: 10.0,
            load: 500.0,
            geometry_stale: false,
            stress: None,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Max bending stress at distance `x` from the root: 6*F*(L-x) / (b*h^2).
    fn stress_at(&self, x: f64) -> f64 {
        6.0 * self.load * (self.length - x) / (self.width * self.height * self.height)
    }
}

impl FemSession for CantileverSession {
    fn set_constraint(
        &mut self,
        object: &str,
        constraint: &str,
        value: f64,
    ) -> Result<(), StudyError> {
        if object != "Beam" {
            return Err(StudyError::Configuration {
                object: object.to_string(),
                constraint: constraint.to_string(),
            });
        }
        let slot = match constraint {
            "Length" => &mut self.length,
            "Width" => &mut self.width,
            "Height" => &mut self.height,
            "Load" => &mut self.load,
            _ => {
                return Err(StudyError::Configuration {
                    object: object.to_string(),
                    constraint: constraint.to_string(),
                })
            }
        };
        *slot = value;
        self.geometry_stale = true;
        debug!("set Beam.{} to {}", constraint, value);
        Ok(())
    }

    fn recompute(&mut self) -> Result<(), StudyError> {
        self.geometry_stale = false;
        self.stress = None;
        debug!("model recomputed");
        Ok(())
    }

    fn prepare_solver(&mut self) -> Result<(), StudyError> {
        self.stress = None;
        Ok(())
    }

    fn check_prerequisites(&self) -> Result<(), StudyError> {
        if self.geometry_stale {
            return Err(StudyError::DataShape(
                "geometry is stale, recompute before solving".to_string(),
            ));
        }
        Ok(())
    }

    fn solve(&mut self, quiet: bool) -> Result<(), StudyError> {
        if !quiet {
            println!(
                "cantilever solve: L={} b={} h={} F={}",
                self.length, self.width, self.height, self.load
            );
        }
        // Degenerate sections have no physical solution; leave no results
        // behind so the caller sees a solve failure.
        if self.length <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            self.stress = None;
            return Ok(());
        }
        let field = (0..STRESS_STATIONS)
            .map(|i| self.stress_at(self.length * i as f64 / STRESS_STATIONS as f64))
            .collect();
        self.stress = Some(field);
        Ok(())
    }

    fn results_present(&self) -> bool {
        self.stress.is_some()
    }

    fn read_result_field(&self, name: &str) -> Result<Vec<f64>, StudyError> {
        match (name, &self.stress) {
            ("vonMises", Some(field)) => Ok(field.clone()),
            ("vonMises", None) => Ok(Vec::new()),
            _ => Err(StudyError::Configuration {
                object: "Results".to_string(),
                constraint: name.to_string(),
            }),
        }
    }

    fn export_results(&self, path: &Path, format: ExportFormat) -> Result<(), StudyError> {
        match format {
            ExportFormat::Vtk => {
                let field = self.stress.as_deref().unwrap_or(&[]);
                let mut file = File::create(path)?;
                writeln!(file, "# vtk DataFile Version 3.0")?;
                writeln!(file, "cantilever bending stress")?;
                writeln!(file, "ASCII")?;
                writeln!(file, "DATASET POLYDATA")?;
                writeln!(file, "POINTS {} float", field.len())?;
                for (i, _) in field.iter().enumerate() {
                    let x = self.length * i as f64 / STRESS_STATIONS as f64;
                    writeln!(file, "{} 0 0", x)?;
                }
                writeln!(file, "POINT_DATA {}", field.len())?;
                writeln!(file, "SCALARS vonMises float 1")?;
                writeln!(file, "LOOKUP_TABLE default")?;
                for value in field {
                    writeln!(file, "{}", value)?;
                }
                debug!("exported VTK results to {}", path.display());
                Ok(())
            }
        }
    }

    fn save_as(&self, path: &Path) -> Result<(), StudyError> {
        let mut file = File::create(path)?;
        writeln!(file, "# cantilever model snapshot")?;
        writeln!(file, "length = {}", self.length)?;
        writeln!(file, "width = {}", self.width)?;
        writeln!(file, "height = {}", self.height)?;
        writeln!(file, "load = {}", self.load)?;
        debug!("saved model snapshot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_stress_matches_hand_calculation() {
        let mut session = CantileverSession::open("beam.fcstd");
        session.solve(true).unwrap();
        let field = session.read_result_field("vonMises").unwrap();
        // 6 * 500 * 100 / (10 * 10^2) = 300 MPa at the root
        assert!((field[0] - 300.0).abs() < 1e-9);
        // stress decays toward the tip
        assert!(field.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn thicker_section_lowers_stress() {
        let mut thin = CantileverSession::open("beam.fcstd");
        thin.set_constraint("Beam", "Height", 8.0).unwrap();
        thin.recompute().unwrap();
        thin.solve(true).unwrap();

        let mut thick = CantileverSession::open("beam.fcstd");
        thick.set_constraint("Beam", "Height", 16.0).unwrap();
        thick.recompute().unwrap();
        thick.solve(true).unwrap();

        let thin_max = thin.read_result_field("vonMises").unwrap()[0];
        let thick_max = thick.read_result_field("vonMises").unwrap()[0];
        assert!(thick_max < thin_max);
    }

    #[test]
    fn unknown_constraint_is_a_configuration_error() {
        let mut session = CantileverSession::open("beam.fcstd");
        let err = session.set_constraint("Beam", "Bogus", 1.0).unwrap_err();
        assert!(matches!(err, StudyError::Configuration { .. }));
        let err = session.set_constraint("Pocket", "Length", 1.0).unwrap_err();
        assert!(matches!(err, StudyError::Configuration { .. }));
    }

    #[test]
    fn degenerate_section_leaves_no_results() {
        let mut session = CantileverSession::open("beam.fcstd");
        session.set_constraint("Beam", "Height", 0.0).unwrap();
        session.recompute().unwrap();
        session.solve(true).unwrap();
        assert!(!session.results_present());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::time::Duration;

    use crate::cantilever::CantileverSession;
    use crate::error::StudyError;
    use crate::session::{ExportFormat, FemSession};
    use crate::study::config::{Strategy, StudyConfig};
    use crate::study::evaluator::Evaluator;
    use crate::study::export::export_table_to_csv;
    use crate::study::genetic::{GaParams, GeneticExplorer};
    use crate::study::grid::GridExplorer;
    use crate::study::results::{save_best_model, Provenance, ResultsTable, TrialRecord};
    use crate::study::runner::StudyRunner;
    use crate::study::variable::{Output, Reduction, Variable};

    enum SolveOutcome {
        Absent,
        Field(Vec<f64>),
    }

    /// Session double whose solves play back a scripted outcome sequence.
    struct ScriptedSession {
        outcomes: VecDeque<SolveOutcome>,
        current: Option<Vec<f64>>,
        constraints_set: usize,
        solves: usize,
    }

    impl ScriptedSession {
        fn new(outcomes: Vec<SolveOutcome>) -> Self {
            Self {
                outcomes: outcomes.into(),
                current: None,
                constraints_set: 0,
                solves: 0,
            }
        }
    }

    impl FemSession for ScriptedSession {
        fn set_constraint(
            &mut self,
            object: &str,
            constraint: &str,
            _value: f64,
        ) -> Result<(), StudyError> {
            if object == "Missing" {
                return Err(StudyError::Configuration {
                    object: object.to_string(),
                    constraint: constraint.to_string(),
                });
            }
            self.constraints_set += 1;
            Ok(())
        }

        fn recompute(&mut self) -> Result<(), StudyError> {
            Ok(())
        }

        fn prepare_solver(&mut self) -> Result<(), StudyError> {
            self.current = None;
            Ok(())
        }

        fn check_prerequisites(&self) -> Result<(), StudyError> {
            Ok(())
        }

        fn solve(&mut self, _quiet: bool) -> Result<(), StudyError> {
            self.solves += 1;
            self.current = match self.outcomes.pop_front() {
                Some(SolveOutcome::Field(field)) => Some(field),
                Some(SolveOutcome::Absent) | None => None,
            };
            Ok(())
        }

        fn results_present(&self) -> bool {
            self.current.is_some()
        }

        fn read_result_field(&self, _name: &str) -> Result<Vec<f64>, StudyError> {
            Ok(self.current.clone().unwrap_or_default())
        }

        fn export_results(&self, _path: &Path, _format: ExportFormat) -> Result<(), StudyError> {
            Ok(())
        }

        fn save_as(&self, _path: &Path) -> Result<(), StudyError> {
            Ok(())
        }
    }

    fn objective() -> Vec<Output> {
        vec![Output::new("vonMises", Reduction::Max).with_unit("MPa")]
    }

    fn record(values: Vec<f64>, objective: f64, provenance: Provenance) -> TrialRecord {
        TrialRecord {
            values,
            outputs: vec![objective],
            provenance,
        }
    }

    #[test]
    fn sweep_with_single_step_yields_both_bounds() {
        let variable = Variable::new("Beam", "Length", 0.0, 10.0, 1);
        assert_eq!(variable.sweep_values(), vec![0.0, 10.0]);
    }

    #[test]
    fn sweep_is_evenly_spaced_with_endpoints() {
        let variable = Variable::new("Beam", "Length", 0.0, 10.0, 5);
        assert_eq!(variable.sweep_values(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn unit_qualified_headers() {
        let variable = Variable::new("Beam", "Length", 0.0, 10.0, 1).with_unit("mm");
        assert_eq!(variable.column_header(), "Length [mm]");
        let bare = Variable::new("Beam", "Height", 0.0, 10.0, 1);
        assert_eq!(bare.column_header(), "Height");
        let output = Output::new("vonMises", Reduction::Max).with_unit("MPa");
        assert_eq!(output.column_header(), "vonMises [MPa]");
    }

    #[test]
    fn reduction_is_undefined_on_empty_fields() {
        assert_eq!(Reduction::Max.apply(&[]), None);
        assert_eq!(Reduction::Max.apply(&[1.0, 4.0, 2.0]), Some(4.0));
        assert_eq!(Reduction::Min.apply(&[1.0, 4.0, 2.0]), Some(1.0));
    }

    #[test]
    fn grid_evaluates_one_trial_per_aligned_row() {
        let variables = vec![
            Variable::new("Beam", "Length", 50.0, 150.0, 4),
            Variable::new("Beam", "Height", 6.0, 18.0, 4),
        ];
        let outputs = objective();
        let mut session = ScriptedSession::new(
            (0..4).map(|i| SolveOutcome::Field(vec![100.0 + i as f64])).collect(),
        );
        let mut table = ResultsTable::new(&variables, &outputs);

        GridExplorer {
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut session, &variables, &outputs, &mut table)
        .unwrap();

        assert_eq!(table.len(), 4);
        for (row, rec) in table.records().iter().enumerate() {
            assert_eq!(rec.provenance, Provenance::Row(row));
            assert_eq!(rec.values.len(), 2);
        }
        // aligned rows, not a Cartesian product
        assert_eq!(session.solves, 4);
    }

    #[test]
    fn grid_rejects_misaligned_sweeps() {
        let variables = vec![
            Variable::new("Beam", "Length", 50.0, 150.0, 5),
            Variable::new("Beam", "Height", 6.0, 18.0, 3),
        ];
        let outputs = objective();
        let mut session = ScriptedSession::new(Vec::new());
        let mut table = ResultsTable::new(&variables, &outputs);

        let err = GridExplorer {
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut session, &variables, &outputs, &mut table)
        .unwrap_err();

        assert!(matches!(err, StudyError::DataShape(_)));
        assert_eq!(session.solves, 0);
    }

    #[test]
    fn evaluator_retries_zero_objective_up_to_bound() {
        let variables = vec![Variable::new("Beam", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut session = ScriptedSession::new(vec![
            SolveOutcome::Field(vec![0.0]),
            SolveOutcome::Field(vec![0.0]),
            SolveOutcome::Field(vec![0.0]),
        ]);

        let err = Evaluator::new(&mut session, &outputs)
            .with_settle_delay(Duration::ZERO)
            .evaluate(&variables, &[0.5])
            .unwrap_err();

        assert!(matches!(err, StudyError::SolveExhausted { retries: 3 }));
        assert_eq!(session.solves, 3);
    }

    #[test]
    fn evaluator_returns_on_first_non_zero_result() {
        let variables = vec![Variable::new("Beam", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut session = ScriptedSession::new(vec![
            SolveOutcome::Field(vec![0.0]),
            SolveOutcome::Field(vec![0.0]),
            SolveOutcome::Field(vec![120.0, 80.0]),
        ]);

        let reduced = Evaluator::new(&mut session, &outputs)
            .with_settle_delay(Duration::ZERO)
            .evaluate(&variables, &[0.5])
            .unwrap();

        assert_eq!(reduced, vec![120.0]);
        assert_eq!(session.solves, 3);
        // constraints were applied exactly once, not per retry
        assert_eq!(session.constraints_set, 1);
    }

    #[test]
    fn evaluator_retries_absent_results() {
        let variables = vec![Variable::new("Beam", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut session = ScriptedSession::new(vec![
            SolveOutcome::Absent,
            SolveOutcome::Field(vec![55.0]),
        ]);

        let reduced = Evaluator::new(&mut session, &outputs)
            .with_settle_delay(Duration::ZERO)
            .evaluate(&variables, &[0.5])
            .unwrap();

        assert_eq!(reduced, vec![55.0]);
        assert_eq!(session.solves, 2);
    }

    #[test]
    fn configuration_errors_are_not_retried() {
        let variables = vec![Variable::new("Missing", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut session = ScriptedSession::new(vec![SolveOutcome::Field(vec![10.0])]);

        let err = Evaluator::new(&mut session, &outputs)
            .with_settle_delay(Duration::ZERO)
            .evaluate(&variables, &[0.5])
            .unwrap_err();

        assert!(matches!(err, StudyError::Configuration { .. }));
        assert_eq!(session.solves, 0);
    }

    #[test]
    fn evaluator_rejects_mismatched_assignment() {
        let variables = vec![Variable::new("Beam", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut session = ScriptedSession::new(Vec::new());

        let err = Evaluator::new(&mut session, &outputs)
            .with_settle_delay(Duration::ZERO)
            .evaluate(&variables, &[0.5, 0.7])
            .unwrap_err();

        assert!(matches!(err, StudyError::DataShape(_)));
    }

    #[test]
    fn best_trial_is_global_minimum_with_first_seen_tie_break() {
        let variables = vec![Variable::new("Beam", "Length", 0.0, 1.0, 1)];
        let outputs = objective();
        let mut table = ResultsTable::new(&variables, &outputs);
        table.append(record(vec![0.1], 5.0, Provenance::Row(0))).unwrap();
        table.append(record(vec![0.2], 3.0, Provenance::Row(1))).unwrap();
        table.append(record(vec![0.3], 3.0, Provenance::Row(2))).unwrap();
        table.append(record(vec![0.4], 4.0, Provenance::Row(3))).unwrap();

        let best = table.best().unwrap();
        assert_eq!(best.provenance, Provenance::Row(1));
        assert_eq!(best.values, vec![0.2]);
    }

    #[test]
    fn table_rejects_cardinality_mismatch() {
        let variables = vec![
            Variable::new("Beam", "Length", 0.0, 1.0, 1),
            Variable::new("Beam", "Height", 0.0, 1.0, 1),
        ];
        let outputs = objective();
        let mut table = ResultsTable::new(&variables, &outputs);
        let err = table
            .append(record(vec![0.1], 5.0, Provenance::Row(0)))
            .unwrap_err();
        assert!(matches!(err, StudyError::DataShape(_)));
        assert!(table.is_empty());
    }

    fn cantilever_variables() -> Vec<Variable> {
        vec![
            Variable::new("Beam", "Length", 50.0, 150.0, 5).with_unit("mm"),
            Variable::new("Beam", "Height", 6.0, 18.0, 5).with_unit("mm"),
        ]
    }

    fn ga_params(seed: u64) -> GaParams {
        GaParams {
            population_size: 3,
            generations: 2,
            sigma: 0.5,
            seed,
            ..GaParams::default()
        }
    }

    #[test]
    fn genetic_records_population_size_times_generations_trials() {
        let variables = cantilever_variables();
        let outputs = objective();
        let mut session = CantileverSession::open("beam.fcstd");
        let mut table = ResultsTable::new(&variables, &outputs);

        GeneticExplorer {
            params: ga_params(42),
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut session, &variables, &outputs, &mut table)
        .unwrap();

        assert_eq!(table.len(), 6);
        let expected: Vec<Provenance> = (1..=2)
            .flat_map(|generation| {
                (0..3).map(move |member| Provenance::Generation { generation, member })
            })
            .collect();
        let seen: Vec<Provenance> = table.records().iter().map(|r| r.provenance).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn genetic_runs_are_reproducible_under_a_fixed_seed() {
        let variables = cantilever_variables();
        let outputs = objective();

        let mut first = ResultsTable::new(&variables, &outputs);
        GeneticExplorer {
            params: ga_params(7),
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut CantileverSession::open("beam.fcstd"), &variables, &outputs, &mut first)
        .unwrap();

        let mut second = ResultsTable::new(&variables, &outputs);
        GeneticExplorer {
            params: ga_params(7),
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut CantileverSession::open("beam.fcstd"), &variables, &outputs, &mut second)
        .unwrap();

        assert_eq!(first.records(), second.records());

        let mut reseeded = ResultsTable::new(&variables, &outputs);
        GeneticExplorer {
            params: ga_params(8),
            max_retries: 3,
            settle_delay: Duration::ZERO,
        }
        .run(&mut CantileverSession::open("beam.fcstd"), &variables, &outputs, &mut reseeded)
        .unwrap();
        assert_ne!(first.records(), reseeded.records());
    }

    #[test]
    fn csv_places_variable_columns_before_output_columns() {
        let variables = vec![
            Variable::new("Beam", "Length", 0.0, 1.0, 1).with_unit("mm"),
            Variable::new("Beam", "Height", 0.0, 1.0, 1),
        ];
        let outputs = objective();
        let mut table = ResultsTable::new(&variables, &outputs);
        table
            .append(record(vec![0.5, 0.25], 42.0, Provenance::Row(0)))
            .unwrap();
        table
            .append(record(
                vec![0.75, 0.5],
                17.0,
                Provenance::Generation {
                    generation: 2,
                    member: 0,
                },
            ))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        export_table_to_csv(&table, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Length [mm],Height,vonMises [MPa],generation"
        );
        assert_eq!(lines.next().unwrap(), "0.5,0.25,42,row 0");
        assert_eq!(lines.next().unwrap(), "0.75,0.5,17,gen 2");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.toml");
        let config = StudyConfig::sample(
            "cantilever study".to_string(),
            "models/beam.fcstd".to_string(),
            Strategy::Genetic,
        );
        config.to_file(path.to_str().unwrap()).unwrap();
        let loaded = StudyConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn unsupported_export_format_is_rejected() {
        assert!(ExportFormat::parse("vtk").is_ok());
        let err = ExportFormat::parse("stl").unwrap_err();
        assert!(matches!(err, StudyError::ExportFormat(_)));
    }

    #[test]
    fn best_model_snapshot_is_named_from_winning_constraints() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("beam.fcstd");
        let variables = cantilever_variables();
        let best = record(
            vec![82.5, 12.0],
            150.0,
            Provenance::Generation {
                generation: 1,
                member: 0,
            },
        );

        let mut session = CantileverSession::open(&model_path);
        let snapshot = save_best_model(&mut session, &variables, &best, &model_path, "GA").unwrap();

        assert_eq!(
            snapshot.file_name().unwrap().to_str().unwrap(),
            "Length_82.5_Height_12_GA.fcstd"
        );
        assert!(snapshot.exists());
    }

    #[test]
    fn best_model_save_rejects_value_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("beam.fcstd");
        let variables = cantilever_variables();
        let best = record(vec![82.5], 150.0, Provenance::Row(0));

        let mut session = CantileverSession::open(&model_path);
        let err = save_best_model(&mut session, &variables, &best, &model_path, "GA").unwrap_err();
        assert!(matches!(err, StudyError::DataShape(_)));
        assert!(!dir.path().join("results").exists());
    }

    #[test]
    fn runner_sweeps_exports_and_saves_best() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("beam.fcstd");
        let output_dir = dir.path().join("out");

        let config = StudyConfig {
            settle_delay_ms: 0,
            ..StudyConfig::sample(
                "cantilever sweep".to_string(),
                model_path.to_str().unwrap().to_string(),
                Strategy::Grid,
            )
        };
        let mut session = CantileverSession::open(&model_path);
        let table = StudyRunner::new(config, &output_dir).run(&mut session).unwrap();

        assert_eq!(table.len(), 5);
        // longest, thickest row wins: stress falls faster with h^2 than it
        // grows with L over these aligned rows
        let best = table.best().unwrap();
        assert_eq!(best.values, vec![150.0, 18.0]);

        assert!(output_dir.join("cantilever_sweep.csv").exists());
        assert!(output_dir.join("best_result.vtk").exists());
        assert!(dir
            .path()
            .join("results")
            .join("Length_150_Height_18_sweep.fcstd")
            .exists());
    }
}

//! End-to-end imputation runs.

mod common;

use approx::assert_abs_diff_eq;
use common::*;
use mice_impute::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[test]
fn test_fallback_example() {
    let config = ConfigBuilder::new()
        .columns(vec![0, 1])
        .max_passes(1)
        .model_family(ModelFamily::None)
        .build()
        .unwrap();
    let result = impute(&small_example(), config).unwrap();

    let expected = [[1.0, 2.0], [2.0, 11.0 / 3.0], [7.0 / 3.0, 4.0], [4.0, 5.0]];
    for (row, expected_row) in result.data.iter().zip(expected.iter()) {
        for (cell, &value) in row.iter().zip(expected_row.iter()) {
            assert_abs_diff_eq!(cell.as_f64().unwrap(), value, epsilon = 1e-12);
        }
    }
    assert_eq!(result.missing_count, vec![1, 1]);
    assert_eq!(result.column_types, vec![ColumnType::Regression, ColumnType::Regression]);
    assert!(result.importance_matrix.is_empty());
}

#[test]
fn test_every_family_fills_targets() {
    let dataset = mixed_dataset(80, 3);
    for family in [ModelFamily::TreeEnsemble, ModelFamily::Linear, ModelFamily::None] {
        let mut config = fast_config(family);
        config.max_passes = 2;
        let result = impute(&dataset, config).unwrap();
        assert!(targets_complete(&result), "{} left targeted cells missing", family);
        assert_eq!(result.remaining_missing(), 0);
    }
}

#[test]
fn test_bookkeeping_is_frozen() {
    let dataset = mixed_dataset(60, 11);
    let mut config = fast_config(ModelFamily::Linear);
    config.max_passes = 3;
    let result = impute(&dataset, config).unwrap();

    for col in 0..dataset.num_columns() {
        let expected: Vec<usize> = (0..dataset.num_rows())
            .filter(|&r| dataset.get(r, col).unwrap().is_missing())
            .collect();
        assert_eq!(result.missing_index[col], expected);
        assert_eq!(result.missing_count[col], expected.len());
    }
    assert_eq!(result.importance_matrix.len(), 3 * dataset.num_columns());
}

#[test]
fn test_observed_cells_untouched() {
    let dataset = mixed_dataset(50, 5);
    let result = impute(&dataset, fast_config(ModelFamily::TreeEnsemble)).unwrap();
    for (r, row) in dataset.rows().iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if !cell.is_missing() {
                assert_eq!(&result.data[r][c], cell);
            }
        }
    }
}

#[test]
fn test_categorical_estimates_are_observed_labels() {
    let dataset = mixed_dataset(90, 21);
    let observed: HashSet<String> = dataset
        .column(2)
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();

    for family in [ModelFamily::TreeEnsemble, ModelFamily::Linear] {
        let result = impute(&dataset, fast_config(family)).unwrap();
        assert_eq!(result.column_types[2], ColumnType::Classification);
        for &row in &result.missing_index[2] {
            let label = result.data[row][2].as_str().expect("label imputed as text");
            assert!(observed.contains(label), "unexpected label {}", label);
        }
    }
}

#[test]
fn test_forest_runs_are_deterministic() {
    let dataset = mixed_dataset(60, 8);
    let mut config = fast_config(ModelFamily::TreeEnsemble);
    config.max_passes = 2;
    let a = impute(&dataset, config.clone()).unwrap();
    let b = impute(&dataset, config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parallel_matches_sequential() {
    let dataset = mixed_dataset(60, 13);
    for family in [ModelFamily::TreeEnsemble, ModelFamily::Linear] {
        let mut config = fast_config(family);
        config.max_passes = 2;
        config.parallel = true;
        let parallel = impute(&dataset, config.clone()).unwrap();
        config.parallel = false;
        let sequential = impute(&dataset, config.clone()).unwrap();
        config.num_threads = 2;
        let pooled = impute(&dataset, config).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel, pooled);
    }
}

/// Rows `(i, 10 i + i², i²)` for i in 1..=8, then a row with only the last
/// column observed.
fn chained_rows() -> Dataset {
    let mut rows: Vec<Vec<Option<f64>>> = (1..=8)
        .map(|i| {
            let i = i as f64;
            vec![Some(i), Some(10.0 * i + i * i), Some(i * i)]
        })
        .collect();
    rows.push(vec![None, None, Some(100.0)]);
    Dataset::from_values(rows).unwrap()
}

#[test]
fn test_columns_in_a_pass_read_previous_base() {
    let dataset = chained_rows();
    let run = |passes: usize| {
        let config = ConfigBuilder::new()
            .model_family(ModelFamily::Linear)
            .max_passes(passes)
            .parallel(false)
            .build()
            .unwrap();
        impute(&dataset, config).unwrap()
    };

    // Fallbacks: column 0 mean 4.5, column 1 mean 70.5
    let one = run(1);
    let col0 = one.data[8][0].as_f64().unwrap();
    let col1 = one.data[8][1].as_f64().unwrap();
    // Column 0 is fitted as (col1 - col2) / 10 on column 1's fallback
    assert_abs_diff_eq!(col0, (70.5 - 100.0) / 10.0, epsilon = 1e-6);
    // Column 1 sees column 0's fallback, not the estimate made earlier in the pass
    assert_abs_diff_eq!(col1, 10.0 * 4.5 + 100.0, epsilon = 1e-6);

    let two = run(2);
    let col1_second = two.data[8][1].as_f64().unwrap();
    assert_abs_diff_eq!(col1_second, 10.0 * col0 + 100.0, epsilon = 1e-6);
    assert!((col1_second - col1).abs() > 1.0);
}

#[test]
fn test_importance_records() {
    let dataset = mixed_dataset(60, 17);
    let mut config = fast_config(ModelFamily::TreeEnsemble);
    config.columns = Some(vec![2, 0]);
    config.max_passes = 2;
    let result = impute(&dataset, config).unwrap();

    let order: Vec<(usize, usize)> = result.importance_matrix.iter().map(|r| (r.pass, r.column)).collect();
    assert_eq!(order, vec![(1, 2), (1, 0), (2, 2), (2, 0)]);
    for record in &result.importance_matrix {
        assert_eq!(record.importance.len(), 4);
        assert_eq!(record.importance[record.column], None);
        for (c, value) in record.importance.iter().enumerate() {
            if c != record.column {
                assert!(value.unwrap().is_finite());
            }
        }
    }
}

#[test]
fn test_scaled_importance_bounded() {
    let dataset = mixed_dataset(60, 19);
    let mut config = fast_config(ModelFamily::Linear);
    config.scale_importance = true;
    let result = impute(&dataset, config).unwrap();
    for record in &result.importance_matrix {
        let values: Vec<f64> = record.importance.iter().flatten().copied().collect();
        assert!(values.iter().all(|v| v.abs() <= 1.0 + 1e-12));
        if values.iter().any(|v| *v != 0.0) {
            assert!(values.iter().any(|v| (v.abs() - 1.0).abs() < 1e-12));
        }
    }
}

#[test]
fn test_informative_predictor_ranks_first() {
    let rows = mixed_rows(120, 23);
    let dataset = knock_out(&rows, 0.1, 24);
    let mut config = fast_config(ModelFamily::TreeEnsemble);
    config.columns = Some(vec![1]);
    let result = impute(&dataset, config).unwrap();

    let record = &result.importance_matrix[0];
    let x0 = record.importance[0].unwrap();
    let noise = record.importance[3].unwrap();
    assert!(x0 > noise, "x0 = {}, noise = {}", x0, noise);
}

#[test]
fn test_fully_missing_column_is_rejected() {
    let dataset = Dataset::from_values(vec![
        vec![Some(1.0), None],
        vec![Some(2.0), None],
        vec![Some(3.0), None],
    ])
    .unwrap();
    let err = impute(&dataset, ImputeConfig::default()).unwrap_err();
    assert!(matches!(err, ImputeError::EmptyColumn { column: 1 }));
    assert_eq!(err.category(), "invalid_input");
}

#[test]
fn test_target_column_validation() {
    let mut config = ImputeConfig::default();
    config.columns = Some(vec![0, 7]);
    assert!(matches!(
        impute(&small_example(), config),
        Err(ImputeError::InvalidInput { .. })
    ));

    let mut config = ImputeConfig::default();
    config.columns = Some(vec![1, 1]);
    assert!(matches!(
        ImputationEngine::new(config),
        Err(ImputeError::InvalidParameter { .. })
    ));
}

#[test]
fn test_unsupported_detector_tag() {
    let detector = Arc::new(TagDetector::new(|_: &[&Value]| "ordinal".to_string()));
    let engine = ImputationEngine::new(ImputeConfig::default())
        .unwrap()
        .with_type_detector(detector);
    assert!(matches!(
        engine.run(&small_example()),
        Err(ImputeError::UnsupportedType { column: 0, .. })
    ));
}

#[test]
fn test_custom_detector_forces_classification() {
    let detector = Arc::new(TagDetector::new(|_: &[&Value]| "classification".to_string()));
    let engine = ImputationEngine::new(fast_config(ModelFamily::Linear))
        .unwrap()
        .with_type_detector(detector);
    let result = engine.run(&small_example()).unwrap();
    assert_eq!(result.column_types, vec![ColumnType::Classification; 2]);
    // Imputed values are existing labels of their column
    assert!([1.0, 2.0, 4.0].contains(&result.data[2][0].as_f64().unwrap()));
    assert!([2.0, 4.0, 5.0].contains(&result.data[1][1].as_f64().unwrap()));
}

#[test]
fn test_column_failure_aborts_run() {
    // Squared deviations of the predictor overflow, so the normal equations
    // cannot be solved.
    let dataset = Dataset::from_values(vec![
        vec![Some(1.0), Some(1e200)],
        vec![Some(2.0), Some(-1e200)],
        vec![None, Some(3e200)],
        vec![Some(4.0), Some(1e200)],
    ])
    .unwrap();
    let mut config = fast_config(ModelFamily::Linear);
    config.columns = Some(vec![0]);

    let err = impute(&dataset, config).unwrap_err();
    match &err {
        ImputeError::ColumnFailed { pass, column, .. } => {
            assert_eq!((*pass, *column), (1, 0));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(matches!(err.root_cause(), ImputeError::ModelTraining { .. }));
    assert_eq!(err.category(), "model_training");
}

#[test]
fn test_json_input_and_output() {
    let dataset = Dataset::from_json_str(r#"[[1, "a"], [2, null], [null, "b"], [4, "a"], [5, ""]]"#).unwrap();
    let config = ConfigBuilder::new().model_family(ModelFamily::None).build().unwrap();
    let result = impute(&dataset, config).unwrap();
    assert_eq!(result.data[1][1], Value::from("a"));
    assert_eq!(result.data[4][1], Value::from("a"));

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["missing_count"], serde_json::json!([1, 2]));
    assert_eq!(json["column_types"][1], "classification");
}

#[test]
fn test_verbose_progress_through_memory_logger() {
    let logger = Arc::new(MemoryLogger::new());
    let mut config = fast_config(ModelFamily::TreeEnsemble);
    config.max_passes = 2;
    config.parallel = false;
    ImputationEngine::new(config)
        .unwrap()
        .with_logger(logger.clone())
        .run(&small_example())
        .unwrap();

    let lines = logger.lines();
    assert!(lines.contains(&"INFO Missing values by column: [1, 1]".to_string()));
    assert!(lines.contains(&"INFO Column types: [\"regression\", \"regression\"]".to_string()));
    assert!(lines.contains(&"INFO Pass 2/2".to_string()));
    assert!(lines
        .iter()
        .any(|l| l.starts_with("DEBUG  > column 0 (random_forest_regressor)")));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_fallback_run_invariants(
        cells in prop::collection::vec(prop::option::of(-100.0f64..100.0), 12..40),
        width in 2usize..4,
    ) {
        let rows: Vec<Vec<Value>> = cells
            .chunks(width)
            .filter(|chunk| chunk.len() == width)
            .enumerate()
            .map(|(i, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    // Row 0 is complete so no column is empty
                    .map(|(j, v)| if i == 0 { Value::from(j as f64 + 0.5) } else { Value::from(*v) })
                    .collect()
            })
            .collect();
        let dataset = Dataset::new(rows).unwrap();
        let config = ConfigBuilder::new().model_family(ModelFamily::None).build().unwrap();
        let result = impute(&dataset, config).unwrap();

        prop_assert!(targets_complete(&result));
        for col in 0..dataset.num_columns() {
            prop_assert_eq!(result.missing_count[col], result.missing_index[col].len());
        }
        let again = impute(&dataset, ConfigBuilder::new().model_family(ModelFamily::None).build().unwrap()).unwrap();
        prop_assert_eq!(result, again);
    }
}

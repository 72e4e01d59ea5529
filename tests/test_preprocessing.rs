//! Integration test: preprocessing components on in-memory frames

use polars::prelude::*;
use student_performance::prelude::*;
use student_performance::preprocessing::{ImputeValue, ScalerParams};

fn scores_df() -> DataFrame {
    df!(
        "writing_score" => &[Some(74.0), Some(88.0), None, Some(44.0), Some(75.0)],
        "lunch" => &[Some("standard"), None, Some("standard"), Some("free/reduced"), Some("standard")]
    )
    .unwrap()
}

fn dispatcher(handle_unknown: UnknownCategory) -> ColumnDispatcher {
    let numeric = Pipeline::new()
        .with_step("imputer", PipelineStep::Impute(Imputer::new(ImputeStrategy::Median)))
        .with_step("scaler", PipelineStep::Scale(Scaler::standard()));
    let categorical = Pipeline::new()
        .with_step("imputer", PipelineStep::Impute(Imputer::new(ImputeStrategy::MostFrequent)))
        .with_step("one_hot_encoder", PipelineStep::Encode(Encoder::new(handle_unknown)))
        .with_step("scaler", PipelineStep::Scale(Scaler::standard_without_mean()));

    ColumnDispatcher::new()
        .with_branch("num_pipeline", ColumnType::Numeric, ["writing_score"], numeric)
        .unwrap()
        .with_branch("cat_pipeline", ColumnType::Categorical, ["lunch"], categorical)
        .unwrap()
}

fn scaler_params(dispatcher: &ColumnDispatcher, branch: &str, column: &str) -> ScalerParams {
    match dispatcher.branch(branch).unwrap().pipeline().step("scaler") {
        Some(PipelineStep::Scale(scaler)) => scaler.params(column).unwrap(),
        other => panic!("unexpected step: {:?}", other),
    }
}

#[test]
fn test_dispatcher_fit_transform() {
    let mut dispatcher = dispatcher(UnknownCategory::Error);
    let matrix = dispatcher.fit_transform(&scores_df()).unwrap();

    assert_eq!(matrix.dim(), (5, 3));
    assert!(matrix.iter().all(|v| v.is_finite()), "all missing values should be imputed");

    // imputed median (74.5) is used before scaling
    let params = scaler_params(&dispatcher, "num_pipeline", "writing_score");
    assert!((matrix[[2, 0]] - (74.5 - params.center) / params.scale).abs() < 1e-12);
}

#[test]
fn test_test_frame_does_not_shift_statistics() {
    let mut dispatcher = dispatcher(UnknownCategory::Error);
    dispatcher.fit(&scores_df()).unwrap();
    let before = scaler_params(&dispatcher, "num_pipeline", "writing_score");

    let shifted = df!(
        "writing_score" => &[1000.0, 2000.0],
        "lunch" => &["free/reduced", "free/reduced"]
    )
    .unwrap();
    let matrix = dispatcher.transform(&shifted).unwrap();

    let after = scaler_params(&dispatcher, "num_pipeline", "writing_score");
    assert_eq!(before, after);
    assert!((matrix[[0, 0]] - (1000.0 - before.center) / before.scale).abs() < 1e-9);
}

#[test]
fn test_unknown_category_handling() {
    let unseen = df!(
        "writing_score" => &[70.0],
        "lunch" => &["premium"]
    )
    .unwrap();

    let mut strict = dispatcher(UnknownCategory::Error);
    strict.fit(&scores_df()).unwrap();
    assert!(matches!(
        strict.transform(&unseen),
        Err(PipelineError::UnknownCategory { .. })
    ));

    let mut lenient = dispatcher(UnknownCategory::Ignore);
    lenient.fit(&scores_df()).unwrap();
    let matrix = lenient.transform(&unseen).unwrap();
    assert_eq!(matrix[[0, 1]], 0.0);
    assert_eq!(matrix[[0, 2]], 0.0);
}

#[test]
fn test_transform_requires_fit() {
    let dispatcher = dispatcher(UnknownCategory::Error);
    assert!(matches!(
        dispatcher.transform(&scores_df()),
        Err(PipelineError::ModelNotFitted)
    ));
    assert!(dispatcher.feature_names_out().is_err());
}

#[test]
fn test_save_and_load_roundtrip_keeps_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("artifacts").join("preprocessor.json");

    let mut dispatcher = dispatcher(UnknownCategory::Error);
    let trained = dispatcher.fit_transform(&scores_df()).unwrap();
    dispatcher.save(&path).unwrap();

    let loaded = ColumnDispatcher::load(&path).unwrap();
    assert!(loaded.is_fitted());
    assert_eq!(loaded.feature_names_out().unwrap(), dispatcher.feature_names_out().unwrap());
    assert_eq!(loaded.transform(&scores_df()).unwrap(), trained);
}

#[test]
fn test_reloaded_statistics_are_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.json");

    let mut fitted = dispatcher(UnknownCategory::Error);
    fitted.fit(&scores_df()).unwrap();
    fitted.save(&path).unwrap();
    let loaded = ColumnDispatcher::load(&path).unwrap();

    for (branch, column) in [("num_pipeline", "writing_score"), ("cat_pipeline", "lunch_standard")] {
        let a = scaler_params(&fitted, branch, column);
        let b = scaler_params(&loaded, branch, column);
        assert_eq!(a.center.to_bits(), b.center.to_bits(), "{} center", column);
        assert_eq!(a.scale.to_bits(), b.scale.to_bits(), "{} scale", column);
    }

    let fill = |d: &ColumnDispatcher| match d.branch("num_pipeline").unwrap().pipeline().step("imputer") {
        Some(PipelineStep::Impute(imputer)) => match imputer.fill_value("writing_score") {
            Some(ImputeValue::Numeric(v)) => v.to_bits(),
            other => panic!("unexpected fill value: {:?}", other),
        },
        other => panic!("unexpected step: {:?}", other),
    };
    assert_eq!(fill(&fitted), fill(&loaded));

    assert_eq!(loaded.transform(&scores_df()).unwrap(), fitted.transform(&scores_df()).unwrap());
}

#[test]
fn test_integer_scores_are_accepted() {
    let df = df!(
        "writing_score" => &[74i64, 88, 44],
        "lunch" => &["standard", "standard", "free/reduced"]
    )
    .unwrap();

    let mut dispatcher = dispatcher(UnknownCategory::Error);
    let matrix = dispatcher.fit_transform(&df).unwrap();
    let mean: f64 = matrix.column(0).sum() / 3.0;
    assert!(mean.abs() < 1e-12);
}

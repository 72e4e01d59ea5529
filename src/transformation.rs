//! Train/test transformation run
//!
//! Loads the two splits, fits the column dispatcher on the training
//! predictors only, transforms both splits, appends the target as the last
//! column and persists the fitted dispatcher.

use crate::config::TransformationConfig;
use crate::error::{PipelineError, Result, StepContext};
use crate::preprocessing::{
    ColumnDispatcher, ColumnType, Encoder, Imputer, Pipeline, PipelineStep, Scaler,
};
use crate::utils::DataLoader;
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Branch names inside the dispatcher
pub const NUMERIC_BRANCH: &str = "num_pipeline";
pub const CATEGORICAL_BRANCH: &str = "cat_pipeline";

/// Result of a transformation run
#[derive(Debug, Clone)]
pub struct TransformationOutput {
    /// Transformed training features with the target as last column
    pub train: Array2<f64>,
    /// Transformed test features with the target as last column
    pub test: Array2<f64>,
    /// Where the fitted dispatcher was saved
    pub preprocessor_path: PathBuf,
    /// Column names of `train` / `test`, target included
    pub column_names: Vec<String>,
}

/// Builds the preprocessor and runs it over a train/test pair
#[derive(Debug, Clone, Default)]
pub struct DataTransformation {
    config: TransformationConfig,
    loader: DataLoader,
}

impl DataTransformation {
    pub fn new(config: TransformationConfig) -> Self {
        Self {
            config,
            loader: DataLoader::new(),
        }
    }

    /// Use a custom CSV loader
    pub fn with_loader(mut self, loader: DataLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &TransformationConfig {
        &self.config
    }

    /// Construct the unfit dispatcher for the configured column groups
    pub fn build_preprocessor(&self) -> Result<ColumnDispatcher> {
        self.try_build_preprocessor().during("building preprocessor")
    }

    fn try_build_preprocessor(&self) -> Result<ColumnDispatcher> {
        let config = &self.config;
        config.validate()?;

        let num_pipeline = Pipeline::new()
            .with_step(
                "imputer",
                PipelineStep::Impute(Imputer::new(config.numeric_impute_strategy.clone())),
            )
            .with_step("scaler", PipelineStep::Scale(Scaler::standard()));

        let cat_pipeline = Pipeline::new()
            .with_step(
                "imputer",
                PipelineStep::Impute(Imputer::new(config.categorical_impute_strategy.clone())),
            )
            .with_step(
                "one_hot_encoder",
                PipelineStep::Encode(Encoder::new(config.handle_unknown)),
            )
            .with_step("scaler", PipelineStep::Scale(Scaler::standard_without_mean()));

        info!(columns = ?config.categorical_columns, "categorical columns");
        info!(columns = ?config.numeric_columns, "numerical columns");

        let mut dispatcher = ColumnDispatcher::new();
        if !config.numeric_columns.is_empty() {
            dispatcher = dispatcher.with_branch(
                NUMERIC_BRANCH,
                ColumnType::Numeric,
                config.numeric_columns.iter().cloned(),
                num_pipeline,
            )?;
        }
        if !config.categorical_columns.is_empty() {
            dispatcher = dispatcher.with_branch(
                CATEGORICAL_BRANCH,
                ColumnType::Categorical,
                config.categorical_columns.iter().cloned(),
                cat_pipeline,
            )?;
        }

        Ok(dispatcher)
    }

    /// Fit on `train_path`, transform both splits and save the fitted dispatcher
    pub fn run(
        &self,
        train_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<TransformationOutput> {
        let start = Instant::now();
        let target = self.config.target_column.as_str();

        let train_df = self.loader.load_csv(train_path.as_ref()).during("reading datasets")?;
        let test_df = self.loader.load_csv(test_path.as_ref()).during("reading datasets")?;
        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            "read train and test data"
        );

        info!("obtaining preprocessing object");
        let mut preprocessor = self.build_preprocessor()?;

        let (train_features, train_target) =
            split_target(&train_df, target).during("splitting target")?;
        let (test_features, test_target) =
            split_target(&test_df, target).during("splitting target")?;

        info!("applying preprocessing object on training and testing data");
        let train_matrix = preprocessor
            .fit_transform(&train_features)
            .during("fitting preprocessor")?;
        let test_matrix = preprocessor
            .transform(&test_features)
            .during("transforming test data")?;

        let train = append_target(train_matrix, &train_target).during("appending target")?;
        let test = append_target(test_matrix, &test_target).during("appending target")?;

        let mut column_names = preprocessor
            .feature_names_out()
            .during("naming output columns")?;
        column_names.push(target.to_string());

        let preprocessor_path = self.config.preprocessor_path.clone();
        preprocessor
            .save(&preprocessor_path)
            .during("saving preprocessor")?;
        info!(
            path = %preprocessor_path.display(),
            features = column_names.len() - 1,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "saved preprocessing object"
        );

        Ok(TransformationOutput {
            train,
            test,
            preprocessor_path,
            column_names,
        })
    }
}

/// Split `df` into predictor frame and target values. Missing targets become NaN.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Vec<f64>)> {
    let column = df
        .column(target)
        .map_err(|_| PipelineError::FeatureNotFound(target.to_string()))?;

    let casted = column.as_materialized_series().cast(&DataType::Float64)?;
    if casted.null_count() > column.null_count() {
        return Err(PipelineError::InvalidInput(format!(
            "target column '{}' contains non-numeric values",
            target
        )));
    }
    let values: Vec<f64> = casted
        .f64()
        .map_err(|e| PipelineError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    let features = df.drop(target)?;
    Ok((features, values))
}

/// Append `target` as the final column of `features`
pub fn append_target(features: Array2<f64>, target: &[f64]) -> Result<Array2<f64>> {
    if features.nrows() != target.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} target values", features.nrows()),
            actual: target.len().to_string(),
        });
    }

    let target = Array2::from_shape_vec((target.len(), 1), target.to_vec())?;
    Ok(concatenate(Axis(1), &[features.view(), target.view()])?)
}

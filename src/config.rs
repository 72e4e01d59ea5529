//! Transformation configuration

use crate::error::{PipelineError, Result};
use crate::preprocessing::{ImputeStrategy, UnknownCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Column groups, strategies and artifact location for one transformation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationConfig {
    /// Numeric predictor columns
    pub numeric_columns: Vec<String>,

    /// Categorical predictor columns
    pub categorical_columns: Vec<String>,

    /// Column to predict; never fed to the preprocessor
    pub target_column: String,

    /// Where the fitted preprocessor is written
    pub preprocessor_path: PathBuf,

    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// What the encoder does with categories unseen during fit
    pub handle_unknown: UnknownCategory,
}

impl Default for TransformationConfig {
    fn default() -> Self {
        Self {
            numeric_columns: vec!["writing_score".to_string(), "reading_score".to_string()],
            categorical_columns: vec![
                "gender".to_string(),
                "race_ethnicity".to_string(),
                "parental_level_of_education".to_string(),
                "lunch".to_string(),
                "test_preparation_course".to_string(),
            ],
            target_column: "math_score".to_string(),
            preprocessor_path: Path::new("artifacts").join("preprocessor.json"),
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            handle_unknown: UnknownCategory::Error,
        }
    }
}

impl TransformationConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set numeric columns
    pub fn with_numeric_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set categorical columns
    pub fn with_categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the target column
    pub fn with_target_column(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    /// Builder method to set where the fitted preprocessor is saved
    pub fn with_preprocessor_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preprocessor_path = path.into();
        self
    }

    /// Builder method to set numeric impute strategy
    pub fn with_numeric_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.numeric_impute_strategy = strategy;
        self
    }

    /// Builder method to set categorical impute strategy
    pub fn with_categorical_impute(mut self, strategy: ImputeStrategy) -> Self {
        self.categorical_impute_strategy = strategy;
        self
    }

    /// Builder method to set unknown-category handling
    pub fn with_unknown_categories(mut self, handle_unknown: UnknownCategory) -> Self {
        self.handle_unknown = handle_unknown;
        self
    }

    /// Check that the column groups are usable
    pub fn validate(&self) -> Result<()> {
        if self.numeric_columns.is_empty() && self.categorical_columns.is_empty() {
            return Err(PipelineError::ConfigError(
                "no numeric or categorical columns configured".to_string(),
            ));
        }
        if self.target_column.is_empty() {
            return Err(PipelineError::ConfigError("target column is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for column in self.numeric_columns.iter().chain(&self.categorical_columns) {
            if column == &self.target_column {
                return Err(PipelineError::ConfigError(format!(
                    "target column '{}' cannot be a predictor",
                    column
                )));
            }
            if !seen.insert(column.as_str()) {
                return Err(PipelineError::ConfigError(format!(
                    "column '{}' is listed more than once",
                    column
                )));
            }
        }

        if matches!(
            self.numeric_impute_strategy,
            ImputeStrategy::ConstantString(_)
        ) {
            return Err(PipelineError::ConfigError(
                "numeric columns cannot be imputed with a string constant".to_string(),
            ));
        }

        Ok(())
    }
}

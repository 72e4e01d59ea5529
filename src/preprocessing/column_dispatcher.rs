//! Column-wise dispatch of column groups to independent pipelines

use crate::error::{PipelineError, Result};
use crate::utils::{load_object, save_object};
use super::{pipeline::Pipeline, ColumnType};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// A named pipeline bound to a disjoint group of input columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    name: String,
    column_type: ColumnType,
    columns: Vec<String>,
    pipeline: Pipeline,
}

impl Branch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Select this branch's columns and cast them to the dtype its pipeline expects
    fn select_input(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len());

        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.clone()))?;
            let series = column.as_materialized_series();

            let casted = match self.column_type {
                ColumnType::Numeric => {
                    let casted = series.cast(&DataType::Float64)?;
                    // a non-strict cast turns unparsable cells into nulls
                    if casted.null_count() > series.null_count() {
                        return Err(PipelineError::InvalidInput(format!(
                            "column '{}' contains non-numeric values",
                            col_name
                        )));
                    }
                    casted
                }
                ColumnType::Categorical => series.cast(&DataType::String)?,
            };
            columns.push(casted.into());
        }

        DataFrame::new(columns).map_err(|e| PipelineError::DataError(e.to_string()))
    }
}

/// Routes column groups to their pipelines and concatenates the outputs
/// into a single feature matrix. Columns not claimed by a branch are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnDispatcher {
    branches: Vec<Branch>,
    is_fitted: bool,
}

impl ColumnDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a branch. Branch names must be unique and column groups disjoint.
    pub fn with_branch<I, S>(
        mut self,
        name: impl Into<String>,
        column_type: ColumnType,
        columns: I,
        pipeline: Pipeline,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if self.is_fitted {
            return Err(PipelineError::AlreadyFitted("column dispatcher".to_string()));
        }
        if columns.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "branch '{}' has no columns",
                name
            )));
        }
        if self.branches.iter().any(|b| b.name == name) {
            return Err(PipelineError::ConfigError(format!(
                "duplicate branch name '{}'",
                name
            )));
        }

        let mut seen: HashSet<&str> = self.input_columns().into_iter().collect();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(PipelineError::ConfigError(format!(
                    "column '{}' is assigned to more than one branch",
                    column
                )));
            }
        }

        self.branches.push(Branch {
            name,
            column_type,
            columns,
            pipeline,
        });
        Ok(self)
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// Branch by name
    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// All input columns, in branch order
    pub fn input_columns(&self) -> Vec<&str> {
        self.branches
            .iter()
            .flat_map(|b| b.columns.iter().map(|c| c.as_str()))
            .collect()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit every branch on its columns of `df`. A dispatcher is fit once.
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fit_transform(df)?;
        Ok(self)
    }

    /// Fit every branch and return the concatenated training matrix
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        if self.is_fitted {
            return Err(PipelineError::AlreadyFitted("column dispatcher".to_string()));
        }
        if self.branches.is_empty() {
            return Err(PipelineError::ConfigError("column dispatcher has no branches".to_string()));
        }

        // Validate every branch's input before fitting any of them
        let inputs = self
            .branches
            .iter()
            .map(|b| b.select_input(df))
            .collect::<Result<Vec<_>>>()?;

        // branches are replaced only when all of them fit
        let mut branches = self.branches.clone();
        let mut outputs = Vec::with_capacity(inputs.len());
        for (branch, input) in branches.iter_mut().zip(inputs.iter()) {
            let output = branch.pipeline.fit_transform(input)?;
            debug!(branch = %branch.name, features = output.width(), "fitted branch");
            outputs.push(output);
        }

        self.branches = branches;
        self.is_fitted = true;
        let matrix = stack_columns(&outputs, df.height())?;
        info!(
            rows = matrix.nrows(),
            features = matrix.ncols(),
            "fitted column dispatcher"
        );
        Ok(matrix)
    }

    /// Transform `df` with the fitted branches. Never updates fitted state.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let outputs = self
            .branches
            .iter()
            .map(|b| b.pipeline.transform(&b.select_input(df)?))
            .collect::<Result<Vec<_>>>()?;

        stack_columns(&outputs, df.height())
    }

    /// Output feature names as `{branch}__{column}`
    pub fn feature_names_out(&self) -> Result<Vec<String>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        Ok(self
            .branches
            .iter()
            .flat_map(|b| {
                b.pipeline
                    .output_columns()
                    .iter()
                    .map(move |c| format!("{}__{}", b.name, c))
            })
            .collect())
    }

    /// Width of the transformed matrix
    pub fn n_features_out(&self) -> Result<usize> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        Ok(self
            .branches
            .iter()
            .map(|b| b.pipeline.output_columns().len())
            .sum())
    }

    /// Save the fitted dispatcher to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        save_object(path, self)
    }

    /// Load a dispatcher from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_object(path)
    }
}

/// Concatenate the branch outputs column-wise into a dense matrix; nulls become NaN
fn stack_columns(frames: &[DataFrame], n_rows: usize) -> Result<Array2<f64>> {
    let n_cols: usize = frames.iter().map(|f| f.width()).sum();
    let mut matrix = Array2::<f64>::zeros((n_rows, n_cols));

    let mut offset = 0;
    for frame in frames {
        for (j, column) in frame.get_columns().iter().enumerate() {
            let casted = column.as_materialized_series().cast(&DataType::Float64)?;
            let ca = casted
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;

            if ca.len() != n_rows {
                return Err(PipelineError::ShapeError {
                    expected: format!("{} rows", n_rows),
                    actual: format!("{} rows in column '{}'", ca.len(), column.name()),
                });
            }

            for (i, value) in ca.into_iter().enumerate() {
                matrix[[i, offset + j]] = value.unwrap_or(f64::NAN);
            }
        }
        offset += frame.width();
    }

    Ok(matrix)
}

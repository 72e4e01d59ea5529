//! Missing value imputation strategies

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with mean (numeric only)
    Mean,
    /// Replace with median (numeric only)
    Median,
    /// Replace with mode / most frequent value
    MostFrequent,
    /// Replace with a constant value
    Constant(f64),
    /// Replace with a constant string (categorical)
    ConstantString(String),
}

/// Value learned for one column during fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: Vec<(String, ImputeValue)>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut fill_values = Vec::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(col_name, column.as_materialized_series())?;
            fill_values.push((col_name.to_string(), fill_value));
        }

        self.fill_values = fill_values;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.clone()))?;
            let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
            result = result
                .with_column(filled)
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fill value learned for a column
    pub fn fill_value(&self, column: &str) -> Option<&ImputeValue> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Check if dtype is numeric
    fn is_numeric_dtype(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    /// Most frequent numeric value; ties go to the smallest value
    fn compute_mode_numeric(ca: &Float64Chunked) -> Option<f64> {
        let mut counts: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
        for val in ca.into_iter().flatten() {
            // -0.0 and 0.0 count as one value
            let val = if val == 0.0 { 0.0 } else { val };
            counts.entry(val.to_bits()).or_insert((val, 0)).1 += 1;
        }

        counts
            .into_values()
            .max_by(|(a, count_a), (b, count_b)| {
                count_a
                    .cmp(count_b)
                    .then_with(|| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal))
            })
            .map(|(val, _)| val)
    }

    /// Most frequent string; ties go to the lexicographically smallest value
    fn compute_mode_string(ca: &StringChunked) -> Option<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for val in ca.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }

        // BTreeMap iterates in ascending order, so keep the first maximum seen
        let mut best: Option<(&str, usize)> = None;
        for (val, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((val, count));
            }
        }
        best.map(|(val, _)| val.to_string())
    }

    fn numeric_values(series: &Series) -> Result<Float64Chunked> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        Ok(ca.clone())
    }

    fn compute_fill_value(&self, col_name: &str, series: &Series) -> Result<ImputeValue> {
        let no_values = || {
            PipelineError::InvalidInput(format!(
                "column '{}' has no observed values to impute from",
                col_name
            ))
        };

        match &self.strategy {
            ImputeStrategy::Mean => {
                let mean = Self::numeric_values(series)?.mean().ok_or_else(no_values)?;
                Ok(ImputeValue::Numeric(mean))
            }
            ImputeStrategy::Median => {
                let median = Self::numeric_values(series)?.median().ok_or_else(no_values)?;
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                if Self::is_numeric_dtype(series.dtype()) {
                    let mode = Self::compute_mode_numeric(&Self::numeric_values(series)?)
                        .ok_or_else(no_values)?;
                    Ok(ImputeValue::Numeric(mode))
                } else {
                    let ca = series
                        .str()
                        .map_err(|e| PipelineError::DataError(e.to_string()))?;
                    let mode = Self::compute_mode_string(ca).ok_or_else(no_values)?;
                    Ok(ImputeValue::String(mode))
                }
            }
            ImputeStrategy::Constant(val) => Ok(ImputeValue::Numeric(*val)),
            ImputeStrategy::ConstantString(val) => Ok(ImputeValue::String(val.clone())),
        }
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let ca = Self::numeric_values(series)?;

                let filled: Float64Chunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let ca = series
                    .str()
                    .map_err(|e| PipelineError::DataError(e.to_string()))?;

                let filled: StringChunked = ca
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();

                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

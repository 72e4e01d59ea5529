//! Feature scaling implementations

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling: (x - mean) / std, centering is optional
    Standard { with_mean: bool },
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Max absolute scaling: x / max(|x|)
    MaxAbs,
}

/// Parameters for a fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean or min; 0 when not centering
    pub center: f64,
    /// std, range or max abs; never 0
    pub scale: f64,
}

/// Feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Zero mean, unit variance
    pub fn standard() -> Self {
        Self::new(ScalerType::Standard { with_mean: true })
    }

    /// Unit variance only, for sparse non-negative inputs such as one-hot columns
    pub fn standard_without_mean() -> Self {
        Self::new(ScalerType::Standard { with_mean: false })
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut params = Vec::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let series = column.as_materialized_series();

            params.push((col_name.to_string(), self.compute_params(series)?));
        }

        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Builds all replacement columns first, then applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| PipelineError::FeatureNotFound(col_name.clone()))?;
                Self::scale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result = result
                .with_column(scaled)
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

    /// Inverse transform the data.
    /// Same batch-apply pattern as transform.
    pub fn inverse_transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| PipelineError::FeatureNotFound(col_name.clone()))?;
                Self::unscale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for unscaled in replacements {
            result = result
                .with_column(unscaled)
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    /// Parameters learned for a column
    pub fn params(&self, column: &str) -> Option<ScalerParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| *p)
    }

    fn values(series: &Series) -> Result<Vec<f64>> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        Ok(ca.into_iter().flatten().collect())
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let values = Self::values(series)?;
        if values.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "column '{}' has no observed values to scale",
                series.name()
            )));
        }
        let n = values.len() as f64;

        let params = match self.scaler_type {
            ScalerType::Standard { with_mean } => {
                let mean = values.iter().sum::<f64>() / n;
                // population variance (ddof = 0)
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                ScalerParams {
                    center: if with_mean { mean } else { 0.0 },
                    scale: non_zero(std),
                }
            }
            ScalerType::MinMax => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                ScalerParams {
                    center: min,
                    scale: non_zero(max - min),
                }
            }
            ScalerType::MaxAbs => {
                let max_abs = values.iter().map(|x| x.abs()).fold(0.0f64, f64::max);
                ScalerParams {
                    center: 0.0,
                    scale: non_zero(max_abs),
                }
            }
        };

        Ok(params)
    }

    fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| PipelineError::DataError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }

    fn unscale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let ca = series
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        let unscaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| v * params.scale + params.center))
            .collect();

        Ok(unscaled.with_name(series.name().clone()).into_series())
    }
}

fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 || !scale.is_finite() {
        1.0
    } else {
        scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::standard();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        let mean: f64 = col.mean().unwrap();
        assert!(mean.abs() < 1e-10);

        // population std of 1..5 is sqrt(2)
        let params = scaler.params("a").unwrap();
        assert!((params.scale - 2.0f64.sqrt()).abs() < 1e-12);
        assert!((col.get(4).unwrap() - 2.0 / 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_standard_scaler_without_mean() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[0.0, 1.0, 0.0, 1.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::standard_without_mean();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let params = scaler.params("a").unwrap();
        assert_eq!(params.center, 0.0);
        assert!((params.scale - 0.5).abs() < 1e-12);

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(0), Some(0.0));
        assert_eq!(col.get(1), Some(2.0));
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let df = df!("a" => &[5.0, 5.0, 5.0]).unwrap();

        let mut scaler = Scaler::standard();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        assert_eq!(scaler.params("a").unwrap().scale, 1.0);
        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.into_iter().all(|v| v == Some(0.0)));
    }

    #[test]
    fn test_minmax_scaler() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_maxabs_scaler() {
        let df = df!("a" => &[-4.0, 2.0, 1.0]).unwrap();

        let mut scaler = Scaler::new(ScalerType::MaxAbs);
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(0), Some(-1.0));
        assert_eq!(col.get(1), Some(0.5));
    }

    #[test]
    fn test_nulls_are_preserved() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1.0), None, Some(3.0)]),
        ])
        .unwrap();

        let mut scaler = Scaler::standard();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        assert_eq!(scaler.params("a").unwrap().center, 2.0);
        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), None);
    }

    #[test]
    fn test_inverse_transform() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0, 4.0, 5.0]).into(),
        ])
        .unwrap();

        let mut scaler = Scaler::standard();
        let scaled = scaler.fit_transform(&df, &["a"]).unwrap();
        let unscaled = scaler.inverse_transform(&scaled).unwrap();

        let original = df.column("a").unwrap().f64().unwrap();
        let restored = unscaled.column("a").unwrap().f64().unwrap();

        for (o, r) in original.into_iter().zip(restored.into_iter()) {
            assert!((o.unwrap() - r.unwrap()).abs() < 1e-10);
        }
    }
}

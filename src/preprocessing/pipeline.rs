//! Linear chain of named transformation steps

use crate::error::{PipelineError, Result};
use super::{
    encoder::Encoder,
    imputer::Imputer,
    scaler::Scaler,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One stateful stage of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineStep {
    Impute(Imputer),
    Encode(Encoder),
    Scale(Scaler),
}

impl PipelineStep {
    fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<()> {
        match self {
            PipelineStep::Impute(imputer) => imputer.fit(df, columns).map(|_| ()),
            PipelineStep::Encode(encoder) => encoder.fit(df, columns).map(|_| ()),
            PipelineStep::Scale(scaler) => scaler.fit(df, columns).map(|_| ()),
        }
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            PipelineStep::Impute(imputer) => imputer.transform(df),
            PipelineStep::Encode(encoder) => encoder.transform(df),
            PipelineStep::Scale(scaler) => scaler.transform(df),
        }
    }
}

/// Ordered list of named steps, each fit on the output of the one before
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<(String, PipelineStep)>,
    output_columns: Vec<String>,
    is_fitted: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named step
    pub fn with_step(mut self, name: impl Into<String>, step: PipelineStep) -> Self {
        self.steps.push((name.into(), step));
        self
    }

    pub fn steps(&self) -> &[(String, PipelineStep)] {
        &self.steps
    }

    /// Step by name
    pub fn step(&self, name: &str) -> Option<&PipelineStep> {
        self.steps.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Column names produced by the last step, known after fit
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Fit every step in order and return the transformed frame.
    /// All columns of `df` are treated as pipeline input.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        if self.is_fitted {
            return Err(PipelineError::AlreadyFitted("pipeline".to_string()));
        }
        if self.steps.is_empty() {
            return Err(PipelineError::ConfigError("pipeline has no steps".to_string()));
        }

        // fitted steps are committed only once every step has succeeded
        let mut steps = self.steps.clone();
        let mut current = df.clone();
        for (name, step) in &mut steps {
            let names = column_names(&current);
            let cols: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
            step.fit(&current, &cols)?;
            current = step.transform(&current)?;
            debug!(step = %name, width = current.width(), "fitted pipeline step");
        }

        self.steps = steps;
        self.output_columns = column_names(&current);
        self.is_fitted = true;
        Ok(current)
    }

    /// Fit every step in order
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fit_transform(df)?;
        Ok(self)
    }

    /// Run the fitted steps in order
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut current = df.clone();
        for (_, step) in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

pub(crate) fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

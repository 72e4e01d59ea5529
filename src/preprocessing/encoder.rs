//! One-hot encoding of categorical columns

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the encoder treats values not seen during fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    /// Fail the transform
    #[default]
    Error,
    /// Encode as all zeros
    Ignore,
}

/// Vocabulary learned for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnVocabulary {
    column: String,
    /// Sorted ascending
    categories: Vec<String>,
}

impl ColumnVocabulary {
    fn output_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |category| format!("{}_{}", self.column, category))
    }
}

/// One-hot encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    handle_unknown: UnknownCategory,
    vocabularies: Vec<ColumnVocabulary>,
    is_fitted: bool,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(UnknownCategory::default())
    }
}

impl Encoder {
    /// Create a new encoder
    pub fn new(handle_unknown: UnknownCategory) -> Self {
        Self {
            handle_unknown,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn handle_unknown(&self) -> UnknownCategory {
        self.handle_unknown
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut vocabularies = Vec::with_capacity(columns.len());
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let ca = column
                .str()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;

            let categories: BTreeSet<&str> = ca.into_iter().flatten().collect();
            if categories.is_empty() {
                return Err(PipelineError::InvalidInput(format!(
                    "column '{}' has no categories to encode",
                    col_name
                )));
            }

            vocabularies.push(ColumnVocabulary {
                column: col_name.to_string(),
                categories: categories.into_iter().map(str::to_string).collect(),
            });
        }

        self.vocabularies = vocabularies;
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data.
    /// Each encoded column is replaced, in place, by its indicator columns.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        for vocab in &self.vocabularies {
            if df.column(&vocab.column).is_err() {
                return Err(PipelineError::FeatureNotFound(vocab.column.clone()));
            }
        }

        let mut columns: Vec<Column> = Vec::new();
        for column in df.get_columns() {
            let name = column.name().to_string();
            match self.vocabularies.iter().find(|v| v.column == name) {
                Some(vocab) => columns.extend(self.encode_column(column, vocab)?),
                None => columns.push(column.clone()),
            }
        }

        DataFrame::new(columns).map_err(|e| PipelineError::DataError(e.to_string()))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Categories learned for a column, in output order
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }

    /// Names of the indicator columns, in output order
    pub fn output_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| v.output_names())
            .collect()
    }

    fn encode_column(&self, column: &Column, vocab: &ColumnVocabulary) -> Result<Vec<Column>> {
        let ca = column
            .str()
            .map_err(|e| PipelineError::DataError(e.to_string()))?;

        // Category index per row, None for ignored unknowns
        let mut indices: Vec<Option<usize>> = Vec::with_capacity(ca.len());
        for value in ca.into_iter() {
            let value = value.ok_or_else(|| {
                PipelineError::InvalidInput(format!(
                    "missing value in column '{}' reached the encoder",
                    vocab.column
                ))
            })?;
            match vocab.categories.binary_search_by(|c| c.as_str().cmp(value)) {
                Ok(idx) => indices.push(Some(idx)),
                Err(_) => match self.handle_unknown {
                    UnknownCategory::Error => {
                        return Err(PipelineError::UnknownCategory {
                            column: vocab.column.clone(),
                            value: value.to_string(),
                        })
                    }
                    UnknownCategory::Ignore => indices.push(None),
                },
            }
        }

        let encoded = vocab
            .output_names()
            .enumerate()
            .map(|(cat_idx, name)| {
                let values: Vec<f64> = indices
                    .iter()
                    .map(|idx| if *idx == Some(cat_idx) { 1.0 } else { 0.0 })
                    .collect();
                Column::new(name.into(), values)
            })
            .collect();

        Ok(encoded)
    }
}

//! Data preprocessing module
//!
//! Provides the stateful transformers used to turn raw tabular data into a
//! numeric feature matrix:
//! - Missing value imputation
//! - Feature scaling (standard, min-max, max-abs)
//! - One-hot encoding of categorical columns
//! - Linear pipelines of named steps
//! - Column-wise dispatch of column groups to pipelines

mod imputer;
mod scaler;
mod encoder;
mod pipeline;
mod column_dispatcher;

pub use imputer::{Imputer, ImputeStrategy, ImputeValue};
pub use scaler::{Scaler, ScalerType, ScalerParams};
pub use encoder::{Encoder, UnknownCategory};
pub use pipeline::{Pipeline, PipelineStep};
pub use column_dispatcher::{Branch, ColumnDispatcher};

use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

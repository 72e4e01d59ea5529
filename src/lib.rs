//! Student Performance - preprocessing pipeline for tabular score data
//!
//! Reads the student performance dataset, builds a column-wise
//! preprocessing pipeline (imputation, scaling, one-hot encoding), fits it
//! on the training split and persists it for the model-training step.
//!
//! # Modules
//!
//! - [`preprocessing`] - Imputer, scaler, encoder, pipelines and the column dispatcher
//! - [`transformation`] - Train/test transformation run
//! - [`config`] - Column groups, strategies and artifact location
//! - [`utils`] - CSV loading, matrix export and object persistence
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod config;
pub mod preprocessing;
pub mod transformation;
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PipelineError, Result, StepContext};
    pub use crate::config::TransformationConfig;
    pub use crate::preprocessing::{
        ColumnDispatcher, ColumnType, Encoder, ImputeStrategy, Imputer, Pipeline, PipelineStep,
        Scaler, ScalerType, UnknownCategory,
    };
    pub use crate::transformation::{DataTransformation, TransformationOutput};
    pub use crate::utils::{DataLoader, DataSaver};
}

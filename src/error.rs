//! Error types for the preprocessing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Already fitted: {0} must not be refit")]
    AlreadyFitted(String),

    #[error("Unknown category {value:?} in column {column}")]
    UnknownCategory { column: String, value: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure at a public boundary, tagged with the step that was running
    #[error("Transformation failed while {step}: {source}")]
    Transformation {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Step name for boundary errors
    pub fn step(&self) -> Option<&str> {
        match self {
            PipelineError::Transformation { step, .. } => Some(step.as_str()),
            _ => None,
        }
    }

    /// Innermost error, looking through any `Transformation` wrappers
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Transformation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

/// Attach the running step to an error at a public boundary
pub trait StepContext<T> {
    fn during(self, step: &str) -> Result<T>;
}

impl<T> StepContext<T> for Result<T> {
    fn during(self, step: &str) -> Result<T> {
        self.map_err(|e| PipelineError::Transformation {
            step: step.to_string(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::IoError(_)));
    }

    #[test]
    fn test_step_context_wraps_cause() {
        let res: Result<()> = Err(PipelineError::FeatureNotFound("gender".to_string()));
        let err = res.during("fitting preprocessor").unwrap_err();

        assert_eq!(err.step(), Some("fitting preprocessor"));
        assert!(matches!(err.root_cause(), PipelineError::FeatureNotFound(c) if c == "gender"));
        assert_eq!(
            err.to_string(),
            "Transformation failed while fitting preprocessor: Feature not found: gender"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let res: Result<()> = Err(PipelineError::ModelNotFitted);
        let err = res.during("transforming test data").unwrap_err();
        let source = err.source().expect("wrapped error has a source");
        assert_eq!(source.to_string(), "Model not fitted");
    }
}

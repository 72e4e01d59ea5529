//! Data loading and saving utilities

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

/// CSV loader
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer column types
    infer_schema_length: usize,
    /// Field delimiter
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
            separator: b',',
        }
    }

    /// Set the number of rows used for type inference
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n;
        self
    }

    /// Set the field delimiter
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file with a header row. Empty cells load as nulls.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))?;

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataError(format!("{}: {}", path.display(), e)))
    }
}

/// Per-column overview of a loaded frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
    pub unique_count: usize,
}

/// Summarize every column: dtype, missing cells, distinct values
pub fn summarize_columns(df: &DataFrame) -> Vec<ColumnSummary> {
    df.get_columns()
        .iter()
        .map(|col| ColumnSummary {
            name: col.name().to_string(),
            dtype: format!("{:?}", col.dtype()),
            null_count: col.null_count(),
            unique_count: col.n_unique().unwrap_or(0),
        })
        .collect()
}

/// Save DataFrames and matrices to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;

        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| PipelineError::DataError(e.to_string()))
    }

    /// Save a matrix to CSV with one header name per column
    pub fn save_matrix_csv(
        matrix: &Array2<f64>,
        names: &[String],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut df = matrix_to_frame(matrix, names)?;
        Self::save_csv(&mut df, path)
    }
}

/// Wrap a matrix in a DataFrame with the given column names
pub fn matrix_to_frame(matrix: &Array2<f64>, names: &[String]) -> Result<DataFrame> {
    if names.len() != matrix.ncols() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} column names", matrix.ncols()),
            actual: names.len().to_string(),
        });
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(matrix.columns())
        .map(|(name, values)| Column::new(name.as_str().into(), values.to_vec()))
        .collect();

    DataFrame::new(columns).map_err(|e| PipelineError::DataError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "gender,lunch,math_score").unwrap();
        writeln!(file, "female,standard,72").unwrap();
        writeln!(file, ",free/reduced,69").unwrap();
        writeln!(file, "male,standard,").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let df = DataLoader::new().load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("gender").unwrap().null_count(), 1);
        assert_eq!(df.column("math_score").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = DataLoader::new().load_csv("/nonexistent/train.csv");
        match result {
            Err(PipelineError::IoError(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
                assert!(e.to_string().contains("/nonexistent/train.csv"));
            }
            other => panic!("expected IoError, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn test_load_semicolon_separated() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a;b").unwrap();
        writeln!(file, "1;x").unwrap();

        let df = DataLoader::new().with_separator(b';').load_csv(file.path()).unwrap();
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_summarize_columns() {
        let file = create_test_csv();
        let df = DataLoader::new().load_csv(file.path()).unwrap();
        let summary = summarize_columns(&df);

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].name, "gender");
        assert_eq!(summary[0].null_count, 1);
        assert_eq!(summary[1].null_count, 0);
        assert_eq!(summary[1].unique_count, 2);
    }

    #[test]
    fn test_save_matrix_csv() {
        let matrix = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let names = vec!["a".to_string(), "b".to_string()];

        let file = NamedTempFile::new().unwrap();
        DataSaver::save_matrix_csv(&matrix, &names, file.path()).unwrap();

        let loaded = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);
        let b = loaded.column("b").unwrap().f64().unwrap();
        assert_eq!(b.get(2), Some(6.0));
    }

    #[test]
    fn test_matrix_name_mismatch() {
        let matrix = array![[1.0, 2.0]];
        let result = matrix_to_frame(&matrix, &["a".to_string()]);
        assert!(matches!(result, Err(PipelineError::ShapeError { .. })));
    }
}

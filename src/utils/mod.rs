//! Utility functions and types

pub mod data_loader;

pub use data_loader::{matrix_to_frame, summarize_columns, ColumnSummary, DataLoader, DataSaver};

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use tracing::debug;

/// Serialize `obj` as JSON to `path`, creating parent directories as needed
pub fn save_object<T: Serialize + ?Sized>(path: impl AsRef<Path>, obj: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(obj)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "saved object");
    Ok(())
}

/// Load an object previously written by [`save_object`]
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let json = std::fs::read_to_string(path.as_ref())?;
    let obj: T = serde_json::from_str(&json)?;
    Ok(obj)
}

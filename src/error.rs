use std::path::PathBuf;

use thiserror::Error;

/// Failures of the EVA pipeline stages.
#[derive(Debug, Error)]
pub enum EvaError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not load data from {path}: {message}")]
    DataLoad { path: PathBuf, message: String },

    #[error("row {row}: column '{column}' value {value} is not numeric")]
    TypeConversion {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: duration '{value}' is not in H:MM format")]
    Format { row: usize, value: String },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not render {path}: {message}")]
    Render { path: PathBuf, message: String },
}

impl EvaError {
    /// True for the load family (`Read`, `Json`, `DataLoad`).
    pub fn is_load(&self) -> bool {
        matches!(
            self,
            EvaError::Read { .. } | EvaError::Json { .. } | EvaError::DataLoad { .. }
        )
    }

    pub(crate) fn write_io(path: PathBuf, e: std::io::Error) -> EvaError {
        EvaError::Write {
            path,
            source: csv::Error::from(e),
        }
    }
}

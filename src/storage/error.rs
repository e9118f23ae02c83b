use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while writing or reading relations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Relation '{relation}' has not been written to {path:?}")]
    MissingRelation { relation: &'static str, path: PathBuf },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Relation '{relation}' has an unexpected layout: {reason}")]
    Layout {
        relation: &'static str,
        reason: String,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StorageError::Io { path, source }
    }

    pub(crate) fn layout(relation: &'static str, reason: impl Into<String>) -> Self {
        StorageError::Layout {
            relation,
            reason: reason.into(),
        }
    }
}

//! Error types for survey loading.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

/// Fatal failures of a load call. Never accompanied by a partial dataset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The declared input resource does not exist.
    #[error("survey source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The resource exists but could not be read.
    #[error("failed to read survey source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input is not a well-formed delimited table.
    #[error("malformed survey table: {reason}")]
    StructuralParse { reason: String },

    /// A required column is absent from the header row.
    #[error("required column '{column}' not found in survey header")]
    SchemaMismatch { column: String },

    /// Projection into a DataFrame failed.
    #[error("DataFrame operation failed: {0}")]
    DataFrame(#[from] PolarsError),
}

/// Coarse classification of [`LoadError`] for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadErrorKind {
    SourceNotFound,
    SourceUnreadable,
    StructuralParse,
    SchemaMismatch,
    Internal,
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            Self::SourceNotFound { .. } => LoadErrorKind::SourceNotFound,
            Self::SourceRead { .. } => LoadErrorKind::SourceUnreadable,
            Self::StructuralParse { .. } => LoadErrorKind::StructuralParse,
            Self::SchemaMismatch { .. } => LoadErrorKind::SchemaMismatch,
            Self::DataFrame(_) => LoadErrorKind::Internal,
        }
    }

    /// Short actionable hint for the presentation layer.
    pub fn hint(&self) -> &'static str {
        match self.kind() {
            LoadErrorKind::SourceNotFound => "check that the survey file exists at the given path",
            LoadErrorKind::SourceUnreadable => "check file permissions",
            LoadErrorKind::StructuralParse => {
                "the file is not a comma or tab delimited UTF-8 table"
            }
            LoadErrorKind::SchemaMismatch => "the file does not have the expected survey columns",
            LoadErrorKind::Internal => "unexpected internal error",
        }
    }
}

/// A row dropped because its field count did not match the header.
///
/// Non-fatal: collected in the load diagnostics while loading continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSkipped {
    /// 1-based line number in the source, header included.
    pub line: u64,
    pub expected: usize,
    pub found: usize,
}

/// Result type for load operations.
pub type Result<T> = std::result::Result<T, LoadError>;

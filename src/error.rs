// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::record::Source;

/// Why a size fragment could not become a dimension triple.
///
/// Never fatal for a table: the row carrying the fragment is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    #[error("no diameter marker in {0:?}")]
    NoDiameterMarker(String),
    #[error("unreadable width {0:?}")]
    InvalidWidth(String),
    #[error("unreadable diameter {0:?}")]
    InvalidDiameter(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The join key cannot be built for this source at all.
    #[error("{table} table is missing required column `{column}`")]
    MissingColumn { table: Source, column: String },

    #[error("{0} table has no header row")]
    MissingHeaders(Source),

    #[error("history file is missing column `{0}`")]
    HistoryColumn(String),

    #[error("invalid rewrite rule {pattern:?}: {reason}")]
    InvalidRule { pattern: String, reason: String },

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0} worker panicked")]
    SourceThread(Source),
}

impl CatalogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io { path: path.into(), source }
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

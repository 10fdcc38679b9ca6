// error.rs - Error taxonomy for the evaluation pipeline

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QpcrError {
    /// Malformed or missing required field in a primer3 block or table row
    #[error("parse error in {context}: {msg}")]
    Parse { context: String, msg: String },

    /// A sequence or catalog id that the catalog build never registered
    #[error("catalog miss: '{key}' is not registered in the primer catalog")]
    CatalogMiss { key: String },

    #[error("consensus input length mismatch: instance {index} has length {found}, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("no IUPAC code for base combination '{combination}' at column {column}")]
    AmbiguityLookupFailure { combination: String, column: usize },

    #[error("no sequence instances supplied for consensus")]
    NoInstances,

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("json error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl QpcrError {
    pub fn parse(context: impl Into<String>, msg: impl Into<String>) -> Self {
        QpcrError::Parse {
            context: context.into(),
            msg: msg.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: io::Error) -> Self {
        QpcrError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<std::path::Path>, source: csv::Error) -> Self {
        QpcrError::Csv {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        QpcrError::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QpcrError>;

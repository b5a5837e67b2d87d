//! Error types shared across the crate.
//!
//! Annotation parsing itself is total and has no error path: any comment
//! text produces some map. Errors here cover declaration resolution, the
//! source scanner, and the service registry.

use std::path::PathBuf;
use thiserror::Error;

/// A declaration reference could not be resolved to exactly one
/// class or method.
///
/// Resolution failures are plain data, never panics: the public query API
/// returns them so callers can tell "no such declaration" apart from
/// "declaration exists but carries no annotations" (an empty map).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("ambiguous reference `{reference}` matches {count} classes")]
    AmbiguousReference { reference: String, count: usize },

    #[error("malformed method reference `{0}`")]
    MalformedReference(String),
}

/// Service registry lookup failures.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("service `{0}` is not registered")]
    Unregistered(String),

    #[error("service `{name}` is not of the requested type")]
    TypeMismatch { name: String },
}

/// Unified error type for scanner and CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, Error>;

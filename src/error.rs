//! Error types for metastrip
//!
//! Uses `thiserror` for library errors; the CLI wraps these in `anyhow`.
//!
//! Package-boundary problems (no manifest, unreadable manifest, missing
//! `name`) are deliberately NOT errors: resolution fails open to inclusion
//! and the file is left alone instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for metastrip operations
pub type MetastripResult<T> = Result<T, MetastripError>;

/// Main error type for metastrip operations
#[derive(Error, Debug)]
pub enum MetastripError {
    /// Source directory does not exist
    #[error("source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Invalid metastrip.toml
    #[error("invalid config in {}: {message}", file.display())]
    InvalidConfig { file: PathBuf, message: String },

    /// Invalid --mode / METASTRIP_MODE value
    #[error("invalid build mode '{value}' - expected 'development', 'production', or 'unspecified'")]
    InvalidMode { value: String },

    /// Invalid exclude glob in config or CLI
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidExclude { pattern: String, message: String },

    /// Computed output path escapes the output root
    #[error("output path '{}' escapes output root '{}'", path.display(), root.display())]
    PathEscape { path: PathBuf, root: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (reporting only - manifests never error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

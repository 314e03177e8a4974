//! Error types and handling for the wn-editor library.
//!
//! This module defines the main error type `EditorError` and a convenience
//! `Result` type alias for use throughout the library.

use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, EditorError>;

/// All error conditions surfaced by the editor API.
///
/// Each variant is a distinct, testable failure kind; transactions are
/// rolled back before any of these escape a public operation.
#[derive(Error, Debug)]
pub enum EditorError {
    /// I/O operations failed (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite storage operation failed.
    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The store's schema version token does not match this build.
    #[error("incompatible schema version: {found} (expected {expected})")]
    SchemaMismatch {
        found: String,
        expected: &'static str,
    },

    /// Invalid data (bad POS, self-loop, invalid ID prefix, short ILI
    /// definition, bad partition in a split).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity is absent from the store.
    #[error("{kind} not found: {id:?}")]
    NotFound { kind: &'static str, id: String },

    /// Entity with the same identity already exists.
    #[error("duplicate entity: {0}")]
    Duplicate(String),

    /// Relation constraint violation (e.g. delete with dependents and no
    /// cascade opt-in).
    #[error("relation error: {0}")]
    Relation(String),

    /// Conflicting state (e.g. both synsets carry ILI bindings in a merge).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Failed to import data (malformed WN-LMF, upstream resource error).
    #[error("import failed: {0}")]
    Import(String),

    /// Post-export validation of the written document failed.
    #[error("export failed: {0}")]
    Export(String),

    /// Positional access to a definition or example was out of range.
    #[error("{what} index {index} out of range (have {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl EditorError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        EditorError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

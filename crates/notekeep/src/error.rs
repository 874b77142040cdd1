//! Error types for notekeep.
//!
//! This module defines all error types used throughout the notekeep crate,
//! for both the archive client and the ingest endpoint.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for notekeep operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A required note field was missing or blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    // === Archive Errors ===
    /// The object store has no object with this name.
    #[error("object not found: {name}")]
    ObjectNotFound {
        /// Name of the object.
        name: String,
    },

    /// The note to operate on does not exist.
    #[error("note not found: {name}")]
    NoteNotFound {
        /// Object name of the note.
        name: String,
    },

    /// An object name cannot be used by the store.
    #[error("invalid object name '{name}': {reason}")]
    InvalidObjectName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Downloaded content does not match the hash recorded on save.
    #[error("content of '{name}' does not match its recorded hash")]
    ContentMismatch {
        /// Object name of the note.
        name: String,
    },

    // === Document Store Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// A document with this id already exists in the collection.
    #[error("document '{id}' already exists in {collection}")]
    DocumentConflict {
        /// Collection the insert targeted.
        collection: String,
        /// Conflicting document id.
        id: String,
    },

    /// The HTTP request to a remote store failed.
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote store answered with a non-success status.
    #[error("store responded with {status}: {body}")]
    StoreResponse {
        /// HTTP status code.
        status: u16,
        /// Response body as returned by the store.
        body: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for notekeep operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid object name error.
    #[must_use]
    pub fn invalid_object_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidObjectName {
            name: name.into(),
            reason,
        }
    }

    /// Check if this error was caused by bad input rather than a store failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this error means the requested note or object is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ObjectNotFound { .. } | Self::NoteNotFound { .. }
        )
    }
}

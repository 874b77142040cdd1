//! Storage layer for the ingest endpoint.
//!
//! This module provides `SQLite`-based document storage: JSON documents
//! grouped by logical database and collection, one row per document.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::note::NoteRecord;

/// Document storage engine.
///
/// Documents are addressed by `(database, collection, id)`; inserting an
/// id that already exists in the collection fails.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening document database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Document database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a note document into a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentConflict`] if the id is taken, or a query
    /// error if the insert fails.
    pub fn insert(&self, database: &str, collection: &str, record: &NoteRecord) -> Result<()> {
        let body = serde_json::to_string(record)?;
        // Fixed-width timestamps so text ordering matches time ordering
        let created_at = record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true);

        let result = self.conn.execute(
            r"
            INSERT INTO documents (database, collection, id, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![database, collection, record.id, body, created_at],
        );

        match result {
            Ok(_) => {
                debug!("Inserted document {} into {}/{}", record.id, database, collection);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::DocumentConflict {
                    collection: format!("{database}/{collection}"),
                    id: record.id.clone(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Get a document by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored body is not a note.
    pub fn get(&self, database: &str, collection: &str, id: &str) -> Result<Option<NoteRecord>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
                params![database, collection, id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(Error::from))
            .transpose()
    }

    /// Count documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, database: &str, collection: &str) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE database = ?1 AND collection = ?2",
            params![database, collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB: &str = "notes";
    const COLL: &str = "entries";

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
        assert_eq!(storage.count(DB, COLL).unwrap(), 0);
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("documents.db");

        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();
        let record = NoteRecord::new("Title", "Body");

        storage.insert(DB, COLL, &record).unwrap();

        let fetched = storage.get(DB, COLL, &record.id).unwrap().unwrap();
        assert_eq!(fetched, record);
        assert_eq!(storage.count(DB, COLL).unwrap(), 1);
    }

    #[test]
    fn test_insert_conflict() {
        let storage = create_test_storage();
        let record = NoteRecord::new("Title", "Body");

        storage.insert(DB, COLL, &record).unwrap();
        let err = storage.insert(DB, COLL, &record).unwrap_err();

        assert!(matches!(err, Error::DocumentConflict { ref id, .. } if *id == record.id));
        assert_eq!(storage.count(DB, COLL).unwrap(), 1);
    }

    #[test]
    fn test_same_id_in_other_collection() {
        let storage = create_test_storage();
        let record = NoteRecord::new("Title", "Body");

        storage.insert(DB, COLL, &record).unwrap();
        storage.insert(DB, "archive", &record).unwrap();

        assert_eq!(storage.count(DB, COLL).unwrap(), 1);
        assert_eq!(storage.count(DB, "archive").unwrap(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        assert!(storage.get(DB, COLL, "missing").unwrap().is_none());
    }
}

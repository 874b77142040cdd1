//! `SQLite`-backed document store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{DocumentStore, COLLECTION_ID, DATABASE_ID};
use crate::error::{Error, Result};
use crate::note::NoteRecord;
use crate::storage::Storage;

/// Document store writing into a local [`Storage`] database.
///
/// Queries run on the blocking thread pool; the connection is shared
/// behind a mutex.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    storage: Arc<Mutex<Storage>>,
    database: String,
    collection: String,
}

impl SqliteDocumentStore {
    /// Open the store at `path` using the default database and collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_storage(Storage::open(path)?))
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_storage(Storage::open_in_memory()?))
    }

    fn from_storage(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            database: DATABASE_ID.to_string(),
            collection: COLLECTION_ID.to_string(),
        }
    }

    /// Fetch a stored note by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_item(&self, id: &str) -> Result<Option<NoteRecord>> {
        let id = id.to_string();
        self.with_storage(move |s, db, coll| s.get(db, coll, &id))
            .await
    }

    /// Count stored notes.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        self.with_storage(|s, db, coll| s.count(db, coll)).await
    }

    async fn with_storage<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage, &str, &str) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let database = self.database.clone();
        let collection = self.collection.clone();

        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::internal("document storage lock poisoned"))?;
            f(&*guard, &database, &collection)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create_item(&self, record: &NoteRecord) -> Result<()> {
        let record = record.clone();
        self.with_storage(move |s, db, coll| s.insert(db, coll, &record))
            .await
    }
}

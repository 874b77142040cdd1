//! Note ingest endpoint.
//!
//! A single HTTP handler, `POST /api/addNote`, validates a title/content
//! payload and inserts it as a document into a [`DocumentStore`].

mod http;
mod routes;
mod server;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, DocumentStoreTarget};
use crate::error::Result;
use crate::note::NoteRecord;

pub use http::HttpDocumentStore;
pub use routes::{router, AddNoteRequest, AddNoteResponse, AppState, ADD_NOTE_PATH};
pub use server::serve;
pub use sqlite::SqliteDocumentStore;

/// Logical database notes are written to.
pub const DATABASE_ID: &str = "notes";

/// Collection notes are written to.
pub const COLLECTION_ID: &str = "entries";

/// Document database holding one record per note.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new note document.
    ///
    /// Fails if a document with the same id already exists.
    async fn create_item(&self, record: &NoteRecord) -> Result<()>;
}

/// Build the document store described by the configuration.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or is misconfigured.
pub fn open_document_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    Ok(match config.document_store()? {
        DocumentStoreTarget::Sqlite(path) => Arc::new(SqliteDocumentStore::open(path)?),
        DocumentStoreTarget::Http { endpoint, key } => {
            Arc::new(HttpDocumentStore::new(&endpoint, key))
        }
    })
}

//! `notekeep` - keep short text notes
//!
//! This library provides two independent pieces:
//! - an archive client that saves, lists, downloads and deletes notes held
//!   as objects in a container, and
//! - an ingest endpoint that accepts notes over HTTP and inserts them into a
//!   document store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod note;
pub mod storage;

pub use archive::{ArchiveClient, FsObjectStore, Listing, MemoryObjectStore, ObjectStore};
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{DocumentStore, HttpDocumentStore, SqliteDocumentStore};
pub use logging::init_logging;
pub use note::NoteRecord;
pub use storage::Storage;

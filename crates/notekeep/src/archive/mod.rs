//! Note archive client.
//!
//! Notes are kept in a blob-style object store, one object per note, with
//! the title and creation time attached as object metadata. The store itself
//! sits behind the [`ObjectStore`] trait; [`ArchiveClient`] implements the
//! save, list, download and delete operations on top of it.

mod client;
mod fs;
mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::{
    AlwaysConfirm, ArchiveClient, ArchivedNote, Confirm, DeleteOutcome, DownloadHandle,
    ListedNote, Listing, SaveOutcome, DELETE_PROMPT,
};
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;

/// Name of the container notes are stored in.
pub const CONTAINER_NAME: &str = "notes";

/// A stored object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object name, unique within the container.
    pub name: String,
    /// User metadata attached on upload.
    pub metadata: BTreeMap<String, String>,
    /// When the store created the object.
    pub created_on: DateTime<Utc>,
}

/// A downloaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContent {
    /// Raw object bytes.
    pub bytes: Vec<u8>,
    /// User metadata attached on upload.
    pub metadata: BTreeMap<String, String>,
}

/// Blob-style storage holding one object per note.
///
/// Each call is a single request against the store; implementations must
/// make `put` atomic per object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in the container.
    async fn list(&self) -> Result<Vec<ObjectInfo>>;

    /// Upload an object, replacing any object with the same name.
    async fn put(
        &self,
        name: &str,
        content: &[u8],
        metadata: BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()>;

    /// Fetch the content and metadata of an object.
    ///
    /// Fails with `ObjectNotFound` if there is no such object.
    async fn get(&self, name: &str) -> Result<ObjectContent>;

    /// Delete an object.
    ///
    /// Fails with `ObjectNotFound` if there is no such object.
    async fn delete(&self, name: &str) -> Result<()>;
}

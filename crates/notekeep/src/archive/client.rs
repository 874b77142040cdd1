//! Archive client operations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ObjectInfo, ObjectStore};
use crate::error::{Error, Result};
use crate::note::{
    content_hash, object_name, NoteDraft, NoteMetadata, META_CONTENT_HASH, META_TITLE, TEXT_PLAIN,
};

/// Prompt shown before a note is deleted.
pub const DELETE_PROMPT: &str = "Do you really want to delete this note?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Return `true` if the user agreed.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything; for non-interactive use.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// A note that was just written to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedNote {
    /// Object name the note is stored under.
    pub name: String,
    /// Note title.
    pub title: String,
    /// Note content.
    pub content: String,
    /// When the note was saved.
    pub created_at: DateTime<Utc>,
}

/// One entry of a note listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedNote {
    /// Object name; used to download or delete the note.
    pub name: String,
    /// Title from metadata, or the object name when there is none.
    pub title: String,
    /// Creation time reported by the store.
    pub created_at: DateTime<Utc>,
}

impl ListedNote {
    fn from_object(object: ObjectInfo) -> Self {
        let title = object
            .metadata
            .get(META_TITLE)
            .filter(|t| !t.is_empty())
            .cloned()
            .unwrap_or_else(|| object.name.clone());
        Self {
            name: object.name,
            title,
            created_at: object.created_on,
        }
    }

    /// Creation time in local time, for display.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

/// The notes currently in the archive, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The archive holds no notes.
    Empty,
    /// At least one note, ordered by descending creation time.
    Notes(Vec<ListedNote>),
}

impl Listing {
    fn from_objects(mut objects: Vec<ObjectInfo>) -> Self {
        if objects.is_empty() {
            return Self::Empty;
        }
        objects.sort_by(|a, b| {
            b.created_on
                .cmp(&a.created_on)
                .then_with(|| b.name.cmp(&a.name))
        });
        Self::Notes(objects.into_iter().map(ListedNote::from_object).collect())
    }

    /// The listed notes; empty for [`Listing::Empty`].
    #[must_use]
    pub fn notes(&self) -> &[ListedNote] {
        match self {
            Self::Empty => &[],
            Self::Notes(notes) => notes,
        }
    }

    /// Number of notes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes().len()
    }

    /// Whether this is the empty state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Result of a successful save.
#[derive(Debug)]
pub struct SaveOutcome {
    /// The stored note.
    pub note: ArchivedNote,
    /// Listing fetched after the save. A failed refresh does not undo the
    /// save.
    pub listing: Result<Listing>,
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The user declined; nothing was deleted.
    Cancelled,
    /// The note was deleted; carries the refresh result.
    Deleted(Result<Listing>),
}

/// A download in progress.
///
/// Bytes are written to a hidden partial file next to the target. The
/// partial file is renamed into place by [`DownloadHandle::commit`] and
/// removed when the handle is dropped uncommitted.
#[derive(Debug)]
pub struct DownloadHandle {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl DownloadHandle {
    /// Prepare a download of `file_name` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `file_name` is not a plain file name.
    pub fn new(dir: &Path, file_name: &str) -> Result<Self> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| *n == file_name)
            .ok_or_else(|| Error::invalid_object_name(file_name, "not a plain file name"))?;

        Ok(Self {
            partial: dir.join(format!(
                ".{file_name}.{}.part",
                Uuid::new_v4().simple()
            )),
            target: dir.join(file_name),
            committed: false,
        })
    }

    /// Path of the temporary file.
    #[must_use]
    pub fn partial_path(&self) -> &Path {
        &self.partial
    }

    /// Write the downloaded bytes to the partial file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(&self.partial, bytes).await?;
        Ok(())
    }

    /// Move the partial file into place and return the final path.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    pub async fn commit(mut self) -> Result<PathBuf> {
        tokio::fs::rename(&self.partial, &self.target).await?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        if !self.committed {
            match std::fs::remove_file(&self.partial) {
                Ok(()) => debug!("Released partial download {}", self.partial.display()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!(
                    "Failed to remove partial download {}: {}",
                    self.partial.display(),
                    err
                ),
            }
        }
    }
}

/// Client for the note archive.
///
/// Owns its object store; construct one per store and pass it to whoever
/// needs it.
#[derive(Debug)]
pub struct ArchiveClient<S> {
    store: S,
}

impl<S: ObjectStore> ArchiveClient<S> {
    /// Create a client over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying object store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Save a new note.
    ///
    /// Both fields are trimmed and must be non-empty. On success the
    /// returned outcome carries the refreshed listing, or the error that
    /// prevented refreshing it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank input, or the store error if
    /// the upload fails.
    pub async fn save_note(&self, title: &str, content: &str) -> Result<SaveOutcome> {
        let draft = NoteDraft::new(title, content)?;
        let created_at = Utc::now();
        let name = object_name(draft.title(), created_at);

        let metadata = NoteMetadata {
            title: draft.title().to_string(),
            created_at,
            content_hash: content_hash(draft.content().as_bytes()),
        };

        self.store
            .put(
                &name,
                draft.content().as_bytes(),
                metadata.to_map(),
                TEXT_PLAIN,
            )
            .await?;
        info!("Saved note '{}' as {}", draft.title(), name);

        let listing = self.refreshed_listing().await;
        Ok(SaveOutcome {
            note: ArchivedNote {
                name,
                title: draft.title().to_string(),
                content: draft.content().to_string(),
                created_at,
            },
            listing,
        })
    }

    /// List all notes, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error if listing fails.
    pub async fn list_notes(&self) -> Result<Listing> {
        let objects = self.store.list().await?;
        debug!("Archive holds {} notes", objects.len());
        Ok(Listing::from_objects(objects))
    }

    /// Fetch the raw content of a note.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] for unknown names and
    /// [`Error::ContentMismatch`] if the bytes do not match the hash
    /// recorded on save.
    pub async fn download_note(&self, name: &str) -> Result<Vec<u8>> {
        let object = self.store.get(name).await.map_err(|e| note_error(e, name))?;

        if let Some(expected) = object.metadata.get(META_CONTENT_HASH) {
            if content_hash(&object.bytes) != *expected {
                warn!("Content hash mismatch for {}", name);
                return Err(Error::ContentMismatch {
                    name: name.to_string(),
                });
            }
        }
        Ok(object.bytes)
    }

    /// Download a note into `dir`, named after the object.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the file cannot be written.
    /// No partial file is left behind on failure.
    pub async fn download_to(&self, name: &str, dir: &Path) -> Result<PathBuf> {
        let mut handle = DownloadHandle::new(dir, name)?;
        let bytes = self.download_note(name).await?;
        handle.write(&bytes).await?;
        let path = handle.commit().await?;
        info!("Downloaded {} to {}", name, path.display());
        Ok(path)
    }

    /// Delete a note after asking `confirm`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoteNotFound`] if there is no such note, or the
    /// store error if deletion fails.
    pub async fn delete_note(&self, name: &str, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            debug!("Delete of {} cancelled", name);
            return Ok(DeleteOutcome::Cancelled);
        }

        self.store
            .delete(name)
            .await
            .map_err(|e| note_error(e, name))?;
        info!("Deleted note {}", name);

        Ok(DeleteOutcome::Deleted(self.refreshed_listing().await))
    }

    async fn refreshed_listing(&self) -> Result<Listing> {
        let listing = self.list_notes().await;
        if let Err(err) = &listing {
            warn!("Failed to refresh note listing: {}", err);
        }
        listing
    }
}

fn note_error(err: Error, name: &str) -> Error {
    match err {
        Error::ObjectNotFound { .. } => Error::NoteNotFound {
            name: name.to_string(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::archive::{MemoryObjectStore, ObjectContent};

    struct Decline;

    impl Confirm for Decline {
        fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    /// Store that fails every call.
    struct BrokenStore;

    #[async_trait::async_trait]
    impl ObjectStore for BrokenStore {
        async fn list(&self) -> Result<Vec<ObjectInfo>> {
            Err(Error::internal("store unavailable"))
        }
        async fn put(
            &self,
            _name: &str,
            _content: &[u8],
            _metadata: BTreeMap<String, String>,
            _content_type: &str,
        ) -> Result<()> {
            Err(Error::internal("store unavailable"))
        }
        async fn get(&self, _name: &str) -> Result<ObjectContent> {
            Err(Error::internal("store unavailable"))
        }
        async fn delete(&self, _name: &str) -> Result<()> {
            Err(Error::internal("store unavailable"))
        }
    }

    /// Memory store whose listing fails once `fail_list` is set.
    #[derive(Default)]
    struct FlakyListStore {
        inner: MemoryObjectStore,
        fail_list: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl ObjectStore for FlakyListStore {
        async fn list(&self) -> Result<Vec<ObjectInfo>> {
            if self.fail_list.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::internal("listing unavailable"));
            }
            self.inner.list().await
        }
        async fn put(
            &self,
            name: &str,
            content: &[u8],
            metadata: BTreeMap<String, String>,
            content_type: &str,
        ) -> Result<()> {
            self.inner.put(name, content, metadata, content_type).await
        }
        async fn get(&self, name: &str) -> Result<ObjectContent> {
            self.inner.get(name).await
        }
        async fn delete(&self, name: &str) -> Result<()> {
            self.inner.delete(name).await
        }
    }

    fn create_test_client() -> ArchiveClient<MemoryObjectStore> {
        crate::logging::init_test_logging();
        ArchiveClient::new(MemoryObjectStore::new())
    }

    #[tokio::test]
    async fn test_list_empty_is_explicit_state() {
        let client = create_test_client();
        let listing = client.list_notes().await.unwrap();
        assert_eq!(listing, Listing::Empty);
        assert!(listing.is_empty());
        assert_eq!(listing.len(), 0);
    }

    #[tokio::test]
    async fn test_save_stores_trimmed_note() {
        let client = create_test_client();
        let outcome = client.save_note(" Shopping ", " milk, eggs ").await.unwrap();

        assert_eq!(outcome.note.title, "Shopping");
        assert_eq!(outcome.note.content, "milk, eggs");
        assert!(outcome.note.name.starts_with("Shopping-"));
        assert!(outcome.note.name.ends_with(".txt"));
        let listing = outcome.listing.as_ref().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.notes()[0].title, "Shopping");
        assert_eq!(
            client
                .store()
                .content_type(&outcome.note.name)
                .await
                .as_deref(),
            Some(TEXT_PLAIN)
        );
    }

    #[tokio::test]
    async fn test_save_rejects_blank_input_without_side_effect() {
        let client = create_test_client();
        for (title, content) in [("", "body"), ("title", "   "), (" ", "\n")] {
            let err = client.save_note(title, content).await.unwrap_err();
            assert!(err.is_validation_error());
        }
        assert!(client.list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_reports_store_failure() {
        let client = ArchiveClient::new(BrokenStore);
        let err = client.save_note("t", "c").await.unwrap_err();
        assert!(err.to_string().contains("store unavailable"));
    }

    #[tokio::test]
    async fn test_save_succeeds_when_refresh_fails() {
        let store = FlakyListStore::default();
        store.fail_list.store(true, std::sync::atomic::Ordering::SeqCst);
        let client = ArchiveClient::new(store);

        let outcome = client.save_note("Shopping", "milk, eggs").await.unwrap();

        assert!(outcome.listing.is_err());
        let stored = client.download_note(&outcome.note.name).await.unwrap();
        assert_eq!(stored, b"milk, eggs");
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_refresh_fails() {
        let client = ArchiveClient::new(FlakyListStore::default());
        let saved = client.save_note("Gone", "soon").await.unwrap();
        client
            .store()
            .fail_list
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let outcome = client
            .delete_note(&saved.note.name, &AlwaysConfirm)
            .await
            .unwrap();

        assert!(matches!(outcome, DeleteOutcome::Deleted(Err(_))));
        let err = client.download_note(&saved.note.name).await.unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { .. }));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let client = create_test_client();
        for title in ["first", "second", "third"] {
            client.save_note(title, "x").await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let listing = client.list_notes().await.unwrap();
        let titles: Vec<_> = listing.notes().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_listing_falls_back_to_name_without_title() {
        let client = create_test_client();
        client
            .store()
            .put("legacy.txt", b"old", BTreeMap::new(), TEXT_PLAIN)
            .await
            .unwrap();

        let listing = client.list_notes().await.unwrap();
        assert_eq!(listing.notes()[0].title, "legacy.txt");
        assert!(!listing.notes()[0].display_date().is_empty());
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let client = create_test_client();
        let content = "line one\nline two \u{1f4dd}";
        let saved = client.save_note("Round trip", content).await.unwrap();

        let bytes = client.download_note(&saved.note.name).await.unwrap();
        assert_eq!(bytes, content.as_bytes());
    }

    #[tokio::test]
    async fn test_download_detects_tampering() {
        let client = create_test_client();
        let saved = client.save_note("t", "original").await.unwrap();
        let metadata = client
            .store()
            .get(&saved.note.name)
            .await
            .unwrap()
            .metadata;
        client
            .store()
            .put(&saved.note.name, b"changed", metadata, TEXT_PLAIN)
            .await
            .unwrap();

        let err = client.download_note(&saved.note.name).await.unwrap_err();
        assert!(matches!(err, Error::ContentMismatch { .. }));
    }

    #[tokio::test]
    async fn test_download_missing_note() {
        let client = create_test_client();
        let err = client.download_note("missing.txt").await.unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { .. }));
    }

    #[tokio::test]
    async fn test_download_to_writes_file_and_releases_partial() {
        let client = create_test_client();
        let dir = tempfile::tempdir().unwrap();
        let saved = client.save_note("File", "contents").await.unwrap();

        let path = client.download_to(&saved.note.name, dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join(&saved.note.name));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "contents");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_download_to_missing_leaves_nothing() {
        let client = create_test_client();
        let dir = tempfile::tempdir().unwrap();

        assert!(client.download_to("missing.txt", dir.path()).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_handle_drop_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        let partial = {
            let mut handle = DownloadHandle::new(dir.path(), "note.txt").unwrap();
            handle.write(b"half").await.unwrap();
            assert!(handle.partial_path().exists());
            handle.partial_path().to_path_buf()
        };
        assert!(!partial.exists());
        assert!(!dir.path().join("note.txt").exists());
    }

    #[test]
    fn test_download_handle_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DownloadHandle::new(dir.path(), "../escape.txt").is_err());
        assert!(DownloadHandle::new(dir.path(), "a/b.txt").is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_note() {
        let client = create_test_client();
        let saved = client.save_note("Gone", "soon").await.unwrap();

        match client
            .delete_note(&saved.note.name, &AlwaysConfirm)
            .await
            .unwrap()
        {
            DeleteOutcome::Deleted(listing) => assert!(listing.unwrap().is_empty()),
            DeleteOutcome::Cancelled => panic!("delete was cancelled"),
        }
    }

    #[tokio::test]
    async fn test_delete_declined_keeps_note() {
        let client = create_test_client();
        let saved = client.save_note("Stay", "here").await.unwrap();

        let outcome = client.delete_note(&saved.note.name, &Decline).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Cancelled));
        assert_eq!(client.list_notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_note_is_not_found() {
        let client = create_test_client();
        let err = client
            .delete_note("missing.txt", &AlwaysConfirm)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoteNotFound { ref name } if name == "missing.txt"));
    }
}

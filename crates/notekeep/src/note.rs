//! Core note types for notekeep.
//!
//! A note is a title and a piece of text. The archive client keeps one
//! object per note and derives the object name from the title and the
//! creation time; the ingest endpoint keeps one document per note.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Content type of every note object.
pub const TEXT_PLAIN: &str = "text/plain";

/// Extension appended to note object names.
pub const NOTE_EXTENSION: &str = "txt";

/// Metadata key holding the note title.
pub const META_TITLE: &str = "title";

/// Metadata key holding the creation time (RFC 3339).
pub const META_CREATED_AT: &str = "createdAt";

/// Metadata key holding the BLAKE3 hash of the content.
pub const META_CONTENT_HASH: &str = "contentHash";

/// Longest title prefix, in bytes, used in an object name.
///
/// Leaves room under the usual 255-byte file name limit for the timestamp,
/// the suffix, and the hidden sidecar and partial-download names derived
/// from the object name.
pub const MAX_NAME_TITLE_BYTES: usize = 160;

/// Characters that may not appear in an object name.
static ILLEGAL_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|#%\x00-\x1f\x7f]"#).expect("valid name regex"));

/// Validated input for a new note.
///
/// Both fields are trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Validate a title/content pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if either field is empty after trimming.
    pub fn new(title: &str, content: &str) -> Result<Self> {
        let title = required("title", title)?;
        let content = required("content", content)?;
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    /// The trimmed title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The trimmed content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Return the trimmed value, or a validation error if nothing is left.
///
/// # Errors
///
/// Returns [`Error::MissingField`] naming `field` when `value` is blank.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(trimmed)
}

/// Build a unique object name for a note.
///
/// The name is `{title}-{timestamp}-{suffix}.txt`, where illegal characters
/// in the title are replaced by `_` and `:`/`.` in the ISO timestamp by `-`.
#[must_use]
pub fn object_name(title: &str, created_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    object_name_with_suffix(title, created_at, &suffix[..8])
}

/// Build an object name with an explicit uniqueness suffix.
#[must_use]
pub fn object_name_with_suffix(title: &str, created_at: DateTime<Utc>, suffix: &str) -> String {
    let mut title = ILLEGAL_NAME_CHARS.replace_all(title, "_").into_owned();
    title.truncate(floor_char_boundary(&title, MAX_NAME_TITLE_BYTES));
    // Leading dots would hide the object
    if title.starts_with('.') {
        title.replace_range(..1, "_");
    }
    let timestamp = created_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{title}-{timestamp}-{suffix}.{NOTE_EXTENSION}")
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Compute the BLAKE3 hash of note content.
#[must_use]
pub fn content_hash(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Metadata stored alongside each note object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMetadata {
    /// Title as entered by the user.
    pub title: String,
    /// When the note was saved.
    pub created_at: DateTime<Utc>,
    /// BLAKE3 hash of the stored content.
    pub content_hash: String,
}

impl NoteMetadata {
    /// Convert into the string map handed to the object store.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (META_TITLE.to_string(), self.title.clone()),
            (
                META_CREATED_AT.to_string(),
                self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (META_CONTENT_HASH.to_string(), self.content_hash.clone()),
        ])
    }
}

/// A note as persisted by the ingest endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    /// Unique document id (v7 UUID).
    pub id: String,
    /// Note title.
    pub title: String,
    /// Note content.
    pub content: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl NoteRecord {
    /// Create a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            title: title.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

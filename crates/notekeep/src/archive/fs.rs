//! Directory-backed object store.
//!
//! Each object is a plain file in the container directory. Its metadata
//! lives in a hidden JSON sidecar next to it, `.{name}.meta.json`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ObjectContent, ObjectInfo, ObjectStore};
use crate::error::{Error, Result};

const SIDECAR_SUFFIX: &str = ".meta.json";

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    metadata: BTreeMap<String, String>,
    created_on: DateTime<Utc>,
}

/// Object store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open a container directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|source| Error::DirectoryCreate {
                path: root.clone(),
                source,
            })?;
        }
        debug!("Using object container at {}", root.display());
        Ok(Self { root })
    }

    /// Get the container directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    fn sidecar_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{name}{SIDECAR_SUFFIX}"))
    }

    /// Write `bytes` to `target` through a temp file so readers never see
    /// a half-written file.
    async fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = self
            .root
            .join(format!(".tmp-{}", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn read_sidecar(&self, name: &str, path: &Path) -> Result<Sidecar> {
        match tokio::fs::read(self.sidecar_path(name)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // Objects dropped in by hand have no sidecar
                let meta = tokio::fs::metadata(path).await?;
                let created = meta.created().or_else(|_| meta.modified())?;
                Ok(Sidecar {
                    content_type: "application/octet-stream".to_string(),
                    metadata: BTreeMap::new(),
                    created_on: DateTime::<Utc>::from(created),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Describe one listed file, or `None` if it cannot be listed.
    ///
    /// A file deleted since the directory was read is skipped quietly; one
    /// with unreadable metadata is skipped with a warning.
    async fn list_entry(&self, name: &str, path: &Path) -> Option<ObjectInfo> {
        match self.read_sidecar(name, path).await {
            Ok(sidecar) => Some(ObjectInfo {
                name: name.to_string(),
                metadata: sidecar.metadata,
                created_on: sidecar.created_on,
            }),
            Err(Error::Io(err)) if err.kind() == ErrorKind::NotFound => {
                debug!("Object {} vanished while listing", name);
                None
            }
            Err(err) => {
                warn!("Skipping object {}: {}", name, err);
                None
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_object_name(name, "name is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::invalid_object_name(
            name,
            "contains a path separator",
        ));
    }
    if name.starts_with('.') {
        return Err(Error::invalid_object_name(name, "starts with '.'"));
    }
    Ok(())
}

fn not_found(name: &str) -> Error {
    Error::ObjectNotFound {
        name: name.to_string(),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!("Skipping non UTF-8 object name {:?}", file_name);
                continue;
            };
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if name.starts_with('.') || !is_file {
                continue;
            }

            if let Some(info) = self.list_entry(name, &entry.path()).await {
                objects.push(info);
            }
        }

        debug!("Listed {} objects", objects.len());
        Ok(objects)
    }

    async fn put(
        &self,
        name: &str,
        content: &[u8],
        metadata: BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(name)?;
        let sidecar = Sidecar {
            content_type: content_type.to_string(),
            metadata,
            created_on: Utc::now(),
        };

        // Sidecar first: an object is only listed once its content file exists
        self.write_atomic(&self.sidecar_path(name), &serde_json::to_vec(&sidecar)?)
            .await?;
        self.write_atomic(&path, content).await?;

        debug!("Stored object {} ({} bytes)", name, content.len());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<ObjectContent> {
        let path = self.object_path(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found(name)),
            Err(err) => return Err(err.into()),
        };
        let sidecar = self.read_sidecar(name, &path).await?;
        Ok(ObjectContent {
            bytes,
            metadata: sidecar.metadata,
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.object_path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found(name)),
            Err(err) => return Err(err.into()),
        }

        match tokio::fs::remove_file(self.sidecar_path(name)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove metadata for {}: {}", name, err),
        }

        debug!("Deleted object {}", name);
        Ok(())
    }
}

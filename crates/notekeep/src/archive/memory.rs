//! In-process object store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ObjectContent, ObjectInfo, ObjectStore};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct StoredObject {
    info: ObjectInfo,
    content: Vec<u8>,
    content_type: String,
}

/// Object store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type recorded for an object, if it exists.
    pub async fn content_type(&self, name: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(name)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self) -> Result<Vec<ObjectInfo>> {
        Ok(self
            .objects
            .read()
            .await
            .values()
            .map(|o| o.info.clone())
            .collect())
    }

    async fn put(
        &self,
        name: &str,
        content: &[u8],
        metadata: BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()> {
        let object = StoredObject {
            info: ObjectInfo {
                name: name.to_string(),
                metadata,
                created_on: Utc::now(),
            },
            content: content.to_vec(),
            content_type: content_type.to_string(),
        };
        self.objects.write().await.insert(name.to_string(), object);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<ObjectContent> {
        self.objects
            .read()
            .await
            .get(name)
            .map(|o| ObjectContent {
                bytes: o.content.clone(),
                metadata: o.info.metadata.clone(),
            })
            .ok_or_else(|| Error::ObjectNotFound {
                name: name.to_string(),
            })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::ObjectNotFound {
                name: name.to_string(),
            })
    }
}

//! Typed HTTP client for a remote document service.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{DocumentStore, COLLECTION_ID, DATABASE_ID};
use crate::error::{Error, Result};
use crate::note::NoteRecord;

/// Header carrying the access key.
const KEY_HEADER: &str = "api-key";

/// Document store that forwards inserts to a remote service.
///
/// Documents are posted as JSON to
/// `{endpoint}/dbs/{database}/colls/{collection}/docs`.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    base_url: String,
    key: String,
    database: String,
    collection: String,
    client: reqwest::Client,
}

impl HttpDocumentStore {
    /// Create a client for the service at `endpoint`.
    pub fn new(endpoint: &str, key: impl Into<String>) -> Self {
        Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            key: key.into(),
            database: DATABASE_ID.to_string(),
            collection: COLLECTION_ID.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// URL documents are posted to.
    #[must_use]
    pub fn documents_url(&self) -> String {
        format!(
            "{}/dbs/{}/colls/{}/docs",
            self.base_url, self.database, self.collection
        )
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create_item(&self, record: &NoteRecord) -> Result<()> {
        let url = self.documents_url();
        debug!("Posting document {} to {}", record.id, url);

        let resp = self
            .client
            .post(&url)
            .header(KEY_HEADER, &self.key)
            .json(record)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Document service rejected {}: HTTP {}", record.id, status);
            return Err(Error::StoreResponse {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

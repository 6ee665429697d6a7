//! Object bucket access.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Cache lifetime attached to uploaded objects, in seconds.
pub const OBJECT_CACHE_CONTROL: &str = "3600";

/// Listing entry for a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a new object. Existing keys are never overwritten.
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Objects directly under `prefix`, names relative to it.
    async fn list(&self, prefix: &str, limit: u32, offset: u32) -> Result<Vec<StoredObject>>;

    fn public_url(&self, key: &str) -> String;
}

pub struct RestBlobStore {
    base_url: String,
    bucket: String,
    key: SecretString,
    http_client: Client,
}

impl RestBlobStore {
    pub fn new(config: &StoreConfig, privileged: bool) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build storage client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            key: SecretString::from(config.key(privileged).to_string()),
            http_client,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.key.expose_secret();
        request
            .header("apikey", key)
            .header(header::AUTHORIZATION, format!("Bearer {}", key))
    }
}

async fn ensure_success(response: reqwest::Response, operation: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(operation, %status, body = %body, "Storage request failed");
    Err(Error::Upstream(format!("{} failed with status {}: {}", operation, status, body)))
}

#[async_trait]
impl BlobStore for RestBlobStore {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let url = self.object_url(&format!("{}/{}", self.bucket, key));
        let request = self
            .http_client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, format!("max-age={}", OBJECT_CACHE_CONTROL))
            .header("x-upsert", "false")
            .body(body);
        let response = self.authorized(request).send().await?;
        ensure_success(response, "upload").await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let url = self.object_url(&self.bucket);
        let request = self
            .http_client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": [key] }));
        let response = self.authorized(request).send().await?;
        ensure_success(response, "remove").await?;
        Ok(())
    }

    async fn list(&self, prefix: &str, limit: u32, offset: u32) -> Result<Vec<StoredObject>> {
        let url = self.object_url(&format!("list/{}", self.bucket));
        let request = self.http_client.post(url).json(&serde_json::json!({
            "prefix": prefix,
            "limit": limit,
            "offset": offset,
            "sortBy": { "column": "name", "order": "asc" },
        }));
        let response = self.authorized(request).send().await?;
        let response = ensure_success(response, "list").await?;
        Ok(response.json().await?)
    }

    fn public_url(&self, key: &str) -> String {
        self.object_url(&format!("public/{}/{}", self.bucket, key))
    }
}

struct MemoryObject {
    id: Uuid,
    body: Bytes,
    content_type: String,
    created_at: String,
}

/// Bucket kept in process memory.
pub struct MemoryBlobStore {
    base_url: String,
    bucket: String,
    objects: RwLock<BTreeMap<String, MemoryObject>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: &str, bucket: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Stored body and content type for `key`.
    pub async fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| (o.body.clone(), o.content_type.clone()))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        if objects.contains_key(key) {
            return Err(Error::Upstream(format!("The resource already exists: {}", key)));
        }
        objects.insert(
            key.to_string(),
            MemoryObject {
                id: Uuid::now_v7(),
                body,
                content_type: content_type.to_string(),
                created_at: Utc::now().to_rfc3339(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str, limit: u32, offset: u32) -> Result<Vec<StoredObject>> {
        let prefix = prefix.trim_end_matches('/');
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter_map(|(key, object)| {
                let name = if prefix.is_empty() {
                    key.as_str()
                } else {
                    key.strip_prefix(prefix)?.strip_prefix('/')?
                };
                Some((name, object))
            })
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(name, object)| StoredObject {
                name: name.to_string(),
                id: Some(object.id.to_string()),
                created_at: Some(object.created_at.clone()),
                updated_at: Some(object.created_at.clone()),
                metadata: Some(serde_json::json!({
                    "size": object.body.len(),
                    "mimetype": object.content_type,
                    "cacheControl": format!("max-age={}", OBJECT_CACHE_CONTROL),
                })),
            })
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.bucket, key)
    }
}

//! PostgREST-style client for the hosted tables.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use super::{Filter, Query, Store};
use crate::config::StoreConfig;
use crate::error::{Error, Result};

const PREFER: &str = "Prefer";

pub struct RestStore {
    base_url: String,
    key: SecretString,
    http_client: Client,
}

impl RestStore {
    /// Builds a client carrying the anon key, or the service key when
    /// `privileged` is set.
    pub fn new(config: &StoreConfig, privileged: bool) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build store client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            key: SecretString::from(config.key(privileged).to_string()),
            http_client,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Url::parse(&format!("{}/rest/v1/{}", self.base_url, table))
            .map_err(|e| Error::Internal(format!("Invalid store URL: {}", e)))
    }

    /// URL carrying the query's predicates, projection, order and range.
    fn query_url(&self, query: &Query) -> Result<Url> {
        let mut url = self.table_url(&query.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(columns) = &query.columns {
                pairs.append_pair("select", &columns.replace(' ', ""));
            }
            for filter in &query.filters {
                let (column, value) = match filter {
                    Filter::Eq(c, v) => (c, format!("eq.{}", v)),
                    Filter::ILike(c, v) => (c, format!("ilike.{}", v)),
                    Filter::Gte(c, v) => (c, format!("gte.{}", v)),
                    Filter::Lte(c, v) => (c, format!("lte.{}", v)),
                };
                pairs.append_pair(column, &value);
            }
            if !query.order.is_empty() {
                let order = query
                    .order
                    .iter()
                    .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                    .collect::<Vec<_>>()
                    .join(",");
                pairs.append_pair("order", &order);
            }
            if let Some(range) = query.range {
                pairs.append_pair("offset", &range.offset.to_string());
                pairs.append_pair("limit", &range.limit.to_string());
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.key.expose_secret();
        self.http_client
            .request(method, url)
            .header("apikey", key)
            .header(header::AUTHORIZATION, format!("Bearer {}", key))
    }

    async fn rows(&self, response: Response, operation: &str) -> Result<Vec<Value>> {
        let response = check_status(response, operation).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }
}

/// Maps a non-2xx response to `Upstream`, carrying the platform's message.
async fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(operation, %status, body = %body, "Store request failed");
    Err(Error::Upstream(format!("{} failed with status {}: {}", operation, status, body)))
}

/// Total from a `Content-Range` header such as `0-9/25` or `*/25`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}

#[async_trait]
impl Store for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.query_url(query)?;
        tracing::debug!(table = %query.table, "Store select");
        let response = self.request(Method::GET, url).send().await?;
        self.rows(response, "select").await
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        let url = self.query_url(&query.predicates_only())?;
        let response = self
            .request(Method::HEAD, url)
            .header(PREFER, "count=exact")
            .send()
            .await?;
        let response = check_status(response, "count").await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| Error::Upstream("count response missing Content-Range total".to_string()))
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value> {
        let url = self.table_url(table)?;
        let response = self
            .request(Method::POST, url)
            .header(PREFER, "return=representation")
            .json(&row)
            .send()
            .await?;
        self.rows(response, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Upstream("insert returned no row".to_string()))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let url = self.query_url(&query.predicates_only())?;
        let response = self
            .request(Method::PATCH, url)
            .header(PREFER, "return=representation")
            .json(&patch)
            .send()
            .await?;
        self.rows(response, "update").await
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>> {
        let url = self.query_url(&query.predicates_only())?;
        let response = self
            .request(Method::DELETE, url)
            .header(PREFER, "return=representation")
            .send()
            .await?;
        self.rows(response, "delete").await
    }
}

//! Client side of the hosted data platform.
//!
//! Tables are reached through the [`Store`] trait and the object bucket
//! through [`BlobStore`]. Each has a REST implementation talking to the
//! platform and an in-memory implementation with the same semantics.

pub mod blob;
pub mod memory;
pub mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

pub use blob::{BlobStore, MemoryBlobStore, RestBlobStore, StoredObject};
pub use memory::{MemoryStore, TableSpec};
pub use rest::RestStore;

/// Shared handle to a table store.
pub type StoreHandle = Arc<dyn Store>;

/// Shared handle to an object bucket.
pub type BlobHandle = Arc<dyn BlobStore>;

/// Row predicate. Values use the textual form the platform compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    /// Case-insensitive pattern match; `%` matches any run of characters.
    ILike(String, String),
    Gte(String, String),
    Lte(String, String),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::ILike(c, _) | Filter::Gte(c, _) | Filter::Lte(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Row window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub offset: u64,
    pub limit: u64,
}

/// A table query: projection, predicates, ordering and range.
///
/// Built fluently:
///
/// ```
/// use tutor_attendance::store::Query;
///
/// let query = Query::table("attendance_records")
///     .eq("tutor_name", "Alice")
///     .order("timestamp", false)
///     .range(10, 10);
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    /// Comma separated column list, `None` for every column
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub range: Option<Range>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            filters: Vec::new(),
            order: Vec::new(),
            range: None,
        }
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.to_string()));
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(column.into(), pattern.into()));
        self
    }

    pub fn gte(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Gte(column.into(), value.to_string()));
        self
    }

    pub fn lte(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Lte(column.into(), value.to_string()));
        self
    }

    /// Applies `eq` only when a value is present.
    pub fn eq_opt(self, column: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.range = Some(Range { offset, limit });
        self
    }

    /// Same table and predicates, without projection, ordering or range.
    pub fn predicates_only(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: None,
            filters: self.filters.clone(),
            order: Vec::new(),
            range: None,
        }
    }
}

/// Row operations on the hosted tables.
///
/// Rows travel as JSON objects; typed access goes through [`select_as`] and
/// friends. Write operations return the affected rows.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Number of rows matching the query predicates. Range is ignored.
    async fn count(&self, query: &Query) -> Result<u64>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>>;

    async fn delete(&self, query: &Query) -> Result<Vec<Value>>;
}

pub async fn select_as<T: DeserializeOwned>(store: &dyn Store, query: &Query) -> Result<Vec<T>> {
    let rows = store.select(query).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

pub async fn select_one<T: DeserializeOwned>(store: &dyn Store, query: &Query) -> Result<Option<T>> {
    let query = query.clone().range(0, 1);
    Ok(select_as(store, &query).await?.into_iter().next())
}

pub async fn insert_as<T: DeserializeOwned>(
    store: &dyn Store,
    table: &str,
    row: impl serde::Serialize,
) -> Result<T> {
    let row = store.insert(table, serde_json::to_value(row)?).await?;
    Ok(serde_json::from_value(row)?)
}

/// Updates matching rows and returns the first one, if any matched.
pub async fn update_one<T: DeserializeOwned>(
    store: &dyn Store,
    query: &Query,
    patch: Value,
) -> Result<Option<T>> {
    match store.update(query, patch).await?.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

//! In-process table store.
//!
//! Mirrors the platform's observable behavior closely enough to run the
//! service locally and to back the test suite: server-assigned keys and
//! timestamps, predicate matching, ordering, ranges and row-returning writes.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{Filter, Query, Store};
use crate::error::{Error, Result};
use crate::models::{
    attendance::ATTENDANCE_TABLE, students::STUDENTS_TABLE, users::USERS_TABLE,
};

/// Server-side behavior of a table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Primary key column, assigned a UUID v7 when absent on insert
    pub key: &'static str,
    /// Columns stamped with the current time when absent on insert
    pub timestamp_defaults: &'static [&'static str],
}

struct Table {
    spec: TableSpec,
    rows: Vec<Map<String, Value>>,
}

pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    last_stamp: Mutex<DateTime<Utc>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with no tables.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            last_stamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Store with the service's tables registered.
    pub fn with_default_tables() -> Self {
        Self::new()
            .with_table(
                ATTENDANCE_TABLE,
                TableSpec {
                    key: "record_id",
                    timestamp_defaults: &["timestamp"],
                },
            )
            .with_table(
                STUDENTS_TABLE,
                TableSpec {
                    key: "id",
                    timestamp_defaults: &["created_at", "updated_at"],
                },
            )
            .with_table(
                USERS_TABLE,
                TableSpec {
                    key: "id",
                    timestamp_defaults: &["created_at"],
                },
            )
    }

    pub fn with_table(mut self, name: &str, spec: TableSpec) -> Self {
        self.tables.get_mut().insert(
            name.to_string(),
            Table {
                spec,
                rows: Vec::new(),
            },
        );
        self
    }

    /// Strictly increasing clock so insertion order survives timestamp ordering.
    async fn next_stamp(&self) -> String {
        let mut last = self.last_stamp.lock().await;
        let now = Utc::now();
        let stamp = if now > *last { now } else { *last + Duration::microseconds(1) };
        *last = stamp;
        stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

fn missing_table(name: &str) -> Error {
    Error::Upstream(format!("relation \"{}\" does not exist", name))
}

/// Textual form of a cell, as the platform compares filter values.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// `%`-wildcard match, case-insensitive.
fn ilike_matches(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();

    if parts.len() == 1 {
        return text == pattern;
    }

    let mut rest = text.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

fn matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let cell = row.get(filter.column()).and_then(cell_text);
        match (filter, cell) {
            (_, None) => false,
            (Filter::Eq(_, v), Some(c)) => &c == v,
            (Filter::ILike(_, p), Some(c)) => ilike_matches(&c, p),
            (Filter::Gte(_, v), Some(c)) => c.as_str() >= v.as_str(),
            (Filter::Lte(_, v), Some(c)) => c.as_str() <= v.as_str(),
        }
    })
}

/// Nulls sort after every value, as in Postgres.
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => cell_text(x).cmp(&cell_text(y)),
    }
}

fn project(row: &Map<String, Value>, columns: Option<&str>) -> Value {
    match columns.map(str::trim) {
        None | Some("*") => Value::Object(row.clone()),
        Some(list) => {
            let mut out = Map::new();
            for column in list.split(',').map(str::trim) {
                out.insert(column.to_string(), row.get(column).cloned().unwrap_or(Value::Null));
            }
            Value::Object(out)
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        let tables = self.tables.read().await;
        let table = tables.get(&query.table).ok_or_else(|| missing_table(&query.table))?;

        let mut rows: Vec<&Map<String, Value>> =
            table.rows.iter().filter(|row| matches(row, &query.filters)).collect();

        if !query.order.is_empty() {
            rows.sort_by(|a, b| {
                query
                    .order
                    .iter()
                    .map(|o| {
                        let ord = compare_cells(a.get(&o.column), b.get(&o.column));
                        if o.ascending { ord } else { ord.reverse() }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let (skip, take) = match query.range {
            Some(range) => (range.offset as usize, range.limit as usize),
            None => (0, usize::MAX),
        };

        Ok(rows
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn count(&self, query: &Query) -> Result<u64> {
        let tables = self.tables.read().await;
        let table = tables.get(&query.table).ok_or_else(|| missing_table(&query.table))?;
        Ok(table.rows.iter().filter(|row| matches(row, &query.filters)).count() as u64)
    }

    async fn insert(&self, table_name: &str, row: Value) -> Result<Value> {
        let Value::Object(mut row) = row else {
            return Err(Error::Upstream("insert payload must be an object".to_string()));
        };

        let stamp = self.next_stamp().await;
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table_name).ok_or_else(|| missing_table(table_name))?;

        let key = table.spec.key;
        if row.get(key).is_none_or(Value::is_null) {
            row.insert(key.to_string(), Value::String(Uuid::now_v7().to_string()));
        }
        for column in table.spec.timestamp_defaults {
            if row.get(*column).is_none_or(Value::is_null) {
                row.insert(column.to_string(), Value::String(stamp.clone()));
            }
        }

        let key_value = row.get(key).cloned();
        if table.rows.iter().any(|existing| existing.get(key) == key_value.as_ref()) {
            return Err(Error::Upstream(format!(
                "duplicate key value violates unique constraint on \"{}\"",
                key
            )));
        }

        table.rows.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        let Value::Object(patch) = patch else {
            return Err(Error::Upstream("update payload must be an object".to_string()));
        };

        let mut tables = self.tables.write().await;
        let table = tables.get_mut(&query.table).ok_or_else(|| missing_table(&query.table))?;
        let key = table.spec.key;

        let mut updated = Vec::new();
        for row in table.rows.iter_mut().filter(|row| matches(row, &query.filters)) {
            for (column, value) in &patch {
                // keys are immutable once assigned
                if column != key {
                    row.insert(column.clone(), value.clone());
                }
            }
            updated.push(Value::Object(row.clone()));
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(&query.table).ok_or_else(|| missing_table(&query.table))?;

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut table.rows)
            .into_iter()
            .partition(|row| matches(row, &query.filters));
        table.rows = kept;
        Ok(removed.into_iter().map(Value::Object).collect())
    }
}

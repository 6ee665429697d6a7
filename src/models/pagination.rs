use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest row offset a page may start at; the store takes a signed 64-bit
/// offset.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Page window requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Parses raw `page`/`limit` query values.
    ///
    /// Absent or non-numeric values fall back to the defaults. Numeric values
    /// below 1 are rejected, as is a page whose offset is out of range.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let request = Self {
            page: parse_positive("page", page, DEFAULT_PAGE)?,
            limit: parse_positive("limit", limit, DEFAULT_LIMIT)?,
        };
        match (request.page - 1).checked_mul(request.limit) {
            Some(offset) if offset <= MAX_OFFSET => Ok(request),
            _ => Err(Error::InvalidParameter(
                "page is too large for the requested limit".to_string(),
            )),
        }
    }

    /// Rows skipped before this page. Saturates for requests not built by
    /// [`PageRequest::parse`].
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn paginate(&self, total: u64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: total.div_ceil(self.limit),
        }
    }
}

fn parse_positive(name: &str, raw: Option<&str>, default: u64) -> Result<u64> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(n) if n < 1 => Err(Error::InvalidParameter(format!(
            "{} must be a positive integer",
            name
        ))),
        Ok(n) => Ok(n as u64),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

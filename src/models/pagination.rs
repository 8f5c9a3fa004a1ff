use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 100;

/// Raw `page` / `limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolves the request against an endpoint default, clamping both
    /// values into range.
    pub fn resolve(&self, default_limit: i64) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }
}

/// A 1-based page of `limit` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total.max(0) + self.limit - 1) / self.limit
    }
}

/// One page of results along with the totals behind it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_page: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            total_page: page.total_pages(total),
        }
    }
}

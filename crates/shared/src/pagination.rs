//! Page-numbered pagination for listing endpoints.
//!
//! Listings in this system are small (one row per registered device), so a
//! classic page/per-page envelope with a total count is used instead of
//! cursors.

use serde::{Deserialize, Serialize};

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 200;

/// Page size used when the client does not specify one.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Query parameters for paged listings. Pages are 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageQuery {
    /// Clamp the query into valid bounds: page >= 1, 1 <= per_page <= MAX.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    fn offset(&self) -> usize {
        ((self.page - 1) as usize).saturating_mul(self.per_page as usize)
    }
}

/// A single page of rows plus the total row count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub rows: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// Slice an already-ordered collection into the requested page.
pub fn paginate<T>(items: Vec<T>, query: PageQuery) -> Paged<T> {
    let query = query.normalized();
    let total = items.len();
    let rows: Vec<T> = items
        .into_iter()
        .skip(query.offset())
        .take(query.per_page as usize)
        .collect();

    Paged {
        rows,
        total,
        page: query.page,
        per_page: query.per_page,
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

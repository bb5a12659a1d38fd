//! Value types exchanged between the loader, its resolvers and its callers.

use serde::Serialize;

/// Arguments forwarded to a resolver for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: String,
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(query: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            query: query.into(),
            page,
            page_size,
        }
    }
}

/// Canonical shape every backend payload is normalized into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, page: u32, total_pages: u32) -> Self {
        Self {
            items,
            page,
            total_pages,
        }
    }

    /// Whether another page exists after this one.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Snapshot of the last network-confirmed load, used for status display.
///
/// `cached_pages` is ascending and only lists pages cached for `query`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderState {
    pub query: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub cached_pages: Vec<u32>,
}

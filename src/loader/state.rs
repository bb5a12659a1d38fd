//! Tracks the last network-confirmed load.

use crate::domain::LoaderState;

/// Query, page and page count of the last completed network fetch.
///
/// Cache hits never touch the tracker, so status displays only reflect
/// results the backend has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTracker {
    query: String,
    current_page: u32,
    total_pages: u32,
}

impl StateTracker {
    pub fn new(initial_page: u32) -> Self {
        Self {
            query: String::new(),
            current_page: initial_page,
            total_pages: 0,
        }
    }

    pub fn record(&mut self, query: &str, page: u32, total_pages: u32) {
        if self.query != query {
            self.query = query.to_string();
        }
        self.current_page = page;
        self.total_pages = total_pages;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn snapshot(&self, cached_pages: Vec<u32>) -> LoaderState {
        LoaderState {
            query: self.query.clone(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            cached_pages,
        }
    }
}

use serde::{Deserialize, Serialize};

const fn default_page() -> u64 {
    1
}

/// Which page of a list to look at. Pages start at 1, a page of 0 is read as the first page.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::with_default_page_size(1)
    }
}

impl Pagination {
    pub const fn with_default_page_size(page: u64) -> Self {
        Self {
            page,
            page_size: None,
        }
    }

    pub const fn with_page_size(page: u64, page_size: u64) -> Self {
        Self {
            page,
            page_size: Some(page_size),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn page_size_or(&self, default_page_size: u64) -> u64 {
        self.page_size.unwrap_or(default_page_size).max(1)
    }
}

/// Paging details the remote API reports next to a list.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct PageInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// One page of entities fetched from the remote API.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Listing<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

impl<T> Listing<T> {
    pub fn new(data: Vec<T>, pagination: Option<PageInfo>) -> Self {
        Self { data, pagination }
    }

    pub fn unpaged(data: Vec<T>) -> Self {
        Self::new(data, None)
    }
}

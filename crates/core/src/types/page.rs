//! Paginated list results.

use serde::{Deserialize, Serialize};

/// Pagination block sent by the backend next to list data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default = "first_page", alias = "currentPage")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, alias = "totalItems")]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// A single page holding every item (for endpoints without pagination).
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        let limit = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items,
            pagination: Pagination {
                page: 1,
                limit,
                total,
                total_pages: 1,
            },
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.pagination.page > 1
    }

    /// Transform the items, keeping the pagination block.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_next() {
        let page = Page {
            items: vec![1, 2],
            pagination: Pagination {
                page: 1,
                limit: 2,
                total: 5,
                total_pages: 3,
            },
        };
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_single() {
        let page = Page::single(vec!["a", "b", "c"]);
        assert_eq!(page.pagination.total, 3);
        assert!(!page.has_next());
    }
}

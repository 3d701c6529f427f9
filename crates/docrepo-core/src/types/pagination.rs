//! Pagination value objects.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Default page size.
const DEFAULT_PAGE_SIZE: u64 = 10;

/// Request parameters for paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page index (0-based).
    #[serde(default)]
    pub page_index: u64,
    /// Number of items per page. Must be at least 1.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl PageRequest {
    /// Create a validated page request.
    pub fn new(page_index: u64, page_size: u64) -> AppResult<Self> {
        let request = Self {
            page_index,
            page_size,
        };
        request.validate()?;
        Ok(request)
    }

    /// Reject requests that cannot be turned into a store query: a zero
    /// page size, or a skip that overflows.
    ///
    /// Deserialized requests bypass [`PageRequest::new`], so paged queries
    /// check again before reaching the store.
    pub fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::validation("page size must be at least 1"));
        }
        self.skip().map(|_| ())
    }

    /// Number of records to skip: `page_index * page_size`.
    pub fn skip(&self) -> AppResult<u64> {
        self.page_index.checked_mul(self.page_size).ok_or_else(|| {
            AppError::validation(format!(
                "page {} of size {} is out of range",
                self.page_index, self.page_size
            ))
        })
    }

    /// Number of records to fetch.
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the totals across all pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// The items on this page, in query order.
    pub items: Vec<T>,
    /// Page index (0-based).
    pub page_index: u64,
    /// Number of items per page.
    pub page_size: u64,
    /// Number of matching items across all pages.
    pub total_count: u64,
    /// `ceil(total_count / page_size)`, 0 when nothing matched.
    pub total_pages: u64,
    /// Whether a page follows this one.
    pub has_next_page: bool,
    /// Whether a page precedes this one.
    pub has_previous_page: bool,
}

impl<T> PageResult<T> {
    /// Build a page result, deriving the page count and navigation flags.
    pub fn new(items: Vec<T>, page_index: u64, page_size: u64, total_count: u64) -> Self {
        let total_pages = total_pages(total_count, page_size);
        Self {
            items,
            page_index,
            page_size,
            total_count,
            total_pages,
            has_next_page: page_index.saturating_add(1) < total_pages,
            has_previous_page: page_index > 0,
        }
    }

    /// An empty page for the given request.
    pub fn empty(request: &PageRequest) -> Self {
        Self::new(Vec::new(), request.page_index, request.page_size, 0)
    }

    /// Transform every item while keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Number of pages needed to hold `total_count` items.
pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count / page_size + u64::from(total_count % page_size != 0)
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_matches_ceiling() {
        for size in 1..=12u64 {
            for count in 0..=100u64 {
                let expected = (count as f64 / size as f64).ceil() as u64;
                assert_eq!(total_pages(count, size), expected, "count={count} size={size}");
            }
        }
    }

    #[test]
    fn test_zero_count_has_no_pages() {
        let page: PageResult<u32> = PageResult::new(Vec::new(), 0, 10, 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_previous_page);

        let later: PageResult<u32> = PageResult::new(Vec::new(), 3, 10, 0);
        assert!(!later.has_next_page);
    }

    #[test]
    fn test_navigation_flags() {
        let first: PageResult<u32> = PageResult::new(vec![0; 10], 0, 10, 25);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next_page);
        assert!(!first.has_previous_page);

        let last: PageResult<u32> = PageResult::new(vec![0; 5], 2, 10, 25);
        assert!(!last.has_next_page);
        assert!(last.has_previous_page);
    }

    #[test]
    fn test_new_rejects_zero_page_size() {
        let err = PageRequest::new(0, 0).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert_eq!(PageRequest::new(0, 1).unwrap().page_size, 1);
    }

    #[test]
    fn test_validate_rejects_deserialized_zero_size() {
        let request: PageRequest =
            serde_json::from_str(r#"{"page_index":1,"page_size":0}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_skip_overflow_is_validation_error() {
        let request = PageRequest {
            page_index: u64::MAX,
            page_size: 2,
        };
        let err = request.skip().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);
        assert!(PageRequest::new(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_default_request() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());
        assert_eq!(request.skip().unwrap(), 0);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = PageResult::new(vec![1, 2, 3], 1, 3, 7).map(|n| n.to_string());
        assert_eq!(page.items, vec!["1", "2", "3"]);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_previous_page);
    }
}

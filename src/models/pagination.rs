//! Page window arithmetic shared by every list endpoint

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_PAGE: i64 = 1_000_000;
pub const MAX_LIMIT: i64 = 100;

/// A validated page window (`1 <= page <= MAX_PAGE`, `1 <= limit <= MAX_LIMIT`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build a window from optional query values. The query structs reject
    /// out-of-range values with a 400; anything else is clamped here.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total - 1) / self.limit + 1
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Rows on the requested page
    pub items: Vec<T>,
    /// Total number of matching rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// `ceil(total / limit)`
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, window: PageRequest) -> Self {
        Self {
            items,
            total,
            page: window.page,
            limit: window.limit,
            total_pages: window.total_pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_page_of_twenty_five() {
        let window = PageRequest::new(Some(2), Some(10));
        assert_eq!(window.offset(), 10);
        assert_eq!(window.total_pages(25), 3);
    }

    #[test]
    fn huge_values_are_clamped() {
        let window = PageRequest::new(Some(i64::MAX), Some(i64::MAX));
        assert_eq!(window, PageRequest { page: MAX_PAGE, limit: MAX_LIMIT });
        assert_eq!(window.offset(), (MAX_PAGE - 1) * MAX_LIMIT);
        assert_eq!(window.total_pages(i64::MAX), i64::MAX / MAX_LIMIT + 1);

        let window = PageRequest::new(Some(i64::MIN), Some(0));
        assert_eq!(window, PageRequest { page: 1, limit: 1 });
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let window = PageRequest::default();
        assert_eq!(window, PageRequest { page: 1, limit: 10 });
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn total_pages_edges() {
        let window = PageRequest::new(None, Some(10));
        assert_eq!(window.total_pages(0), 0);
        assert_eq!(window.total_pages(1), 1);
        assert_eq!(window.total_pages(10), 1);
        assert_eq!(window.total_pages(11), 2);
    }
}

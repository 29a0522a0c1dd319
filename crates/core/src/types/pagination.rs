//! Pagination query parameters and response metadata.
//!
//! Every list endpoint accepts `limit`/`page` query parameters and returns a
//! `pagination` object alongside its rows.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 20;
/// Upper bound on page size; larger requests are clamped.
pub const MAX_LIMIT: i64 = 100;

/// `limit`/`page` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    /// Requested page size.
    pub limit: Option<i64>,
    /// 1-based page number.
    pub page: Option<i64>,
}

impl PageQuery {
    /// Resolve the query against a default limit, clamping out-of-range values.
    #[must_use]
    pub fn resolve(&self, default_limit: i64) -> ResolvedPage {
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT);
        let page = self.page.unwrap_or(1).max(1);
        ResolvedPage {
            limit,
            page,
            offset: (page - 1) * limit,
        }
    }
}

/// A resolved, clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPage {
    /// Page size.
    pub limit: i64,
    /// 1-based page number.
    pub page: i64,
    /// Row offset for the query.
    pub offset: i64,
}

/// Pagination metadata returned by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub limit: i64,
}

impl Pagination {
    /// Build pagination metadata from a resolved page and a total row count.
    #[must_use]
    pub const fn new(page: ResolvedPage, total_count: i64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            (total_count + page.limit - 1) / page.limit
        };
        Self {
            current_page: page.page,
            total_pages,
            total_count,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let q = PageQuery {
            limit: None,
            page: None,
        };
        let page = q.resolve(DEFAULT_LIMIT);
        assert_eq!(page.limit, 20);
        assert_eq!(page.page, 1);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_resolve_clamps() {
        let q = PageQuery {
            limit: Some(10_000),
            page: Some(0),
        };
        let page = q.resolve(DEFAULT_LIMIT);
        assert_eq!(page.limit, MAX_LIMIT);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_offset_computation() {
        let q = PageQuery {
            limit: Some(10),
            page: Some(3),
        };
        let page = q.resolve(DEFAULT_LIMIT);
        assert_eq!(page.offset, 20);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = PageQuery {
            limit: Some(10),
            page: Some(1),
        }
        .resolve(DEFAULT_LIMIT);

        assert_eq!(Pagination::new(page, 0).total_pages, 0);
        assert_eq!(Pagination::new(page, 10).total_pages, 1);
        assert_eq!(Pagination::new(page, 11).total_pages, 2);
        assert_eq!(Pagination::new(page, 95).total_pages, 10);
    }

    #[test]
    fn test_camel_case_wire_format() {
        let page = PageQuery {
            limit: Some(10),
            page: Some(2),
        }
        .resolve(DEFAULT_LIMIT);
        let json = serde_json::to_string(&Pagination::new(page, 25)).unwrap();
        assert_eq!(
            json,
            "{\"currentPage\":2,\"totalPages\":3,\"totalCount\":25,\"limit\":10}"
        );
    }
}

//! Pagination and ordering models.
//!
//! A page is request-scoped: it is parsed from query parameters, validated,
//! and discarded after the response is serialized.

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

/// Page slice requested through query parameters.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct PageQuery {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be >= 1"))]
    pub page: u32,

    /// Number of rows per page.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 500, message = "limit must be 1-500"))]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Row offset of this page: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// SQL keyword for this direction.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Ordering applied to a row scan.
#[derive(Debug, Clone)]
pub struct OrderBy {
    /// Column to order by (must exist on the table definition).
    pub column: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Descending order on the given column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_computation() {
        let page = PageQuery { page: 2, limit: 10 };
        assert_eq!(page.offset(), 10);

        let first = PageQuery { page: 1, limit: 50 };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_defaults() {
        let page = PageQuery::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 50);
    }

    #[test]
    fn test_zero_page_fails_validation() {
        let page = PageQuery { page: 0, limit: 10 };
        assert!(page.validate().is_err());
    }
}

//! Page/limit pagination.
//!
//! Pages are 1-based. A request that omits both values gets page 1 with ten
//! items.

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Pagination`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationError {
    /// Page number below 1.
    #[error("page must be at least 1")]
    InvalidPage,
    /// Limit below 1.
    #[error("limit must be at least 1")]
    InvalidLimit,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    /// Page used when the caller does not pick one.
    pub const DEFAULT_PAGE: u32 = 1;
    /// Limit used when the caller does not pick one.
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Build a page window, filling in defaults for missing values.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError`] if either value is below 1.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(i64::from(Self::DEFAULT_PAGE));
        let limit = limit.unwrap_or(i64::from(Self::DEFAULT_LIMIT));

        let page = u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(PaginationError::InvalidPage)?;
        let limit = u32::try_from(limit)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or(PaginationError::InvalidLimit)?;

        Ok(Self { page, limit })
    }

    /// Build a page window, raising out-of-range values to 1 instead of failing.
    #[must_use]
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> Self {
        let clamp = |value: Option<i64>, default: u32| {
            value.map_or(default, |v| u32::try_from(v.max(1)).unwrap_or(u32::MAX))
        };

        Self {
            page: clamp(page, Self::DEFAULT_PAGE),
            limit: clamp(limit, Self::DEFAULT_LIMIT),
        }
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1).saturating_mul(i64::from(self.limit))
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

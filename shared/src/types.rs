//! Common types used across the platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Clamp page to at least 1 and per_page to 1..=MAX_PER_PAGE
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    /// Row offset for the current page
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }

    /// Metadata for a response holding `total_items` rows in all
    pub fn meta(&self, total_items: u64) -> PaginationMeta {
        let total_pages = total_items.div_ceil(self.per_page as u64) as u32;
        PaginationMeta {
            page: self.page,
            per_page: self.per_page,
            total_items,
            total_pages,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

/// Time source injected into services so tests can pin "now"
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_out_of_range_values() {
        let p = Pagination { page: 0, per_page: 1000 }.clamped();
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, Pagination::MAX_PER_PAGE);
    }

    #[test]
    fn pagination_offset_and_meta() {
        let p = Pagination { page: 3, per_page: 20 };
        assert_eq!(p.offset(), 40);

        let meta = p.meta(45);
        assert_eq!(meta.total_items, 45);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn fixed_clock_is_stable() {
        let at = Utc::now();
        let clock = Clock::Fixed(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.today(), at.date_naive());
    }
}

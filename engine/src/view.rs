//! Pagination and filter state kept alongside a snapshot.

use crate::filter::{self, Filter};
use serde::{Deserialize, Serialize};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// View state of a paginated collection.
///
/// Invariant: `page <= max(page_count() - 1, 0)`. Every transition below
/// re-establishes it, so a value obtained from a store is always consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Current page, zero based
    pub page: usize,
    /// Entities per page, always > 0
    pub page_size: usize,
    /// Active filter, if any
    pub filter: Option<Filter>,
    /// Total entities on the server, across all pages
    pub total_count: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    /// Empty view state. A zero page size is raised to 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            filter: None,
            total_count: 0,
        }
    }

    /// `ceil(total_count / page_size)`.
    pub fn page_count(&self) -> usize {
        self.total_count.div_ceil(self.page_size)
    }

    /// Highest valid page.
    pub fn last_page(&self) -> usize {
        self.page_count().saturating_sub(1)
    }

    /// Clamp any requested page, including negative ones, into range.
    pub fn clamp_page(&self, page: i64) -> usize {
        if page <= 0 {
            return 0;
        }
        usize::try_from(page)
            .unwrap_or(usize::MAX)
            .min(self.last_page())
    }

    /// State after the total count changed. Negative counts become 0.
    pub fn with_total_count(&self, total_count: i64) -> Self {
        let mut next = self.clone();
        next.total_count = usize::try_from(total_count.max(0)).unwrap_or(usize::MAX);
        next.page = next.page.min(next.last_page());
        next
    }

    /// State after moving to `page`.
    pub fn with_page(&self, page: i64) -> Self {
        let mut next = self.clone();
        next.page = self.clamp_page(page);
        next
    }

    /// State after replacing the filter.
    ///
    /// The page only goes back to 0 when the filter changed materially.
    pub fn with_filter(&self, filter: Option<Filter>) -> Self {
        let mut next = self.clone();
        if filter::is_material_change(self.filter.as_ref(), filter.as_ref()) {
            next.page = 0;
        }
        next.filter = filter;
        next.page = next.page.min(next.last_page());
        next
    }

    /// State for a freshly emptied collection. Page size and filter are kept.
    pub fn reset(&self) -> Self {
        Self {
            page: 0,
            page_size: self.page_size,
            filter: self.filter.clone(),
            total_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(page: usize, page_size: usize, total_count: usize) -> ViewState {
        ViewState {
            page,
            page_size,
            filter: None,
            total_count,
        }
    }

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(view(0, 10, 0).page_count(), 0);
        assert_eq!(view(0, 10, 1).page_count(), 1);
        assert_eq!(view(0, 10, 10).page_count(), 1);
        assert_eq!(view(0, 10, 11).page_count(), 2);
        assert_eq!(view(0, 50, 3).page_count(), 1);
    }

    #[test]
    fn zero_page_size_is_raised() {
        assert_eq!(ViewState::new(0).page_size, 1);
    }

    #[test]
    fn shrinking_total_clamps_page() {
        let next = view(4, 10, 100).with_total_count(12);
        assert_eq!(next.page_count(), 2);
        assert_eq!(next.page, 1);
    }

    #[test]
    fn negative_total_becomes_zero() {
        let next = view(3, 10, 100).with_total_count(-5);
        assert_eq!(next.total_count, 0);
        assert_eq!(next.page, 0);
    }

    #[test]
    fn traverse_clamps_both_ends() {
        let v = view(0, 10, 35);
        assert_eq!(v.with_page(2).page, 2);
        assert_eq!(v.with_page(99).page, 3);
        assert_eq!(v.with_page(-4).page, 0);
        assert_eq!(view(0, 10, 0).with_page(5).page, 0);
    }

    #[test]
    fn same_filter_keeps_page() {
        let filter = Filter::new().with("role", "admin");
        let v = view(0, 10, 100).with_filter(Some(filter.clone())).with_page(3);
        assert_eq!(v.with_filter(Some(filter)).page, 3);
    }

    #[test]
    fn different_filter_resets_page() {
        let v = view(0, 10, 100)
            .with_filter(Some(Filter::new().with("role", "admin")))
            .with_page(3);
        let next = v.with_filter(Some(Filter::new().with("role", "user")));
        assert_eq!(next.page, 0);
        assert_eq!(next.filter, Some(Filter::new().with("role", "user")));
    }

    #[test]
    fn clearing_filter_resets_page() {
        let v = view(0, 10, 100)
            .with_filter(Some(Filter::new()))
            .with_page(5);
        assert_eq!(v.with_filter(None).page, 0);
    }

    #[test]
    fn reset_keeps_filter_and_size() {
        let v = view(2, 20, 90).with_filter(Some(Filter::new().with("type", "u2f")));
        let r = v.reset();
        assert_eq!(r.page, 0);
        assert_eq!(r.total_count, 0);
        assert_eq!(r.page_size, 20);
        assert_eq!(r.filter, v.filter);
    }
}

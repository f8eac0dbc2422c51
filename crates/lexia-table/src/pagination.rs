//! Page arithmetic.

use serde::Serialize;

/// Pagination metadata for the current view.
///
/// `start_item` and `end_item` are 1-based inclusive display bounds. An
/// empty result has `total_pages == 0`, `start_item == end_item == 0`, and
/// the current page stays pinned at `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub start_item: usize,
    pub end_item: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    /// Computes metadata for `page` (already clamped) of `total_items`.
    pub fn compute(total_items: usize, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_items, page_size);
        let current_page = clamp_page(page, total_pages);
        let (start_item, end_item) = if total_items == 0 {
            (0, 0)
        } else {
            let start = (current_page - 1) * page_size + 1;
            (start, (current_page * page_size).min(total_items))
        };
        Pagination {
            total_items,
            total_pages,
            current_page,
            page_size,
            start_item,
            end_item,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }

    /// Index range of the current page within the processed rows.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }
}

/// `ceil(total_items / page_size)`; zero for an empty set.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Clamps a page number into `[1, max(1, total_pages)]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

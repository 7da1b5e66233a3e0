// src/pager.rs

//! Fixed-size pages over a [`ResultSet`], plus the navigation arithmetic.
//!
//! [`page`] never clamps: callers run the requested number through
//! [`Navigation`] first, so prev/next/jump logic lives in one place.

use crate::records::Record;
use crate::search::ResultSet;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Page sizes the portal offers.
pub const PAGE_SIZES: [usize; 3] = [10, 25, 50];

/// Buttons in the page strip.
pub const WINDOW_WIDTH: usize = 5;

pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(PAGE_SIZES[0]) {
    Some(n) => n,
    None => panic!("page sizes are positive"),
};

pub fn default_page_size() -> NonZeroUsize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page {requested} is out of range (1..={total_pages})")]
    OutOfRange {
        requested: usize,
        total_pages: usize,
    },
}

/// `ceil(len / page_size)`, never below 1.
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

#[derive(Debug)]
pub struct Page<'a> {
    pub items: Vec<&'a Record>,
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    offset: usize,
}

impl Page<'_> {
    /// 1-based inclusive positions shown on this page ("showing X-Y of N").
    pub fn range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        Some((self.offset + 1, self.offset + self.items.len()))
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total_pages
    }
}

/// Slice page `page_number` (1-based) out of `results`.
pub fn page(
    results: &ResultSet,
    page_size: NonZeroUsize,
    page_number: usize,
) -> Result<Page<'_>, PageError> {
    let total = total_pages(results.len(), page_size);
    if page_number == 0 || page_number > total {
        return Err(PageError::OutOfRange {
            requested: page_number,
            total_pages: total,
        });
    }
    let offset = (page_number - 1) * page_size.get();
    let items = results.iter().skip(offset).take(page_size.get()).collect();
    Ok(Page {
        items,
        number: page_number,
        total_pages: total,
        total_items: results.len(),
        offset,
    })
}

/// Page numbers for a strip of at most `width` buttons around `current`.
pub fn page_window(current: usize, total_pages: usize, width: usize) -> RangeInclusive<usize> {
    let total_pages = total_pages.max(1);
    let shown = width.clamp(1, total_pages);
    let start = current
        .saturating_sub(width / 2)
        .min(total_pages + 1 - shown)
        .max(1);
    start..=start + shown - 1
}

/// Current page position, always within `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    page: usize,
    total_pages: usize,
}

impl Navigation {
    pub fn new(requested: usize, total_pages: usize) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            page: Self::clamp(requested, total_pages),
            total_pages,
        }
    }

    pub fn clamp(requested: usize, total_pages: usize) -> usize {
        requested.clamp(1, total_pages.max(1))
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn next(self) -> Self {
        self.jump(self.page + 1)
    }

    pub fn prev(self) -> Self {
        self.jump(self.page.saturating_sub(1))
    }

    pub fn jump(self, requested: usize) -> Self {
        Self::new(requested, self.total_pages)
    }

    pub fn window(&self) -> RangeInclusive<usize> {
        page_window(self.page, self.total_pages, WINDOW_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{normalize_rows, Field};
    use std::sync::Arc;

    fn results(n: usize) -> ResultSet {
        let mut rows = vec![vec![Some("Customer Name".to_string())]];
        rows.extend((0..n).map(|i| vec![Some(format!("customer {i}"))]));
        ResultSet::all(Arc::from(normalize_rows(rows)))
    }

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn total_pages_is_ceiling_with_floor_of_one() {
        assert_eq!(total_pages(0, size(10)), 1);
        assert_eq!(total_pages(10, size(10)), 1);
        assert_eq!(total_pages(11, size(10)), 2);
        assert_eq!(total_pages(50, size(25)), 2);
        assert_eq!(total_pages(7, size(1)), 7);
        assert_eq!(default_page_size().get(), 10);
        assert_eq!(DEFAULT_PAGE_SIZE.get(), PAGE_SIZES[0]);
    }

    #[test]
    fn empty_result_is_one_empty_page() {
        let rs = results(0);
        let p = page(&rs, size(10), 1).unwrap();
        assert_eq!(p.total_pages, 1);
        assert!(p.items.is_empty());
        assert_eq!(p.range(), None);
        assert!(p.is_last());
    }

    #[test]
    fn pages_concatenate_back_to_the_result_set() {
        for (n, ps) in [(0, 3), (1, 1), (9, 3), (10, 5), (23, 10), (23, 7)] {
            let rs = results(n);
            let total = total_pages(n, size(ps));
            let mut seen = Vec::new();
            for number in 1..=total {
                let p = page(&rs, size(ps), number).unwrap();
                assert!(p.items.len() <= ps);
                seen.extend(p.items.iter().map(|r| r.get(Field::CustomerName).unwrap()));
            }
            let expected: Vec<_> = rs
                .iter()
                .map(|r| r.get(Field::CustomerName).unwrap())
                .collect();
            assert_eq!(seen, expected, "n={n} page_size={ps}");
        }
    }

    #[test]
    fn out_of_range_pages_are_rejected_not_clamped() {
        let rs = results(12);
        assert_eq!(
            page(&rs, size(10), 0).unwrap_err(),
            PageError::OutOfRange {
                requested: 0,
                total_pages: 2
            }
        );
        assert!(page(&rs, size(10), 3).is_err());
    }

    #[test]
    fn range_reports_showing_positions() {
        let rs = results(23);
        let p = page(&rs, size(10), 3).unwrap();
        assert_eq!(p.range(), Some((21, 23)));
        assert_eq!(p.total_items, 23);
    }

    #[test]
    fn navigation_clamps_every_move() {
        let nav = Navigation::new(0, 3);
        assert_eq!(nav.page(), 1);
        assert!(!nav.has_prev());
        assert_eq!(nav.prev().page(), 1);
        assert_eq!(nav.next().next().next().page(), 3);
        assert_eq!(nav.jump(99).page(), 3);
        assert!(!nav.jump(3).has_next());
        assert_eq!(Navigation::new(4, 0).page(), 1);
    }

    #[test]
    fn window_follows_the_current_page() {
        assert_eq!(page_window(1, 3, 5), 1..=3);
        assert_eq!(page_window(1, 10, 5), 1..=5);
        assert_eq!(page_window(6, 10, 5), 4..=8);
        assert_eq!(page_window(10, 10, 5), 6..=10);
        assert_eq!(page_window(1, 1, 5), 1..=1);
    }
}

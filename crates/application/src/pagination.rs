//! Cursor translation for offset/limit paged endpoints.

use metasync_core::{AppResult, PageCursor};

use crate::PageOptions;

/// Page size used when callers do not request a positive one.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Cursor for the next page; empty once the listing is exhausted.
    pub next_cursor: PageCursor,
}

impl<T> ListPage<T> {
    /// Creates a page with a continuation cursor.
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: PageCursor) -> Self {
        Self { items, next_cursor }
    }

    /// Creates the only page of an unpaged listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, PageCursor::start())
    }
}

/// Translates an opaque cursor and requested size into upstream parameters.
pub fn page_options(cursor: &PageCursor, page_size: i64) -> AppResult<PageOptions> {
    let offset = cursor.offset()?;
    let limit = u64::try_from(page_size)
        .ok()
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    Ok(PageOptions { limit, offset })
}

/// Computes the continuation cursor from the values reported on one page.
///
/// Each page is judged on its own reported `total`; no correction is made
/// when upstream reports inconsistent totals across pages.
#[must_use]
pub fn next_page_cursor(offset: u64, limit: u64, total: u64) -> PageCursor {
    match offset.checked_add(limit) {
        Some(next) if next < total => PageCursor::from_offset(next),
        _ => PageCursor::start(),
    }
}

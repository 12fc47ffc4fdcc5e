//! Offset pagination without a count query.
//!
//! A page of `page_size` items is served by fetching `page_size + 1` rows: the
//! extra row only signals that more results exist and is never returned.

use std::future::Future;

use crate::error::{AppError, Result};

/// A validated offset/size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(offset: i64, page_size: i64, max_page_size: i64) -> Result<Self> {
        if offset < 0 {
            return Err(AppError::ValidationFailure(
                "offset must not be negative".to_string(),
            ));
        }
        if page_size <= 0 || page_size > max_page_size {
            return Err(AppError::ValidationFailure(format!(
                "pageSize must be between 1 and {max_page_size}"
            )));
        }
        Ok(Self { offset, page_size })
    }

    /// Rows to request from the store for this page.
    pub fn fetch_limit(&self) -> i64 {
        self.page_size + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Trims rows fetched with `fetch_limit()` down to `page_size`.
    pub fn from_rows(mut rows: Vec<T>, page_size: i64) -> Self {
        let page_size = usize::try_from(page_size).unwrap_or(0);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        Page {
            items: rows,
            has_more,
        }
    }
}

/// Runs one range query through `fetch(offset, limit)` and shapes the result.
pub async fn page<T, F, Fut>(request: PageRequest, fetch: F) -> Result<Page<T>>
where
    F: FnOnce(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let rows = fetch(request.offset, request.fetch_limit()).await?;
    Ok(Page::from_rows(rows, request.page_size))
}

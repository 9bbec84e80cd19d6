//! Page-number pagination for the page list.

use crate::error::{AppError, AppResult};

/// Fixed number of items per page.
pub const PAGE_SIZE: i64 = 50;

/// PageWindow
///
/// A validated page request: which page, and the matching `LIMIT`/`OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageWindow {
    pub number: i64,
    pub limit: i64,
    pub offset: i64,
    pub total_pages: i64,
}

impl PageWindow {
    /// Validates `?page=` against the collection size. Page 1 always exists, even
    /// for an empty collection.
    pub fn new(raw_page: Option<&str>, count: i64) -> AppResult<Self> {
        let number = match raw_page {
            None => 1,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| AppError::InvalidPage)?,
        };

        let total_pages = match u64::try_from(count) {
            Ok(count) if count > 0 => count.div_ceil(PAGE_SIZE as u64) as i64,
            _ => 1,
        };
        if number < 1 || number > total_pages {
            return Err(AppError::InvalidPage);
        }

        Ok(Self {
            number,
            limit: PAGE_SIZE,
            offset: (number - 1) * PAGE_SIZE,
            total_pages,
        })
    }

    pub fn next_link(&self, base: &str) -> Option<String> {
        (self.number < self.total_pages).then(|| format!("{base}?page={}", self.number + 1))
    }

    /// The link to page 1 carries no page parameter.
    pub fn previous_link(&self, base: &str) -> Option<String> {
        match self.number {
            1 => None,
            2 => Some(base.to_string()),
            n => Some(format!("{base}?page={}", n - 1)),
        }
    }
}

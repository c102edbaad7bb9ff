//! Pagination window and the list response envelope.
//!
//! A [`PageWindow`] exists only when pagination is active (`page >= 0` and
//! `per_page > 0`). Reads without a window return every matching document.
//! [`Envelope`] is the shape every list response takes.

use serde::{Deserialize, Serialize};

/// An active pagination window over a result set.
///
/// # Example
///
/// ```ignore
/// use docrest::page::PageWindow;
///
/// let window = PageWindow::new(Some(2), Some(10)).unwrap();
/// assert_eq!(window.skip(), 20);
/// assert!(window.has_more(31));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Zero-based page index.
    pub page: u64,
    /// Number of documents per page.
    pub per_page: u64,
}

impl PageWindow {
    /// Returns a window when both values are present and pagination is active.
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Option<Self> {
        let page = u64::try_from(page?).ok()?;
        let per_page = u64::try_from(per_page?).ok().filter(|n| *n > 0)?;
        Some(PageWindow { page, per_page })
    }

    /// Number of documents before this page.
    pub fn skip(&self) -> u64 {
        self.page.saturating_mul(self.per_page)
    }

    /// Maximum number of documents on this page.
    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Whether documents remain past this page given the total match count.
    pub fn has_more(&self, total_count: u64) -> bool {
        total_count > self.page.saturating_add(1).saturating_mul(self.per_page)
    }
}

/// The `{data, hasMore, totalCount}` body of list responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// The documents on this page.
    pub data: Vec<T>,
    /// Whether a further page exists.
    pub has_more: bool,
    /// Total number of matching documents across all pages.
    pub total_count: u64,
}

impl<T> Envelope<T> {
    /// Creates a new builder for constructing an envelope around `data`.
    pub fn builder(data: Vec<T>) -> EnvelopeBuilder<T> {
        EnvelopeBuilder::new(data)
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self { data: Vec::new(), has_more: false, total_count: 0 }
    }
}

pub struct EnvelopeBuilder<T> {
    data: Vec<T>,
    has_more: bool,
    total_count: Option<u64>,
}

impl<T> EnvelopeBuilder<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data, has_more: false, total_count: None }
    }

    /// Sets the total count. Defaults to the length of `data`.
    pub fn with_total_count(mut self, total_count: u64) -> Self {
        self.total_count = Some(total_count);
        self
    }

    /// Derives `has_more` from an optional window and the total count.
    pub fn with_window(mut self, window: Option<&PageWindow>, total_count: u64) -> Self {
        self.has_more = window.is_some_and(|w| w.has_more(total_count));
        self.total_count = Some(total_count);
        self
    }

    pub fn build(self) -> Envelope<T> {
        let total_count = self.total_count.unwrap_or(self.data.len() as u64);
        Envelope { data: self.data, has_more: self.has_more, total_count }
    }
}

//! Page windowing over sorted rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Rows per page, restricted to the sizes the table offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    Twenty,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    /// All offered sizes, smallest first.
    pub const ALL: [PageSize; 5] = [
        PageSize::Ten,
        PageSize::Twenty,
        PageSize::TwentyFive,
        PageSize::Fifty,
        PageSize::Hundred,
    ];

    pub fn get(self) -> usize {
        match self {
            PageSize::Ten => 10,
            PageSize::Twenty => 20,
            PageSize::TwentyFive => 25,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = QueryError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        PageSize::ALL
            .into_iter()
            .find(|size| size.get() == n)
            .ok_or(QueryError::InvalidPageSize(n))
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> usize {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Requested page: size and 1-based index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(rename = "page_size")]
    pub size: PageSize,
    #[serde(rename = "page_index")]
    pub index: usize,
}

impl Default for PageSpec {
    fn default() -> Self {
        PageSpec {
            size: PageSize::default(),
            index: 1,
        }
    }
}

impl PageSpec {
    pub fn new(size: PageSize, index: usize) -> Self {
        PageSpec { size, index }
    }

    /// First page at the given size.
    pub fn first(size: PageSize) -> Self {
        PageSpec { size, index: 1 }
    }

    /// Changes the page size, returning to the first page.
    pub fn with_size(self, size: PageSize) -> Self {
        PageSpec::first(size)
    }

    /// Moves to another page index. Clamping happens against a row count.
    pub fn with_index(self, index: usize) -> Self {
        PageSpec { index, ..self }
    }

    /// Number of pages needed for `count` rows; never less than one.
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.size.get()).max(1)
    }

    /// The index clamped into `[1, total_pages(count)]`.
    pub fn clamped_index(&self, count: usize) -> usize {
        self.index.clamp(1, self.total_pages(count))
    }

    /// This spec with its index clamped against `count` rows.
    pub fn clamp(self, count: usize) -> Self {
        PageSpec {
            index: self.clamped_index(count),
            ..self
        }
    }
}

/// One page of rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// The index actually served, after clamping.
    pub page_index: usize,
    pub total_pages: usize,
}

/// Slices `rows` to the requested page.
///
/// The index is clamped first, so an index past the end serves the last
/// page and index `0` serves the first.
pub fn paginate<T>(rows: &[T], page: PageSpec) -> Page<'_, T> {
    let total_pages = page.total_pages(rows.len());
    let page_index = page.clamped_index(rows.len());
    let size = page.size.get();

    let start = ((page_index - 1) * size).min(rows.len());
    let end = (page_index * size).min(rows.len());

    Page {
        items: &rows[start..end],
        page_index,
        total_pages,
    }
}

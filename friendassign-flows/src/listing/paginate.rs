use anyhow::{Result, bail};
use serde::Serialize;

/// Three cards per row in the grouped grid.
pub const GRID_ROW_SIZE: usize = 3;
pub const COMPACT_PAGE_SIZE: usize = 4;
pub const DEFAULT_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageControl {
    pub number: usize,
    pub active: bool,
}

/// Fixed-size pages with a 1-based current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    size: usize,
    current: usize,
}

impl Pagination {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            bail!("page size must be at least 1");
        }
        Ok(Self { size, current: 1 })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Moves to `page`, clamped into `1..=page_count(len)`.
    pub fn go_to(&mut self, page: usize, len: usize) {
        self.current = page.clamp(1, self.page_count(len).max(1));
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }

    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.size)
    }

    /// The slice of `items` on the current page. Empty past the last page.
    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current - 1).saturating_mul(self.size);
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.size).min(items.len());
        &items[start..end]
    }

    pub fn controls(&self, len: usize) -> Vec<PageControl> {
        (1..=self.page_count(len))
            .map(|number| PageControl {
                number,
                active: number == self.current,
            })
            .collect()
    }

    /// Every page in order; concatenated they give back `items`.
    pub fn pages<'a, T>(&self, items: &'a [T]) -> impl Iterator<Item = &'a [T]> + 'a {
        items.chunks(self.size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            size: DEFAULT_PAGE_SIZE,
            current: 1,
        }
    }
}

//! Page slicing over an in-memory sequence.

/// Returns the 1-based `page` of `items`. Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

#[derive(Debug, Clone)]
pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: usize,
    current_page: usize,
}

impl<'a, T> Paginator<'a, T> {
    /// A page size of zero is treated as one.
    pub fn new(items: &'a [T], page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.items.len(), self.page_size)
    }

    pub fn paginated_items(&self) -> &'a [T] {
        paginate(self.items, self.current_page, self.page_size)
    }

    /// Moves to `page` if it lies in `1..=total_pages`. Returns whether it moved.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
            true
        } else {
            false
        }
    }
}

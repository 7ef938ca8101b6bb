/// Incremental renderer: hands out fixed-size batches of tile indices in
/// increasing order until the whole collection is rendered.
use std::ops::Range;

/// Progress through a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCursor {
    pub rendered_count: usize,
    pub batch_size: usize,
    pub total: usize,
}

impl BatchCursor {
    pub fn remaining(&self) -> usize {
        self.total - self.rendered_count
    }

    pub fn is_complete(&self) -> bool {
        self.rendered_count >= self.total
    }
}

#[derive(Debug, Clone)]
pub struct IncrementalRenderer {
    cursor: BatchCursor,
}

impl IncrementalRenderer {
    /// `batch_size` is fixed for the lifetime of the view
    pub fn new(total: usize, batch_size: usize) -> Self {
        Self {
            cursor: BatchCursor {
                rendered_count: 0,
                batch_size: batch_size.max(1),
                total,
            },
        }
    }

    pub fn cursor(&self) -> BatchCursor {
        self.cursor
    }

    pub fn rendered_count(&self) -> usize {
        self.cursor.rendered_count
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    /// Index of the last rendered tile, the one to watch for the next trigger
    pub fn last_rendered(&self) -> Option<usize> {
        self.cursor.rendered_count.checked_sub(1)
    }

    /// Indices of the next `min(batch_size, remaining)` tiles.
    /// `None` once everything is rendered.
    pub fn next_batch(&mut self) -> Option<Range<usize>> {
        if self.cursor.is_complete() {
            return None;
        }

        let start = self.cursor.rendered_count;
        let end = start + self.cursor.batch_size.min(self.cursor.remaining());
        self.cursor.rendered_count = end;

        log::debug!(
            "Rendering batch {}..{} of {}",
            start,
            end,
            self.cursor.total
        );
        Some(start..end)
    }
}

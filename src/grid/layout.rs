/// Masonry layout for the photo grid
///
/// Each tile goes into the currently shortest column. Packing is a pure
/// function of the configuration and the tile heights, so packing twice
/// without a tile change gives the same arrangement.
use super::observer::Span;

/// Column sizing for the masonry layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasonryConfig {
    /// Width of each column (tile width)
    pub column_width: f32,
    /// Spacing between columns and rows
    pub gutter: f32,
    /// Number of columns
    pub num_columns: usize,
}

impl MasonryConfig {
    pub fn new(column_width: f32, gutter: f32, num_columns: usize) -> Self {
        Self {
            column_width,
            gutter,
            num_columns: num_columns.max(1),
        }
    }

    /// Config for a container of the given width
    pub fn for_width(available_width: f32, column_width: f32, gutter: f32) -> Self {
        Self::new(
            column_width,
            gutter,
            Self::columns_for_width(available_width, column_width, gutter),
        )
    }

    /// Number of columns that fit in the given width
    pub fn columns_for_width(available_width: f32, column_width: f32, gutter: f32) -> usize {
        let stride = column_width + gutter;
        // A zero or negative stride would fit infinitely many columns
        if stride.is_nan() || stride <= 0.0 || !available_width.is_finite() {
            return 1;
        }

        // N * column_width + (N-1) * gutter <= available_width
        ((available_width + gutter) / stride).floor().max(1.0) as usize
    }
}

/// A positioned tile
#[derive(Debug, Clone, PartialEq)]
pub struct MasonryItem {
    /// Index in the source list
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub column: usize,
}

/// Result of packing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MasonryLayout {
    /// Positioned items, in input order
    pub items: Vec<MasonryItem>,
    /// Total content height (tallest column)
    pub content_height: f32,
    pub column_heights: Vec<f32>,
}

impl MasonryLayout {
    /// Vertical extent of item `index`
    pub fn span(&self, index: usize) -> Option<Span> {
        // Items are usually packed in index order
        self.items
            .get(index)
            .filter(|item| item.index == index)
            .or_else(|| self.items.iter().find(|item| item.index == index))
            .map(|item| Span {
                top: item.y,
                bottom: item.y + item.height,
            })
    }

    /// Item indices per column, top to bottom
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns = vec![Vec::new(); self.column_heights.len()];
        for item in &self.items {
            if let Some(column) = columns.get_mut(item.column) {
                column.push(item.index);
            }
        }
        columns
    }
}

/// Input for one tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSize {
    pub index: usize,
    pub height: f32,
}

/// Place every item into the shortest column. Ties go to the leftmost column.
pub fn pack(config: &MasonryConfig, items: &[ItemSize]) -> MasonryLayout {
    let mut column_heights: Vec<f32> = vec![0.0; config.num_columns];
    let mut layout_items = Vec::with_capacity(items.len());

    for item in items {
        let column = shortest_column(&column_heights);
        let y = column_heights[column];

        layout_items.push(MasonryItem {
            index: item.index,
            x: column as f32 * (config.column_width + config.gutter),
            y,
            width: config.column_width,
            height: item.height,
            column,
        });

        column_heights[column] = y + item.height + config.gutter;
    }

    // Drop the trailing gutter of non-empty columns
    let column_heights: Vec<f32> = column_heights
        .into_iter()
        .map(|h| if h > 0.0 { h - config.gutter } else { 0.0 })
        .collect();
    let content_height = column_heights.iter().cloned().fold(0.0f32, f32::max);

    MasonryLayout {
        items: layout_items,
        content_height,
        column_heights,
    }
}

fn shortest_column(heights: &[f32]) -> usize {
    let mut best = 0;
    for (i, h) in heights.iter().enumerate() {
        if *h < heights[best] {
            best = i;
        }
    }
    best
}

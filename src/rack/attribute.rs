use crate::rack::label::is_block_end;
use crate::rack::normalize;
use crate::rack::Grid;

/// Rows walked upward when looking for a shared top border.
const TOP_BORDER_SCAN_LIMIT: usize = 10;
/// Rows walked downward when reading an attribute value.
const ATTRIBUTE_SCAN_LIMIT: usize = 20;

/// Strategy for reading one attribute column (vendor, model, or serial)
/// aligned with a label block.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum AttributeScan {
    /// Read the first value inside the label block's own span.
    #[default]
    Forward,
    /// Walk up to the column's shared top border first, then down. Kept for
    /// layouts where an attribute is announced once above several devices.
    Backward,
}

impl AttributeScan {
    /// Returns the attribute value aligned with a label block starting at
    /// (row, col), or None when the column holds nothing for that block.
    pub fn extract<G: Grid>(&self, grid: &G, row: usize, col: usize, unit_span: usize) -> Option<String> {
        match self {
            Self::Forward => forward(grid, row, col, unit_span),
            Self::Backward => backward(grid, row, col),
        }
    }
}

/// First non-empty value within the block's own span.
fn forward<G: Grid>(grid: &G, row: usize, col: usize, unit_span: usize) -> Option<String> {
    (row..row + unit_span)
        .find_map(|x| grid.text(x, col))
        .map(|text| normalize(&text))
}

/// Re-scan from the column's shared top border downward, stopping at a block
/// boundary.
fn backward<G: Grid>(grid: &G, row: usize, col: usize) -> Option<String> {
    let mut start = row;
    if !grid.has_top_border(row, col) {
        for x in (row.saturating_sub(TOP_BORDER_SCAN_LIMIT)..row).rev() {
            if grid.has_top_border(x, col) {
                start = x;
                break;
            }
        }
    }
    let mut size = 1usize;
    for x in start..start + ATTRIBUTE_SCAN_LIMIT {
        if let Some(text) = grid.text(x, col) {
            return Some(normalize(&text));
        }
        if is_block_end(grid, x, col, size) {
            return None;
        }
        size += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rack::tests::MemoryGrid;

    #[test]
    fn forward_finds_first_value_in_span() {
        let mut grid = MemoryGrid::default();
        grid.set_text(4, 3, "R740");

        assert_eq!(AttributeScan::Forward.extract(&grid, 3, 3, 3), Some("R740".to_owned()));
        assert_eq!(AttributeScan::Forward.extract(&grid, 3, 3, 1), None);
        assert_eq!(AttributeScan::Forward.extract(&grid, 3, 4, 3), None);
    }

    #[test]
    fn forward_normalizes_whitespace() {
        let mut grid = MemoryGrid::default();
        grid.set_text(0, 0, "Power  Edge\nR740");

        assert_eq!(
            AttributeScan::Forward.extract(&grid, 0, 0, 1),
            Some("Power Edge R740".to_owned())
        );
    }

    #[test]
    fn backward_reads_attribute_announced_above() {
        let mut grid = MemoryGrid::default();
        // one vendor cell at the column's top border covers rows 2..=6
        grid.set_top(2, 5);
        grid.set_text(2, 5, "Dell");
        grid.set_bottom(6, 5);

        assert_eq!(AttributeScan::Backward.extract(&grid, 5, 5, 1), Some("Dell".to_owned()));
        // the forward strategy only sees the block's own rows
        assert_eq!(AttributeScan::Forward.extract(&grid, 5, 5, 1), None);
    }

    #[test]
    fn backward_stops_at_block_boundary() {
        let mut grid = MemoryGrid::default();
        grid.set_top(2, 5);
        grid.set_bottom(3, 5);
        grid.set_text(5, 5, "unrelated");

        assert_eq!(AttributeScan::Backward.extract(&grid, 3, 5, 1), None);
    }
}

use crate::rack::normalize;
use crate::rack::Grid;

/// Upper bound on rows walked while accumulating one label block.
/// Physical racks are far shorter; a block that never closes inside this
/// bound is ambiguous and treated as no device.
const LABEL_SCAN_LIMIT: usize = 40;

/// A device label spanning one or more rack units.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelBlock {
    /// Accumulated label text
    pub name: String,
    /// Unit span, the number of contiguous rows in the block
    pub size: usize,
    /// Row the block starts at
    pub start_row: usize,
    /// Label column
    pub column: usize,
}

/// Extracts the label block starting at (row, col), if one starts there.
///
/// A block starts where the cell has a top border, or where the cell directly
/// above carries a bottom border and is not merged (some sheets draw a
/// block's top edge on the previous row). Accumulation walks downward,
/// appending non-empty cell text, until a bottom border on the current cell
/// or a top border on the next row closes the block.
pub fn extract_label<G: Grid>(grid: &G, row: usize, col: usize) -> Option<LabelBlock> {
    if !starts_block(grid, row, col) {
        return None;
    }
    let mut name = String::new();
    let mut size = 1usize;
    for x in row..row + LABEL_SCAN_LIMIT {
        if let Some(text) = grid.text(x, col) {
            name.push_str(&normalize(&text));
        }
        if is_block_end(grid, x, col, size) {
            return Some(LabelBlock {
                name: name.trim().to_owned(),
                size,
                start_row: row,
                column: col,
            });
        }
        size += 1;
    }
    None
}

/// Checks the block start condition at (row, col).
fn starts_block<G: Grid>(grid: &G, row: usize, col: usize) -> bool {
    if grid.has_top_border(row, col) {
        return true;
    }
    row > 0 && grid.has_bottom_border(row - 1, col) && !grid.is_merged(row - 1, col)
}

/// Checks whether the block ends at (row, col).
///
/// The first row of a merged range never ends a block: merged ranges carry
/// the range's border on every constituent cell, so the bottom edge only
/// counts once the walk has moved past the first row.
pub(super) fn is_block_end<G: Grid>(grid: &G, row: usize, col: usize, size: usize) -> bool {
    if size == 1 && grid.is_merged(row, col) {
        return false;
    }
    grid.has_bottom_border(row, col) || grid.has_top_border(row + 1, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rack::tests::MemoryGrid;

    #[test]
    fn no_borders_means_no_block_anywhere() {
        let mut grid = MemoryGrid::default();
        grid.set_text(1, 1, "server-01");
        grid.set_text(2, 1, "server-02");

        for row in 0..5 {
            for col in 0..3 {
                assert_eq!(extract_label(&grid, row, col), None);
            }
        }
    }

    #[test]
    fn single_unit_block() {
        let mut grid = MemoryGrid::default();
        grid.set_text(2, 1, "core-sw-01");
        grid.set_top(2, 1);
        grid.set_bottom(2, 1);

        let block = extract_label(&grid, 2, 1).expect("block");
        assert_eq!(block.name, "core-sw-01");
        assert_eq!(block.size, 1);
        assert_eq!(block.start_row, 2);
        assert_eq!(block.column, 1);
    }

    #[test]
    fn multi_unit_block_concatenates_text() {
        let mut grid = MemoryGrid::default();
        grid.set_top(3, 2);
        grid.set_text(3, 2, "storage-");
        grid.set_text(4, 2, "array-01");
        grid.set_bottom(5, 2);

        let block = extract_label(&grid, 3, 2).expect("block");
        assert_eq!(block.name, "storage-array-01");
        assert_eq!(block.size, 3);
    }

    #[test]
    fn block_closed_by_next_row_top_border() {
        let mut grid = MemoryGrid::default();
        grid.set_top(1, 0);
        grid.set_text(1, 0, "fw-01");
        grid.set_top(3, 0);

        let block = extract_label(&grid, 1, 0).expect("block");
        assert_eq!(block.size, 2);
    }

    #[test]
    fn block_recovered_from_previous_row_bottom_border() {
        let mut grid = MemoryGrid::default();
        // the author drew the top edge as the previous row's bottom border
        grid.set_bottom(1, 1);
        grid.set_text(2, 1, "router-01");
        grid.set_bottom(2, 1);

        let block = extract_label(&grid, 2, 1).expect("block");
        assert_eq!(block.name, "router-01");
        assert_eq!(block.size, 1);
    }

    #[test]
    fn previous_row_bottom_border_inside_merge_does_not_start() {
        let mut grid = MemoryGrid::default();
        grid.set_bottom(1, 1);
        grid.set_merged(1, 1, 1);
        grid.set_text(2, 1, "router-01");
        grid.set_bottom(2, 1);

        assert_eq!(extract_label(&grid, 2, 1), None);
    }

    #[test]
    fn merged_first_row_does_not_end_the_block() {
        let mut grid = MemoryGrid::default();
        grid.set_top(2, 1);
        grid.set_text(2, 1, "san-01");
        // merged range rows 2..=4; the anchor cell reports the range's
        // bottom edge as well as its top
        grid.set_merged(2, 4, 1);
        grid.set_bottom(2, 1);
        grid.set_bottom(4, 1);

        let block = extract_label(&grid, 2, 1).expect("block");
        assert_eq!(block.name, "san-01");
        assert_eq!(block.size, 3);
    }

    #[test]
    fn unbounded_block_is_no_device() {
        let mut grid = MemoryGrid::default();
        grid.set_top(0, 0);
        grid.set_text(0, 0, "mystery");

        assert_eq!(extract_label(&grid, 0, 0), None);
    }
}

use crate::rack::token::RackToken;
use crate::rack::Grid;
use crate::rack::ScanOptions;

/// A located rack: the cell holding the rack id and the parsed token.
/// The token's column is the label column; unit numbers sit one column left.
#[derive(Clone, Debug)]
pub struct RackAnchor {
    pub row: usize,
    pub col: usize,
    pub token: RackToken,
}

/// Lazy row-major scan for rack id cells.
///
/// Consecutive empty cells beyond the buffer abandon the rest of a row, and
/// consecutive rows without any value beyond the buffer abandon the sheet.
/// This bounds the scan on sparse sheets without a fixed size limit; a rack
/// region preceded by a gap larger than the buffer is silently missed.
pub struct RackLocator<'a, G: Grid> {
    grid: &'a G,
    max_row: usize,
    max_col: usize,
    empty_buffer: usize,
    row: usize,
    col: usize,
    empty_cells: usize,
    empty_rows: usize,
    row_has_value: bool,
    done: bool,
}

impl<'a, G: Grid> RackLocator<'a, G> {
    pub fn new(grid: &'a G, options: &ScanOptions) -> Self {
        RackLocator {
            grid,
            max_row: options.max_row,
            max_col: options.max_col,
            empty_buffer: options.empty_buffer,
            row: 0,
            col: 0,
            empty_cells: 0,
            empty_rows: 0,
            row_has_value: false,
            done: false,
        }
    }
}

impl<'a, G: Grid> Iterator for RackLocator<'a, G> {
    type Item = RackAnchor;

    fn next(&mut self) -> Option<RackAnchor> {
        if self.done {
            return None;
        }
        while self.row < self.max_row {
            while self.col < self.max_col {
                let col = self.col;
                self.col += 1;
                match self.grid.text(self.row, col) {
                    Some(text) => {
                        self.empty_cells = 0;
                        self.row_has_value = true;
                        if let Some(token) = RackToken::parse(&text) {
                            return Some(RackAnchor {
                                row: self.row,
                                col,
                                token,
                            });
                        }
                    }
                    None => {
                        self.empty_cells += 1;
                        if self.empty_cells > self.empty_buffer {
                            break; // abandon the rest of this row
                        }
                    }
                }
            }
            if self.row_has_value {
                self.empty_rows = 0;
            } else {
                self.empty_rows += 1;
                if self.empty_rows > self.empty_buffer {
                    break; // abandon the worksheet
                }
            }
            self.row += 1;
            self.col = 0;
            self.empty_cells = 0;
            self.row_has_value = false;
        }
        self.done = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rack::tests::MemoryGrid;
    use crate::rack::ScanOptions;

    fn options(empty_buffer: usize) -> ScanOptions {
        ScanOptions {
            max_row: 100,
            max_col: 20,
            empty_buffer,
            ..ScanOptions::default()
        }
    }

    #[test]
    fn locator_finds_tokens_row_major() {
        let mut grid = MemoryGrid::default();
        grid.set_text(0, 2, "MS1.DC2.A1");
        grid.set_text(0, 7, "MS1.DC2.A2");
        grid.set_text(5, 1, "MS1.DC2.B1");

        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(10)).collect();
        let ids: Vec<String> = anchors.iter().map(|anchor| anchor.token.id()).collect();
        assert_eq!(ids, vec!["MS1.DC2.A1", "MS1.DC2.A2", "MS1.DC2.B1"]);
        assert_eq!(anchors[0].row, 0);
        assert_eq!(anchors[0].col, 2);
    }

    #[test]
    fn locator_ignores_non_token_text() {
        let mut grid = MemoryGrid::default();
        grid.set_text(0, 0, "Rack overview");
        grid.set_text(1, 0, "MS1.DC2.A1 (old)");

        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(10)).collect();
        assert!(anchors.is_empty());
    }

    #[test]
    fn locator_abandons_row_past_empty_buffer() {
        let mut grid = MemoryGrid::default();
        // token sits beyond 3 consecutive empty cells
        grid.set_text(0, 0, "x");
        grid.set_text(0, 6, "MS1.DC2.A1");

        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(3)).collect();
        assert!(anchors.is_empty());

        // a larger buffer reaches it
        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(5)).collect();
        assert_eq!(anchors.len(), 1);
    }

    #[test]
    fn locator_abandons_sheet_past_empty_rows() {
        let mut grid = MemoryGrid::default();
        grid.set_text(0, 0, "x");
        // rows 1..=4 empty, token on row 5
        grid.set_text(5, 0, "MS1.DC2.A1");

        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(3)).collect();
        assert!(anchors.is_empty());

        let anchors: Vec<RackAnchor> = RackLocator::new(&grid, &options(4)).collect();
        assert_eq!(anchors.len(), 1);
    }
}

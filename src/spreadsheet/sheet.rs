use crate::error::RackScanError;
use crate::rack::Grid;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::reference::reference_to_index;
use std::collections::HashMap;
use thiserror::Error;

/// Errors related to merged-range references.
#[derive(Error, Debug)]
pub enum MergedRangeError {
    #[error("Invalid merged range reference '{0}'")]
    ReferenceError(String),
}

/// A rectangular merged cell range (all bounds inclusive, 0-based).
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct MergedRange {
    pub(crate) row_lower_bound: usize,
    pub(crate) row_upper_bound: usize,
    pub(crate) col_lower_bound: usize,
    pub(crate) col_upper_bound: usize,
}

impl MergedRange {
    /// Checks whether a position falls inside the range.
    pub(crate) fn contains(&self, row: usize, col: usize) -> bool {
        self.row_lower_bound <= row
            && row <= self.row_upper_bound
            && self.col_lower_bound <= col
            && col <= self.col_upper_bound
    }
}

impl TryFrom<&str> for MergedRange {
    type Error = RackScanError;

    /// Parses a merged range reference (e.g. "A1:B3").
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let (start, end) = value
            .split_once(':')
            .ok_or_else(|| MergedRangeError::ReferenceError(value.to_owned()))?;
        let start = reference_to_index(start)
            .ok_or_else(|| MergedRangeError::ReferenceError(value.to_owned()))?;
        let end = reference_to_index(end)
            .ok_or_else(|| MergedRangeError::ReferenceError(value.to_owned()))?;
        Ok(MergedRange {
            row_lower_bound: start.0.min(end.0),
            row_upper_bound: start.0.max(end.0),
            col_lower_bound: start.1.min(end.1),
            col_upper_bound: start.1.max(end.1),
        })
    }
}

/// One worksheet loaded for random access: all retained cells with a
/// position index, plus the worksheet's merged ranges.
pub struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All retained cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Index mapping from (row, col) to cell vector position
    pub(crate) indexes: HashMap<(usize, usize), usize>,
    /// Merged cell ranges
    pub(crate) merges: Vec<MergedRange>,
}

impl Sheet {
    /// Creates an empty sheet.
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Sheet {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            indexes: HashMap::new(),
            merges: Vec::new(),
        }
    }

    /// Returns the worksheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Adds a cell to the sheet, keeping the position index current.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.indexes.insert((cell.row, cell.col), self.cells.len());
        self.cells.push(cell);
    }

    /// Adds a merged range to the sheet.
    pub(crate) fn push_merge(&mut self, merge: MergedRange) {
        self.merges.push(merge);
    }

    /// Gets the cell at a position, if one was retained there.
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }
}

impl Grid for Sheet {
    /// Trimmed display text of the cell, None when the position is empty.
    fn text(&self, row: usize, col: usize) -> Option<String> {
        self.get(row, col)
            .map(|cell| cell.to_string().trim().to_owned())
            .filter(|text| !text.is_empty())
    }

    /// Plain integer value of the cell; booleans never qualify.
    fn integer(&self, row: usize, col: usize) -> Option<i64> {
        self.get(row, col).and_then(Cell::to_integer)
    }

    fn has_top_border(&self, row: usize, col: usize) -> bool {
        self.get(row, col).map(|cell| cell.top_border).unwrap_or(false)
    }

    fn has_bottom_border(&self, row: usize, col: usize) -> bool {
        self.get(row, col).map(|cell| cell.bottom_border).unwrap_or(false)
    }

    fn is_merged(&self, row: usize, col: usize) -> bool {
        self.merges.iter().any(|merge| merge.contains(row, col))
    }
}

//! # Spreadsheet Access Module
//!
//! Reads XLSX workbooks into random-access [`sheet::Sheet`] values carrying
//! everything the rack parser consumes: cell values, top/bottom border flags
//! resolved through the workbook's cell formats, and merged-range membership.
pub(crate) mod cell;
pub(crate) mod reference;
pub mod sheet;
pub mod xlsx;

use glob::Pattern;
use thiserror::Error;

/// Errors raised while reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// A required archive entry is missing
    #[error("Missing workbook entry '{0}'")]
    FileError(String),

    /// The workbook declares no worksheets
    #[error("No worksheets in '{0}'")]
    EmptyWorkbookError(String),
}

/// Worksheet selection by name patterns.
/// An empty filter accepts every worksheet.
#[derive(Clone, Debug, Default)]
pub struct SheetFilter {
    patterns: Option<Vec<Pattern>>,
}

impl SheetFilter {
    /// Builds a filter from glob patterns; `None` accepts all sheets.
    pub fn new(patterns: Option<Vec<Pattern>>) -> Self {
        SheetFilter { patterns }
    }

    /// Checks if a sheet name matches the filter patterns.
    /// Returns true if no patterns are specified or if name matches any pattern.
    pub(crate) fn accept(&self, sheet_name: &str) -> bool {
        if let Some(patterns) = &self.patterns {
            for pattern in patterns {
                if pattern.matches(sheet_name) {
                    return true;
                }
            }
            false
        } else {
            true
        }
    }
}

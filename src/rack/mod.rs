//! # Rack Diagram Parser
//!
//! Reconstructs equipment records from rack elevation diagrams using nothing
//! but cell values, border presence, and merge state. A rack is announced by
//! a rack-id cell; unit numbers run down the column left of it; device labels
//! are bordered or merged blocks in the rack-id column; vendor, model, and
//! serial sit in the three columns to the right.
//!
//! Every extractor is a pure function of a [`Grid`] and a position, so the
//! whole pipeline is exercised against synthetic in-memory grids as well as
//! real worksheets.
pub mod attribute;
pub mod device;
pub mod label;
pub mod locator;
pub mod record;
pub mod token;

use crate::addressbook::AddressBook;
use crate::error::RackScanError;
use crate::rack::attribute::AttributeScan;
use crate::rack::device::prepare_device;
use crate::rack::device::Assembly;
use crate::rack::device::IgnoreList;
use crate::rack::label::extract_label;
use crate::rack::locator::RackAnchor;
use crate::rack::locator::RackLocator;
use crate::rack::record::DeviceRecord;
use crate::rack::record::IgnoredRecord;
use crate::rack::record::ScanCounters;
use crate::rack::record::ScanObserver;

/// Rows scanned below a rack anchor for unit numbers. Physical racks are
/// bounded (typically 48U or less); the cap keeps the scan out of unrelated
/// sheet regions.
const RACK_SCAN_LIMIT: usize = 60;

/// The core's view of one worksheet. Positions are 0-based (row, col).
pub trait Grid {
    /// Trimmed cell text, None when the position is empty.
    fn text(&self, row: usize, col: usize) -> Option<String>;

    /// Plain integer value; booleans and date-formatted numbers never
    /// qualify.
    fn integer(&self, row: usize, col: usize) -> Option<i64>;

    fn has_top_border(&self, row: usize, col: usize) -> bool;

    fn has_bottom_border(&self, row: usize, col: usize) -> bool;

    fn is_merged(&self, row: usize, col: usize) -> bool;
}

/// Scan bounds and strategy selection for one run.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Rows scanned per worksheet
    pub max_row: usize,
    /// Columns scanned per row
    pub max_col: usize,
    /// Consecutive empty cells (or rows) tolerated before abandoning the
    /// rest of a row (or the worksheet)
    pub empty_buffer: usize,
    /// Attribute column reading strategy
    pub attribute_scan: AttributeScan,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            max_row: 2000,
            max_col: 100,
            empty_buffer: 20,
            attribute_scan: AttributeScan::default(),
        }
    }
}

/// Collapses whitespace runs and field-separator characters to single
/// spaces.
pub(crate) fn normalize(text: &str) -> String {
    text.replace(';', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything one scan pass reads but never mutates. Passing this context
/// explicitly keeps every extraction call free of hidden shared state.
struct ScanContext<'a, G: Grid> {
    grid: &'a G,
    options: &'a ScanOptions,
    addresses: &'a AddressBook,
    ignore: &'a IgnoreList,
}

/// Scans one worksheet, reporting every located rack and every accepted or
/// ignored slot to the observer in locator order.
pub fn scan_sheet<G: Grid>(
    grid: &G,
    options: &ScanOptions,
    addresses: &AddressBook,
    ignore: &IgnoreList,
    counters: &mut ScanCounters,
    observer: &mut dyn ScanObserver,
) -> Result<(), RackScanError> {
    let context = ScanContext {
        grid,
        options,
        addresses,
        ignore,
    };
    for anchor in RackLocator::new(grid, options) {
        counters.racks += 1;
        log::debug!("rack {} at R{}C{}", anchor.token, anchor.row + 1, anchor.col + 1);
        observer.rack_located(&anchor.token, counters)?;
        scan_rack(&context, &anchor, counters, observer)?;
    }
    Ok(())
}

/// Walks the unit-number column below a rack anchor.
///
/// Unit numbers sit one column left of the label column. The unit numbered
/// `1` is the physical bottom of the rack and ends the walk after being
/// processed.
fn scan_rack<G: Grid>(
    context: &ScanContext<'_, G>,
    anchor: &RackAnchor,
    counters: &mut ScanCounters,
    observer: &mut dyn ScanObserver,
) -> Result<(), RackScanError> {
    if anchor.col == 0 {
        // no room for a unit column left of the label column
        return Ok(());
    }
    for row in anchor.row..anchor.row + RACK_SCAN_LIMIT {
        let Some(unit) = context.grid.integer(row, anchor.col - 1) else {
            continue;
        };
        scan_unit(context, row, unit, anchor, counters, observer)?;
        if unit == 1 {
            break;
        }
    }
    Ok(())
}

/// Classifies one unit slot: extracts its label block and attributes, then
/// routes the assembled candidate to the accepted or ignored stream.
fn scan_unit<G: Grid>(
    context: &ScanContext<'_, G>,
    row: usize,
    unit: i64,
    anchor: &RackAnchor,
    counters: &mut ScanCounters,
    observer: &mut dyn ScanObserver,
) -> Result<(), RackScanError> {
    let token = &anchor.token;
    let Some(block) = extract_label(context.grid, row, anchor.col) else {
        counters.ignored += 1;
        let record = IgnoredRecord {
            rack_id: token.id(),
            model: String::new(),
            label: String::new(),
            rack_unit: unit,
            unit_count: 1,
        };
        return observer.device_ignored(&record, counters);
    };

    let scan = context.options.attribute_scan;
    let vendor = scan.extract(context.grid, row, anchor.col + 1, block.size);
    let model = scan.extract(context.grid, row, anchor.col + 2, block.size);
    let serial = scan.extract(context.grid, row, anchor.col + 3, block.size);
    match prepare_device(vendor, model, serial, &block.name, context.ignore) {
        Assembly::Empty => Ok(()),
        Assembly::Ignored { model, label } => {
            counters.ignored += 1;
            let record = IgnoredRecord {
                rack_id: token.id(),
                model,
                label,
                rack_unit: unit,
                unit_count: block.size,
            };
            observer.device_ignored(&record, counters)
        }
        Assembly::Device { model, serial, label } => {
            counters.devices += 1;
            let record = DeviceRecord {
                site: token.data_center.to_owned(),
                address: context.addresses.resolve(&token.address_code).to_owned(),
                model,
                serial,
                label,
                rack: token.rack_number.to_owned(),
                rack_unit: unit,
                unit_count: block.size,
            };
            observer.device_accepted(&record, counters)
        }
    }
}

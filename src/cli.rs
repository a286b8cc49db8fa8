//! Command-line surface shared by the `rackscan` and `rackscan-match`
//! binaries. Argument structs live here so the binaries stay thin wrappers.

use crate::addressbook::AddressBook;
use crate::error::RackScanError;
use crate::matcher::match_inventory;
use crate::matcher::IdEntry;
use crate::matcher::MatchColumns;
use crate::matcher::MatchCounters;
use crate::matcher::MatchKind;
use crate::output::RecordWriter;
use crate::rack::attribute::AttributeScan;
use crate::rack::device::IgnoreList;
use crate::rack::record::DeviceRecord;
use crate::rack::record::IgnoredRecord;
use crate::rack::record::ScanCounters;
use crate::rack::record::ScanObserver;
use crate::rack::scan_sheet;
use crate::rack::token::RackToken;
use crate::rack::ScanOptions;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use crate::spreadsheet::SheetFilter;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use glob::Pattern;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

/// Arguments of the rack elevation parser.
#[derive(Parser)]
#[command(about = "Extract equipment inventory records from rack elevation spreadsheets.")]
pub struct ScanArgs {
    /// Workbook holding the rack elevation sheets.
    workbook: String,

    /// JSON address book mapping address codes to street addresses.
    #[arg(long)]
    address_book: Option<String>,

    /// Output file for accepted device records.
    #[arg(long, default_value = "devices.csv")]
    accepted: String,

    /// Output file for the ignored-slot audit trail.
    #[arg(long, default_value = "ignored.csv")]
    ignored: String,

    /// Worksheet name patterns to scan (glob syntax, repeatable).
    /// All worksheets are scanned when no pattern is given.
    #[arg(long = "sheet")]
    sheets: Vec<String>,

    /// Rows scanned per worksheet.
    #[arg(long, default_value_t = 2000)]
    max_rows: usize,

    /// Columns scanned per row.
    #[arg(long, default_value_t = 100)]
    max_cols: usize,

    /// Consecutive empty cells tolerated before abandoning the rest of a row,
    /// and consecutive empty rows tolerated before abandoning a worksheet.
    #[arg(long, default_value_t = 20)]
    empty_buffer: usize,

    /// Read attribute columns by walking up to a shared top border first,
    /// for sheets announcing an attribute once above several devices.
    #[arg(long)]
    backward_attributes: bool,

    /// Print one line per accepted/ignored record instead of a status line.
    #[arg(short, long)]
    verbose: bool,
}

/// Runs the rack elevation parser.
pub fn run_scan(args: ScanArgs) -> Result<()> {
    let started = Instant::now();

    let addresses = match &args.address_book {
        Some(path) => AddressBook::load(path).with_context(|| format!("load address book '{path}'"))?,
        None => AddressBook::default(),
    };
    let ignore = IgnoreList::default();
    let patterns = args
        .sheets
        .iter()
        .map(|pattern| Pattern::new(pattern))
        .collect::<Result<Vec<_>, _>>()
        .context("parse sheet pattern")?;
    let filter = SheetFilter::new((!patterns.is_empty()).then_some(patterns));

    let mut workbook = XlsxWorkbook::open(&args.workbook)
        .with_context(|| format!("open workbook '{}'", args.workbook))?;
    let sheets = workbook.read_sheets(&filter)?;

    let options = ScanOptions {
        max_row: args.max_rows,
        max_col: args.max_cols,
        empty_buffer: args.empty_buffer,
        attribute_scan: if args.backward_attributes {
            AttributeScan::Backward
        } else {
            AttributeScan::Forward
        },
    };

    let writer = RecordWriter::create(&args.accepted, &args.ignored)
        .context("create output files")?;
    let mut observer = ConsoleObserver::new(writer, args.verbose);
    let mut counters = ScanCounters::default();
    for sheet in &sheets {
        log::info!("scanning worksheet '{}'", sheet.name());
        scan_sheet(sheet, &options, &addresses, &ignore, &mut counters, &mut observer)?;
    }
    observer.finish(&counters);
    println!("Elapsed: {:.2}s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Console renderer and CSV sink for scan events.
struct ConsoleObserver {
    writer: RecordWriter<File>,
    verbose: bool,
    current_rack: String,
}

impl ConsoleObserver {
    fn new(writer: RecordWriter<File>, verbose: bool) -> Self {
        ConsoleObserver {
            writer,
            verbose,
            current_rack: String::new(),
        }
    }

    /// Single overwritten status line with the current rack and counters.
    fn status(&self, counters: &ScanCounters) {
        print!(
            "\r{}: {} racks, {} devices, {} ignored",
            self.current_rack, counters.racks, counters.devices, counters.ignored
        );
        erase_line_end();
        let _ = std::io::stdout().flush();
    }

    fn finish(&self, counters: &ScanCounters) {
        if !self.verbose {
            println!();
        }
        println!(
            "Done ({} racks, {} devices, {} ignored)",
            counters.racks, counters.devices, counters.ignored
        );
    }
}

impl ScanObserver for ConsoleObserver {
    fn rack_located(&mut self, token: &RackToken, counters: &ScanCounters) -> Result<(), RackScanError> {
        self.current_rack = token.id();
        if self.verbose {
            println!("rack {}", self.current_rack);
        } else {
            self.status(counters);
        }
        Ok(())
    }

    fn device_accepted(&mut self, record: &DeviceRecord, counters: &ScanCounters) -> Result<(), RackScanError> {
        self.writer.write_device(record)?;
        if self.verbose {
            println!(
                "{}: {}U - {} - {} [{}]",
                record.rack_unit, record.unit_count, record.label, record.model, record.serial
            );
        } else {
            self.status(counters);
        }
        Ok(())
    }

    fn device_ignored(&mut self, record: &IgnoredRecord, counters: &ScanCounters) -> Result<(), RackScanError> {
        self.writer.write_ignored(record)?;
        if self.verbose {
            println!("{}: ignored '{}'", record.rack_unit, record.label);
        } else {
            self.status(counters);
        }
        Ok(())
    }
}

/// Arguments of the inventory/id reconciliation tool.
#[derive(Parser)]
#[command(about = "Match inventory records against an external id mapping by serial number or label.")]
pub struct MatchArgs {
    /// Inventory CSV (semicolon-delimited, with serial and label columns).
    inventory: String,

    /// Id mapping CSV (semicolon-delimited, with sn/dev_name/id columns).
    ids: String,

    /// Output file for the annotated inventory.
    #[arg(long, default_value = "result-id.csv")]
    output: String,

    /// Inventory serial number column.
    #[arg(long, default_value = "S/N")]
    serial_column: String,

    /// Inventory label column.
    #[arg(long, default_value = "Label")]
    label_column: String,

    /// Id-source serial number column.
    #[arg(long, default_value = "sn")]
    sn_column: String,

    /// Id-source device name column.
    #[arg(long, default_value = "dev_name")]
    name_column: String,

    /// Id-source identifier column.
    #[arg(long, default_value = "sm_id")]
    id_column: String,
}

/// Runs the reconciliation tool.
pub fn run_match(args: MatchArgs) -> Result<()> {
    let columns = MatchColumns {
        serial: args.serial_column,
        label: args.label_column,
        sn: args.sn_column,
        name: args.name_column,
        id: args.id_column,
        ..MatchColumns::default()
    };

    let inventory = File::open(&args.inventory)
        .with_context(|| format!("open inventory '{}'", args.inventory))?;
    let ids = File::open(&args.ids).with_context(|| format!("open id mapping '{}'", args.ids))?;
    let output = File::create(&args.output)
        .with_context(|| format!("create output '{}'", args.output))?;

    let progress = |entry: &IdEntry, kind: MatchKind, counters: &MatchCounters| {
        let kind = match kind {
            MatchKind::Serial => "serial",
            MatchKind::Label => "label",
        };
        print!(
            "\r{}: found {} match ({} matches: {} by serial, {} by label)",
            entry.id, kind, counters.total, counters.serial, counters.label
        );
        erase_line_end();
        let _ = std::io::stdout().flush();
    };
    let counters = match_inventory(inventory, ids, output, &columns, progress)?;
    println!("\nDone ({} lines result)", counters.rows);
    Ok(())
}

/// Erases to the end of the console line after an overwritten status.
fn erase_line_end() {
    if cfg!(windows) {
        print!("     ");
    } else {
        print!("\x1b[K");
    }
}

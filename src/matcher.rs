//! Inventory reconciliation against an external id mapping.
//!
//! Every inventory row is matched against the id source by serial number
//! first, then by device name (case-insensitive exact match); the first
//! matching id row wins and its identifier is appended to the inventory row.
//! Unmatched rows pass through unannotated.

use crate::error::RackScanError;
use csv::Reader;
use csv::ReaderBuilder;
use csv::StringRecord;
use csv::WriterBuilder;
use std::io::Read;
use std::io::Write;
use thiserror::Error;

/// Sentinel marking "no identifier" in the id source. Never a match target.
pub const NO_IDENTIFIER: &str = r"\N";

/// Errors raised while reconciling inventory files.
#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Missing column '{0}'")]
    MissingColumnError(String),
}

/// Column names of both sources and of the appended identifier column.
#[derive(Clone, Debug)]
pub struct MatchColumns {
    /// Inventory serial number column
    pub serial: String,
    /// Inventory label column
    pub label: String,
    /// Id-source serial number column
    pub sn: String,
    /// Id-source device name column
    pub name: String,
    /// Id-source identifier column
    pub id: String,
    /// Name of the identifier column appended to the output
    pub output: String,
}

impl Default for MatchColumns {
    fn default() -> Self {
        MatchColumns {
            serial: "S/N".to_owned(),
            label: "Label".to_owned(),
            sn: "sn".to_owned(),
            name: "dev_name".to_owned(),
            id: "sm_id".to_owned(),
            output: "SM ID".to_owned(),
        }
    }
}

/// One row of the id source, normalized for matching.
#[derive(Clone, Debug, PartialEq)]
pub struct IdEntry {
    pub serial: String,
    pub name: String,
    pub id: String,
}

/// How a row was matched.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MatchKind {
    Serial,
    Label,
}

/// Running totals of the reconciliation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MatchCounters {
    /// Inventory rows written
    pub rows: usize,
    /// Rows matched
    pub total: usize,
    /// Rows matched by serial number
    pub serial: usize,
    /// Rows matched by label
    pub label: usize,
}

/// Loads the id source, applying the matching normalizations: empty serials
/// and device names (and the literal name `N`) become `empty` so they never
/// match an empty inventory field.
pub fn load_id_entries<R: Read>(source: R, columns: &MatchColumns) -> Result<Vec<IdEntry>, RackScanError> {
    let mut reader = semicolon_reader(source);
    let headers = reader.headers()?.clone();
    let sn_index = index_of(&headers, &columns.sn)?;
    let name_index = index_of(&headers, &columns.name)?;
    let id_index = index_of(&headers, &columns.id)?;

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result?;
        let serial = field(&record, sn_index);
        let name = field(&record, name_index);
        entries.push(IdEntry {
            serial: if serial.is_empty() { "empty".to_owned() } else { serial },
            name: if name.is_empty() || name == "N" { "empty".to_owned() } else { name },
            id: field(&record, id_index),
        });
    }
    Ok(entries)
}

/// Finds the first id entry matching a serial number or a label.
/// Within each entry the serial is checked before the label.
pub fn find_match<'a>(serial: &str, label: &str, entries: &'a [IdEntry]) -> Option<(&'a IdEntry, MatchKind)> {
    for entry in entries {
        if entry.id == NO_IDENTIFIER {
            continue;
        }
        if serial.to_lowercase() == entry.serial.to_lowercase() {
            return Some((entry, MatchKind::Serial));
        }
        if label.to_lowercase() == entry.name.to_lowercase() {
            return Some((entry, MatchKind::Label));
        }
    }
    None
}

/// Reconciles an inventory CSV against an id CSV, writing every inventory
/// row with the matched identifier appended (empty when unmatched). The
/// progress callback receives each match as it happens.
pub fn match_inventory<R1, R2, W, P>(
    inventory: R1,
    ids: R2,
    output: W,
    columns: &MatchColumns,
    mut progress: P,
) -> Result<MatchCounters, RackScanError>
where
    R1: Read,
    R2: Read,
    W: Write,
    P: FnMut(&IdEntry, MatchKind, &MatchCounters),
{
    let entries = load_id_entries(ids, columns)?;

    let mut reader = semicolon_reader(inventory);
    let headers = reader.headers()?.clone();
    let serial_index = index_of(&headers, &columns.serial)?;
    let label_index = index_of(&headers, &columns.label)?;

    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(output);
    let mut output_headers = headers.clone();
    output_headers.push_field(&columns.output);
    writer.write_record(&output_headers)?;

    let mut counters = MatchCounters::default();
    for result in reader.records() {
        let record = result?;
        let mut annotated = record.clone();
        let serial = record.get(serial_index).unwrap_or("");
        let label = record.get(label_index).unwrap_or("");
        match find_match(serial, label, &entries) {
            Some((entry, kind)) => {
                counters.total += 1;
                match kind {
                    MatchKind::Serial => counters.serial += 1,
                    MatchKind::Label => counters.label += 1,
                }
                annotated.push_field(&entry.id);
                progress(entry, kind, &counters);
            }
            None => annotated.push_field(""),
        }
        writer.write_record(&annotated)?;
        counters.rows += 1;
    }
    writer.flush()?;
    Ok(counters)
}

fn semicolon_reader<R: Read>(source: R) -> Reader<R> {
    ReaderBuilder::new().delimiter(b';').from_reader(source)
}

fn index_of(headers: &StringRecord, name: &str) -> Result<usize, RackScanError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| MatcherError::MissingColumnError(name.to_owned()).into())
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(inventory: &str, ids: &str) -> (String, MatchCounters) {
        let mut output = Vec::new();
        let counters = match_inventory(
            inventory.as_bytes(),
            ids.as_bytes(),
            &mut output,
            &MatchColumns::default(),
            |_, _, _| (),
        )
        .expect("match");
        (String::from_utf8(output).expect("utf-8"), counters)
    }

    #[test]
    fn matches_by_serial() {
        let (output, counters) = run(
            "S/N;Label\nSN001;db-01\n",
            "sn;dev_name;sm_id\nSN001;ignored-name;42\n",
        );
        assert_eq!(output, "S/N;Label;SM ID\nSN001;db-01;42\n");
        assert_eq!(counters.total, 1);
        assert_eq!(counters.serial, 1);
        assert_eq!(counters.label, 0);
        assert_eq!(counters.rows, 1);
    }

    #[test]
    fn matches_by_label_case_insensitive() {
        let (output, counters) = run(
            "S/N;Label\nSN999;DB-01\n",
            "sn;dev_name;sm_id\nSN001;db-01;7\n",
        );
        assert_eq!(output, "S/N;Label;SM ID\nSN999;DB-01;7\n");
        assert_eq!(counters.label, 1);
        assert_eq!(counters.serial, 0);
    }

    #[test]
    fn no_identifier_sentinel_never_matches() {
        let (output, counters) = run(
            "S/N;Label\nSN001;db-01\n",
            "sn;dev_name;sm_id\nSN001;db-01;\\N\nSN001;other;42\n",
        );
        assert_eq!(output, "S/N;Label;SM ID\nSN001;db-01;42\n");
        assert_eq!(counters.serial, 1);
    }

    #[test]
    fn unmatched_rows_pass_through() {
        let (output, counters) = run(
            "S/N;Label\nSN777;mystery\n",
            "sn;dev_name;sm_id\nSN001;db-01;42\n",
        );
        assert_eq!(output, "S/N;Label;SM ID\nSN777;mystery;\n");
        assert_eq!(counters.total, 0);
        assert_eq!(counters.rows, 1);
    }

    #[test]
    fn empty_inventory_serial_does_not_match_empty_id_serial() {
        let (_, counters) = run(
            "S/N;Label\n;mystery\n",
            "sn;dev_name;sm_id\n;;42\n",
        );
        assert_eq!(counters.total, 0);
    }

    #[test]
    fn literal_n_device_name_is_normalized_away() {
        let entries = load_id_entries(
            "sn;dev_name;sm_id\nSN001;N;42\n".as_bytes(),
            &MatchColumns::default(),
        )
        .expect("entries");
        assert_eq!(entries[0].name, "empty");
    }

    #[test]
    fn first_matching_entry_wins() {
        let (output, _) = run(
            "S/N;Label\nSN001;db-01\n",
            "sn;dev_name;sm_id\nother;db-01;1\nSN001;x;2\n",
        );
        // the first entry matches by label before the second gets a chance
        // to match by serial
        assert_eq!(output, "S/N;Label;SM ID\nSN001;db-01;1\n");
    }

    #[test]
    fn missing_column_is_an_error() {
        let result = load_id_entries("serial;name\nx;y\n".as_bytes(), &MatchColumns::default());
        assert!(result.is_err());
    }
}

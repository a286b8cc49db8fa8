//! Semicolon-delimited record outputs.
//!
//! Two sinks per run: accepted device records and the ignored-slot audit
//! trail. Both are opened once, carry one header row, and are flushed per
//! write so a crashed run still leaves usable output behind.

use crate::error::RackScanError;
use crate::rack::record::DeviceRecord;
use crate::rack::record::IgnoredRecord;
use csv::Writer;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;

const ACCEPTED_HEADER: [&str; 8] = ["Site", "Address", "Model", "Serial", "Label", "Rack", "RackUnit", "UnitCount"];
const IGNORED_HEADER: [&str; 5] = ["RackId", "Model", "Label", "RackUnit", "UnitCount"];

/// Writers for the accepted and ignored record streams.
pub struct RecordWriter<W: Write> {
    accepted: Writer<W>,
    ignored: Writer<W>,
}

impl RecordWriter<File> {
    /// Creates both output files and writes their header rows.
    pub fn create(accepted_path: &str, ignored_path: &str) -> Result<Self, RackScanError> {
        Self::new(File::create(accepted_path)?, File::create(ignored_path)?)
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wraps two sinks and writes their header rows.
    pub fn new(accepted: W, ignored: W) -> Result<Self, RackScanError> {
        let mut accepted = semicolon_writer(accepted);
        accepted.write_record(ACCEPTED_HEADER)?;
        accepted.flush()?;
        let mut ignored = semicolon_writer(ignored);
        ignored.write_record(IGNORED_HEADER)?;
        ignored.flush()?;
        Ok(RecordWriter { accepted, ignored })
    }

    /// Appends one accepted device record.
    pub fn write_device(&mut self, record: &DeviceRecord) -> Result<(), RackScanError> {
        self.accepted.write_record([
            record.site.as_str(),
            record.address.as_str(),
            record.model.as_str(),
            record.serial.as_str(),
            record.label.as_str(),
            record.rack.as_str(),
            record.rack_unit.to_string().as_str(),
            record.unit_count.to_string().as_str(),
        ])?;
        self.accepted.flush()?;
        Ok(())
    }

    /// Appends one ignored slot record.
    pub fn write_ignored(&mut self, record: &IgnoredRecord) -> Result<(), RackScanError> {
        self.ignored.write_record([
            record.rack_id.as_str(),
            record.model.as_str(),
            record.label.as_str(),
            record.rack_unit.to_string().as_str(),
            record.unit_count.to_string().as_str(),
        ])?;
        self.ignored.flush()?;
        Ok(())
    }
}

fn semicolon_writer<W: Write>(sink: W) -> Writer<W> {
    WriterBuilder::new().delimiter(b';').from_writer(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn into_sink(writer: Writer<Vec<u8>>) -> Vec<u8> {
        match writer.into_inner() {
            Ok(sink) => sink,
            Err(_) => panic!("writer sink"),
        }
    }

    fn device() -> DeviceRecord {
        DeviceRecord {
            site: "DC2".to_owned(),
            address: "1 Main Street".to_owned(),
            model: "Dell R740".to_owned(),
            serial: "SN001".to_owned(),
            label: "db-01".to_owned(),
            rack: "A1".to_owned(),
            rack_unit: 4,
            unit_count: 2,
        }
    }

    #[test]
    fn accepted_output_format() {
        let mut writer = RecordWriter::new(Vec::new(), Vec::new()).expect("writer");
        writer.write_device(&device()).expect("write");

        let accepted = String::from_utf8(into_sink(writer.accepted)).expect("utf-8");
        assert_eq!(
            accepted,
            "Site;Address;Model;Serial;Label;Rack;RackUnit;UnitCount\n\
             DC2;1 Main Street;Dell R740;SN001;db-01;A1;4;2\n"
        );
    }

    #[test]
    fn ignored_output_format() {
        let mut writer = RecordWriter::new(Vec::new(), Vec::new()).expect("writer");
        writer
            .write_ignored(&IgnoredRecord {
                rack_id: "MS1.DC2.A1".to_owned(),
                model: String::new(),
                label: "patch panel".to_owned(),
                rack_unit: 2,
                unit_count: 1,
            })
            .expect("write");

        let ignored = String::from_utf8(into_sink(writer.ignored)).expect("utf-8");
        assert_eq!(
            ignored,
            "RackId;Model;Label;RackUnit;UnitCount\n\
             MS1.DC2.A1;;patch panel;2;1\n"
        );
    }
}

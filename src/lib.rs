//! # Rackscan
//!
//! Extracts structured equipment-inventory records from rack elevation
//! spreadsheets: visual layouts of data-center racks with one column of
//! numbered rack units per rack and bordered or merged cells encoding device
//! labels spanning multiple units. There is no explicit schema in those
//! sheets; the parser reconstructs records from cell values, border
//! presence, and merge state alone.
//!
//! ## Features
//!
//! - **XLSX access layer**: workbook parsing with cell values, top/bottom
//!   border flags resolved through cell formats, and merged-range
//!   membership, loaded for random access
//! - **Layout inference**: rack-id location, unit-column walking, label
//!   block extraction, and attribute column reading as pure functions over
//!   a grid capability
//! - **Filtering**: stop-word suppression of placeholder slots (patch
//!   panels, organizers, blanks), overridden by the presence of a serial
//!   number
//! - **Audit trail**: every suppressed slot lands on a second output
//!   stream so exclusions stay reviewable
//! - **Reconciliation**: a companion tool matching two inventory sources
//!   by serial number or label against an external id mapping
//!
//! ## Binaries
//!
//! - `rackscan`: parse a workbook into accepted/ignored record CSVs
//! - `rackscan-match`: annotate an inventory CSV with matched identifiers

pub mod helpers;

pub mod addressbook;
pub mod cli;
pub mod error;
pub mod matcher;
pub mod output;
pub mod rack;
pub mod spreadsheet;

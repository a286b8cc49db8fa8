use crate::error::RackScanError;
use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// Types of cell data in XLSX files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        if is_date && is_time {
            if is_1904 {
                Self::NumberDateTime1904
            } else {
                Self::NumberDateTime1900
            }
        } else if is_date {
            if is_1904 {
                Self::NumberDate1904
            } else {
                Self::NumberDate1900
            }
        } else if is_time {
            if is_1904 {
                Self::NumberTime1904
            } else {
                Self::NumberTime1900
            }
        } else {
            Self::Number
        }
    }
}

/// Represents a single cell in a worksheet with position, type, value, and the
/// border edges its cell format draws.
#[derive(Clone, Debug, Default)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as string
    pub(crate) value: String,
    /// Whether the cell format draws a top border
    pub(crate) top_border: bool,
    /// Whether the cell format draws a bottom border
    pub(crate) bottom_border: bool,
}

impl Cell {
    /// Converts the cell value to a plain integer.
    ///
    /// Booleans, errors, and date-formatted numbers never qualify, so a `TRUE`
    /// in the unit column is not mistaken for a unit number.
    pub(crate) fn to_integer(&self) -> Option<i64> {
        match self.kind {
            CellType::Number | CellType::InlineString | CellType::SharedString => {
                self.value.trim().parse::<i64>().ok()
            }
            _ => None,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self.kind {
            CellType::Boolean => if self.value == "1" { "true" } else { "false" }.to_owned(),
            CellType::NumberDateTime1900 => {
                to_datetime_string(&self.value, false).unwrap_or_else(|_| self.value.to_owned())
            }
            CellType::NumberDate1900 => {
                to_date_string(&self.value, false).unwrap_or_else(|_| self.value.to_owned())
            }
            CellType::NumberDateTime1904 => {
                to_datetime_string(&self.value, true).unwrap_or_else(|_| self.value.to_owned())
            }
            CellType::NumberDate1904 => {
                to_date_string(&self.value, true).unwrap_or_else(|_| self.value.to_owned())
            }
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                to_time_string(&self.value).unwrap_or_else(|_| self.value.to_owned())
            }
            _ => self.value.to_owned(),
        };
        write!(f, "{}", value)
    }
}

/// Converts an Excel numeric date to an ISO date string.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, RackScanError> {
    let days = value.parse::<f64>()?.trunc() as i64; // Handle Lotus 1-2-3 leap year bug
    let duration = Duration::days(
        days + if is_1904 {
            1462
        } else if days < 60 {
            1
        } else {
            0
        },
    );
    let date = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal") + duration;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts an Excel numeric time to an ISO time string.
fn to_time_string(value: &str) -> Result<String, RackScanError> {
    let factor = value.parse::<f64>()?;
    let mut hours = (factor * 86400000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:06}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Ok(timestamp)
}

/// Converts an Excel numeric datetime to an ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, RackScanError> {
    if let Some(index) = value.find('.') {
        let date = to_date_string(&value[..index], is_1904)?;
        let time = to_time_string(&value[index..])?;
        Ok(format!("{date} {time}"))
    } else {
        let date = to_date_string(value, is_1904)?;
        Ok(format!("{date} 00:00:00"))
    }
}

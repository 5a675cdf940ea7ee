//! In-memory row model shared by the format readers and writers.

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use std::fmt;

/// Excel serial day number of 1970-01-01
const UNIX_EPOCH_SERIAL: f64 = 25_569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text
    Text(String),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Date and time as an Excel serial day number (1900 date system)
    DateTime(f64),
    /// Elapsed time in days
    Duration(f64),
}

impl Cell {
    /// Date-time cell from a calendar value
    #[must_use]
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        Self::DateTime(datetime_to_serial(value))
    }

    /// Calendar value of a date-time cell
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(serial) => serial_to_datetime(*serial),
            _ => None,
        }
    }
}

/// Convert an Excel serial day number to a calendar value.
///
/// Serials before 1900-03-01 are off by one day, as in Excel itself.
#[must_use]
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY).round();
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
}

/// Convert a calendar value to an Excel serial day number
#[must_use]
pub fn datetime_to_serial(value: NaiveDateTime) -> f64 {
    value.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_SERIAL
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) if dt.time() == NaiveTime::MIN => write!(f, "{}", dt.format("%Y-%m-%d")),
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None => write!(f, "{serial}"),
            },
            Self::Duration(days) => {
                let secs = (days * 86_400.0).round() as i64;
                let sign = if secs < 0 { "-" } else { "" };
                let secs = secs.abs();
                write!(f, "{sign}{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
            }
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }
}

/// One data row
pub type Row = Vec<Cell>;

/// A header row plus its ordered data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names, repeated at the top of every chunk
    pub header: Vec<String>,
    /// Data rows in source order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a table from a header and rows
    #[must_use]
    pub fn new(header: Vec<String>, rows: Vec<Row>) -> Self {
        Self { header, rows }
    }

    /// Number of data rows (header excluded)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

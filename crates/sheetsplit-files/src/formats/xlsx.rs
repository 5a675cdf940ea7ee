//! Spreadsheet reading (calamine) and writing (rust_xlsxwriter).
//!
//! Only the first worksheet is read. Its first row is the header.
//! Date and duration cells keep their type and are written back with a
//! matching number format.

use crate::error::{Result, SplitError};
use crate::table::{Cell, Row, Table};
use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => Cell::Duration(dt.as_f64()),
        // Normalizes 1904-based workbooks to the 1900 system we write.
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::from_datetime(value),
            None => Cell::DateTime(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_iso_datetime(s) {
            Some(value) => Cell::from_datetime(value),
            None => Cell::Text(s.clone()),
        },
        other => Cell::Text(other.to_string()),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Load the first worksheet of `path` into memory
///
/// # Errors
///
/// Returns an error if the workbook cannot be opened or has no worksheet.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SplitError::NoWorksheet)??;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|cells| cells.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    let rows: Vec<Row> = rows.map(|cells| cells.iter().map(to_cell).collect()).collect();

    Ok(Table::new(header, rows))
}

/// Write a header and rows to a new workbook at `path`
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or saved.
pub fn write_rows(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);
    let duration_format = Format::new().set_num_format(DURATION_FORMAT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Int(i) => {
                    worksheet.write_number(r, c, *i as f64)?;
                }
                Cell::Float(f) => {
                    worksheet.write_number(r, c, *f)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Cell::DateTime(serial) => {
                    let format = if serial.fract() == 0.0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_number_with_format(r, c, *serial, format)?;
                }
                Cell::Duration(days) => {
                    worksheet.write_number_with_format(r, c, *days, &duration_format)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

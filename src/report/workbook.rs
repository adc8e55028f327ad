//! Spreadsheet serialization for report artifacts.
//!
//! Writes the three-sheet workbook (`Raw Data`, `Summary`, `Findings`)
//! and names files so that two reports requested within the same second
//! never collide.

use std::path::Path;

use chrono::Local;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_xlsxwriter::{Format, Workbook};

use super::summary::ReportSummary;
use crate::error::ReportError;
use crate::record::{CANONICAL_FIELDS, ParsedRecord};

/// Prefix of every generated report file.
pub const REPORT_FILE_PREFIX: &str = "return_report_";

/// Length of the random collision-avoidance suffix.
const SUFFIX_LEN: usize = 8;

/// Builds a unique report file name: `return_report_<timestamp>_<suffix>.xlsx`.
#[must_use]
pub fn generate_file_name() -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{REPORT_FILE_PREFIX}{timestamp}_{suffix}.xlsx")
}

/// Column order for the `Raw Data` sheet: canonical fields that occur in
/// at least one record, in canonical order, then unrecognized fields in
/// first-appearance order.
#[must_use]
pub fn column_order(records: &[ParsedRecord]) -> Vec<String> {
    let mut columns: Vec<String> = CANONICAL_FIELDS
        .into_iter()
        .filter(|field| records.iter().any(|r| r.get(field).is_some()))
        .map(str::to_string)
        .collect();
    for record in records {
        for (key, _) in record.iter() {
            if !columns.iter().any(|c| c.as_str() == key) {
                columns.push(key.to_string());
            }
        }
    }
    columns
}

/// Writes the three-sheet workbook to `path`.
///
/// # Errors
///
/// Returns [`ReportError::Workbook`] when the spreadsheet library rejects
/// a sheet name or write, or fails to save the file.
pub fn write_workbook(
    path: &Path,
    records: &[ParsedRecord],
    summary: &ReportSummary,
    findings: &[String],
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let columns = column_order(records);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Raw Data")?;
    for (col, name) in columns.iter().enumerate() {
        sheet.write_with_format(0, col_index(col), name.as_str(), &bold)?;
    }
    for (row, record) in records.iter().enumerate() {
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = record.get(name) {
                sheet.write(row_index(row) + 1, col_index(col), value)?;
            }
        }
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;
    sheet.write_with_format(0, 0, "Metric", &bold)?;
    sheet.write_with_format(0, 1, "Value", &bold)?;
    for (row, (key, value)) in summary.rows().iter().enumerate() {
        sheet.write(row_index(row) + 1, 0, key.as_str())?;
        sheet.write(row_index(row) + 1, 1, value.as_str())?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Findings")?;
    sheet.write_with_format(0, 0, "Findings", &bold)?;
    for (row, line) in findings.iter().enumerate() {
        sheet.write(row_index(row) + 1, 0, line.as_str())?;
    }

    workbook.save(path)?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn row_index(row: usize) -> u32 {
    row as u32
}

#[allow(clippy::cast_possible_truncation)]
fn col_index(col: usize) -> u16 {
    col as u16
}

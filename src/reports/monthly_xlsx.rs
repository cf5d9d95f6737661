// src/reports/monthly_xlsx.rs
use std::collections::BTreeMap;

use chrono::DateTime;
use rust_xlsxwriter::Workbook;

use crate::db::connection::Database;
use crate::db::readings::{fetch_report_chunk, ReadingRow};
use crate::db::stats::month_bounds;
use crate::domain::resource::Resource;
use crate::domain::stats::round2;
use crate::errors::ServerError;

/// Rows fetched per database round-trip while streaming into the workbook.
const CHUNK_SIZE: i64 = 500;

#[derive(Debug, Clone)]
pub struct ReportScope {
    pub neighborhood: String,
    /// None means all three resources.
    pub resource: Option<Resource>,
    pub month: u8,
    pub year: i32,
}

#[derive(Debug, Default, Clone)]
struct Totals {
    samples: i64,
    total: f64,
    peak: f64,
    anomalies: i64,
}

/// Build the monthly consumption report for one neighborhood.
/// Readings are pulled in id-ordered chunks so a large month never has to be
/// materialized in memory at once. Returns the finished workbook bytes and
/// the number of data rows written.
pub fn build_monthly_report(
    db: &Database,
    scope: &ReportScope,
) -> Result<(Vec<u8>, i64), ServerError> {
    let (from, to) = month_bounds(scope.year, scope.month)?;

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Readings")
        .map_err(|e| ServerError::ReportError(format!("Failed to name sheet: {}", e)))?;

    let headers = ["Neighborhood", "Resource", "Amount", "Unit", "Recorded At", "Anomaly"];
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| {
                ServerError::ReportError(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    let mut row_count: i64 = 0;
    let mut last_id: i64 = 0;

    loop {
        let chunk = db.with_conn(|conn| {
            fetch_report_chunk(
                conn,
                &scope.neighborhood,
                scope.resource,
                from,
                to,
                last_id,
                CHUNK_SIZE,
            )
        })?;
        if chunk.is_empty() {
            break;
        }
        last_id = chunk.last().map(|r| r.id).unwrap_or(last_id);

        for reading in &chunk {
            row_count += 1;
            write_reading_row(worksheet, row_count as u32, reading)?;

            let t = totals.entry(reading.resource.clone()).or_default();
            t.samples += 1;
            t.total += reading.amount;
            if reading.amount > t.peak {
                t.peak = reading.amount;
            }
            if reading.anomaly {
                t.anomalies += 1;
            }
        }
    }

    write_summary_sheet(&mut workbook, &totals)?;

    let buffer = workbook
        .save_to_buffer()
        .map_err(|e| ServerError::ReportError(format!("Failed to save workbook: {}", e)))?;

    Ok((buffer, row_count))
}

fn write_reading_row(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    reading: &ReadingRow,
) -> Result<(), ServerError> {
    worksheet
        .write_string(row, 0, &reading.neighborhood)
        .map_err(|e| ServerError::ReportError(format!("Failed to write neighborhood: {}", e)))?;

    worksheet
        .write_string(row, 1, &reading.resource)
        .map_err(|e| ServerError::ReportError(format!("Failed to write resource: {}", e)))?;

    worksheet
        .write_number(row, 2, reading.amount)
        .map_err(|e| ServerError::ReportError(format!("Failed to write amount: {}", e)))?;

    worksheet
        .write_string(row, 3, &reading.unit)
        .map_err(|e| ServerError::ReportError(format!("Failed to write unit: {}", e)))?;

    worksheet
        .write_string(row, 4, &format_timestamp(reading.recorded_at))
        .map_err(|e| ServerError::ReportError(format!("Failed to write timestamp: {}", e)))?;

    worksheet
        .write_string(row, 5, if reading.anomaly { "Yes" } else { "No" })
        .map_err(|e| ServerError::ReportError(format!("Failed to write anomaly flag: {}", e)))?;

    Ok(())
}

fn write_summary_sheet(
    workbook: &mut Workbook,
    totals: &BTreeMap<String, Totals>,
) -> Result<(), ServerError> {
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Summary")
        .map_err(|e| ServerError::ReportError(format!("Failed to name sheet: {}", e)))?;

    let headers = ["Resource", "Samples", "Total", "Average", "Peak", "Anomalies"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).map_err(|e| {
            ServerError::ReportError(format!("Failed to write header '{}': {}", header, e))
        })?;
    }

    for (i, (resource, t)) in totals.iter().enumerate() {
        let r = (i + 1) as u32;
        let average = if t.samples > 0 {
            round2(t.total / t.samples as f64)
        } else {
            0.0
        };

        sheet
            .write_string(r, 0, resource)
            .map_err(|e| ServerError::ReportError(format!("Failed to write resource: {}", e)))?;
        sheet
            .write_number(r, 1, t.samples as f64)
            .map_err(|e| ServerError::ReportError(format!("Failed to write samples: {}", e)))?;
        sheet
            .write_number(r, 2, round2(t.total))
            .map_err(|e| ServerError::ReportError(format!("Failed to write total: {}", e)))?;
        sheet
            .write_number(r, 3, average)
            .map_err(|e| ServerError::ReportError(format!("Failed to write average: {}", e)))?;
        sheet
            .write_number(r, 4, t.peak)
            .map_err(|e| ServerError::ReportError(format!("Failed to write peak: {}", e)))?;
        sheet
            .write_number(r, 5, t.anomalies as f64)
            .map_err(|e| ServerError::ReportError(format!("Failed to write anomalies: {}", e)))?;
    }

    Ok(())
}

fn format_timestamp(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

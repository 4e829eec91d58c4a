//! Acquisition reports and CSV export
//!
//! Rows carrying the sentinel acquisition date are excluded from every
//! per-year figure and listed separately by [`without_acquisition_date`].

use super::record::{PracticeRecord, ACQUISITION_DATE, DATE_FORMAT};
use super::JoinResult;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Row shown in the per-year and no-date listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionRow {
    pub practice_name: String,
    pub acquisition_date: String,
    pub country: String,
}

impl AcquisitionRow {
    fn from_record(record: &PracticeRecord) -> Self {
        AcquisitionRow {
            practice_name: record.name.clone(),
            acquisition_date: record.acquisition_date.format(DATE_FORMAT).to_string(),
            country: record.country().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: &'static str,
    pub count: usize,
}

fn dated(records: &[PracticeRecord]) -> impl Iterator<Item = &PracticeRecord> {
    records.iter().filter(|r| r.has_acquisition_date())
}

/// Acquisition count per year, ascending
pub fn acquisitions_by_year(records: &[PracticeRecord]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for record in dated(records) {
        *counts.entry(record.acquisition_date.year()).or_insert(0) += 1;
    }
    counts
}

/// Years with at least one acquisition, ascending
pub fn acquisition_years(records: &[PracticeRecord]) -> Vec<i32> {
    acquisitions_by_year(records).into_keys().collect()
}

/// Twelve calendar months with the acquisitions made in each during `year`
pub fn acquisitions_by_month(records: &[PracticeRecord], year: i32) -> Vec<MonthCount> {
    let mut counts = [0usize; 12];
    for record in dated(records).filter(|r| r.acquisition_date.year() == year) {
        counts[record.acquisition_date.month0() as usize] += 1;
    }
    MONTH_NAMES
        .into_iter()
        .zip(counts)
        .map(|(month, count)| MonthCount { month, count })
        .collect()
}

pub fn acquisitions_in_year(records: &[PracticeRecord], year: i32) -> Vec<AcquisitionRow> {
    dated(records)
        .filter(|r| r.acquisition_date.year() == year)
        .map(AcquisitionRow::from_record)
        .collect()
}

pub fn without_acquisition_date(records: &[PracticeRecord]) -> Vec<AcquisitionRow> {
    records
        .iter()
        .filter(|r| !r.has_acquisition_date())
        .map(AcquisitionRow::from_record)
        .collect()
}

/// Write the selected columns of `records` as CSV with a header row.
///
/// Dates are written as `YYYY-MM-DD`; columns a record lacks are empty.
pub fn export_csv<'a, W, I, S>(writer: W, records: I, columns: &[S]) -> JoinResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a PracticeRecord>,
    S: AsRef<str>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(|c| c.as_ref()))?;

    for record in records {
        csv_writer.write_record(columns.iter().map(|c| {
            let column = c.as_ref();
            if column == ACQUISITION_DATE {
                record.acquisition_date.format(DATE_FORMAT).to_string()
            } else {
                record.column_value(column).to_string()
            }
        }))?;
    }

    csv_writer.flush()?;
    Ok(())
}

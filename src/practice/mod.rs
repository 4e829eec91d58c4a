//! Practice data: ingestion, join, search and reporting
//!
//! The practice table and the coordinates table are read as CSV, joined
//! into one [`PracticeRecord`] per practice row, and exposed through
//! [`PracticeDirectory`] for lookups and through `report` for
//! acquisition figures and CSV export.

pub mod directory;
pub mod join;
pub mod record;
pub mod report;
pub mod table;

pub use directory::{parse_name_lines, read_name_list, PracticeDirectory};
pub use join::{join_practice_data, JoinOutput, JoinWarning};
pub use record::{
    normalize_website, parse_acquisition_date, short_name, GeoPoint, PracticeRecord,
    UNKNOWN_ACQUISITION_DATE,
};
pub use report::{
    acquisition_years, acquisitions_by_month, acquisitions_by_year, acquisitions_in_year,
    export_csv, without_acquisition_date, AcquisitionRow, MonthCount,
};
pub use table::Table;

use thiserror::Error;

/// Errors reading or writing practice tables
#[derive(Error, Debug)]
pub enum JoinError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column in {table} table: {column}")]
    MissingColumn { table: String, column: String },
}

pub type JoinResult<T> = Result<T, JoinError>;

//! Header-addressed CSV tables

use super::{JoinError, JoinResult};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// A CSV table with trimmed headers and cells
///
/// Rows in which every cell is blank are dropped on read. Short rows are
/// treated as if the missing trailing cells were empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();
        Table { headers, rows }
    }

    pub fn from_path(path: impl AsRef<Path>) -> JoinResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!("Read {} rows from {:?}", table.rows.len(), path);
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> JoinResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = decode_record(csv_reader.byte_headers()?);

        // Spreadsheet exports are often cp1252; undecodable bytes become U+FFFD
        let mut rows = Vec::new();
        for record in csv_reader.byte_records() {
            rows.push(decode_record(&record?));
        }

        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that must be present
    pub fn require(&self, table: &str, name: &str) -> JoinResult<usize> {
        self.column(name).ok_or_else(|| JoinError::MissingColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn decode_record(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

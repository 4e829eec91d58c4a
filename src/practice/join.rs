//! Left join of the practice table with the coordinates table
//!
//! Rows are matched on (Practice Name, Post Code, Full Address). Every
//! source row produces exactly one record. Gaps are filled with documented
//! fallbacks and reported as [`JoinWarning`]s rather than errors.

use super::record::{
    normalize_website, parse_acquisition_date, short_name, GeoPoint, PracticeRecord,
    ACQUISITION_DATE, ADDRESS, DATE_FORMAT, FULL_ADDRESS, LATITUDE, LONGITUDE, POST_CODE,
    PRACTICE_NAME, SHORT_PRACTICE_NAME, UNKNOWN_ACQUISITION_DATE, WEBSITE,
};
use super::table::Table;
use super::JoinResult;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

/// A normalisation applied while joining one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinWarning {
    /// No coordinates matched; the fallback point was used
    MissingCoordinates { practice: String },
    /// Acquisition date cell was blank
    MissingDate { practice: String },
    /// Acquisition date cell could not be parsed
    UnparsableDate { practice: String, raw: String },
}

impl fmt::Display for JoinWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinWarning::MissingCoordinates { practice } => {
                write!(f, "no coordinates for '{}', using fallback", practice)
            }
            JoinWarning::MissingDate { practice } => {
                write!(f, "no acquisition date for '{}'", practice)
            }
            JoinWarning::UnparsableDate { practice, raw } => {
                write!(f, "unparsable acquisition date '{}' for '{}'", raw, practice)
            }
        }
    }
}

/// Joined records plus the warnings raised while building them
#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub records: Vec<PracticeRecord>,
    pub columns: Vec<String>,
    pub warnings: Vec<JoinWarning>,
}

type JoinKey = (String, String, String);

/// Build one [`PracticeRecord`] per source row
pub fn join_practice_data(
    source: &Table,
    coordinates: &Table,
    fallback: GeoPoint,
) -> JoinResult<JoinOutput> {
    let name_col = source.require("practices", PRACTICE_NAME)?;
    let post_code_col = source.require("practices", POST_CODE)?;
    let address_col = source.require("practices", ADDRESS)?;

    let index = coordinate_index(coordinates)?;
    let columns = output_columns(source);

    let mut output = JoinOutput {
        columns,
        ..JoinOutput::default()
    };

    for row in 0..source.len() {
        let name = source.cell(row, name_col).to_string();
        let post_code = source.cell(row, post_code_col).to_string();
        let full_address = full_address(source.cell(row, address_col), &post_code);

        let mut fields: IndexMap<String, String> = source
            .headers()
            .iter()
            .enumerate()
            .map(|(col, header)| (header.clone(), source.cell(row, col).to_string()))
            .collect();

        let website = normalize_website(fields.get(WEBSITE).map(String::as_str).unwrap_or(""));
        if fields.contains_key(WEBSITE) {
            fields.insert(WEBSITE.to_string(), website.clone());
        }

        let raw_date = fields.get(ACQUISITION_DATE).cloned().unwrap_or_default();
        let acquisition_date = match parse_acquisition_date(&raw_date) {
            Some(date) => date,
            None => {
                output.warnings.push(if raw_date.trim().is_empty() {
                    JoinWarning::MissingDate {
                        practice: name.clone(),
                    }
                } else {
                    JoinWarning::UnparsableDate {
                        practice: name.clone(),
                        raw: raw_date.clone(),
                    }
                });
                UNKNOWN_ACQUISITION_DATE
            }
        };

        let key = (name.clone(), post_code.clone(), full_address.clone());
        let (coordinates, coordinates_matched) = match index.get(&key).copied() {
            Some(point) => (point, true),
            None => {
                output.warnings.push(JoinWarning::MissingCoordinates {
                    practice: name.clone(),
                });
                (fallback, false)
            }
        };

        let short = short_name(&name);
        fields.insert(FULL_ADDRESS.to_string(), full_address.clone());
        fields.insert(
            ACQUISITION_DATE.to_string(),
            acquisition_date.format(DATE_FORMAT).to_string(),
        );
        fields.insert(LATITUDE.to_string(), coordinates.latitude.to_string());
        fields.insert(LONGITUDE.to_string(), coordinates.longitude.to_string());
        fields.insert(SHORT_PRACTICE_NAME.to_string(), short.clone());

        output.records.push(PracticeRecord {
            name,
            short_name: short,
            post_code,
            full_address,
            website,
            acquisition_date,
            coordinates,
            coordinates_matched,
            fields,
        });
    }

    for warning in &output.warnings {
        warn!("{}", warning);
    }
    info!(
        "Joined {} practices ({} warnings)",
        output.records.len(),
        output.warnings.len()
    );
    Ok(output)
}

/// First parseable coordinate row for each join key
fn coordinate_index(coordinates: &Table) -> JoinResult<HashMap<JoinKey, GeoPoint>> {
    let name_col = coordinates.require("coordinates", PRACTICE_NAME)?;
    let post_code_col = coordinates.require("coordinates", POST_CODE)?;
    let address_col = coordinates.require("coordinates", FULL_ADDRESS)?;
    let lat_col = coordinates.require("coordinates", LATITUDE)?;
    let lon_col = coordinates.require("coordinates", LONGITUDE)?;

    let mut index = HashMap::with_capacity(coordinates.len());
    for row in 0..coordinates.len() {
        let Some(point) = parse_point(
            coordinates.cell(row, lat_col),
            coordinates.cell(row, lon_col),
        ) else {
            continue;
        };
        let key = (
            coordinates.cell(row, name_col).to_string(),
            coordinates.cell(row, post_code_col).to_string(),
            coordinates.cell(row, address_col).to_string(),
        );
        index.entry(key).or_insert(point);
    }
    Ok(index)
}

/// Source columns followed by any derived column the source lacks
fn output_columns(source: &Table) -> Vec<String> {
    let mut columns = source.headers().to_vec();
    for derived in [FULL_ADDRESS, ACQUISITION_DATE, LATITUDE, LONGITUDE, SHORT_PRACTICE_NAME] {
        if !columns.iter().any(|c| c == derived) {
            columns.push(derived.to_string());
        }
    }
    columns
}

fn full_address(address: &str, post_code: &str) -> String {
    match (address.is_empty(), post_code.is_empty()) {
        (false, false) => format!("{}, {}", address, post_code),
        (false, true) => address.to_string(),
        _ => post_code.to_string(),
    }
}

fn parse_point(latitude: &str, longitude: &str) -> Option<GeoPoint> {
    let latitude = latitude.trim().parse::<f64>().ok()?;
    let longitude = longitude.trim().parse::<f64>().ok()?;
    let point = GeoPoint::new(latitude, longitude);
    point.is_valid().then_some(point)
}

//! Practice records and the normalisation rules applied to source rows

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder acquisition date meaning "not provided"
pub const UNKNOWN_ACQUISITION_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("invalid sentinel date"),
};

/// Date format used for display and export
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Column names shared by the join, search and report layers
pub const PRACTICE_NAME: &str = "Practice Name";
pub const POST_CODE: &str = "Post Code";
pub const ADDRESS: &str = "Address";
pub const FULL_ADDRESS: &str = "Full Address";
pub const ACQUISITION_DATE: &str = "Acquisition date";
pub const WEBSITE: &str = "Website";
pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";
pub const COUNTRY: &str = "Country";
pub const SHORT_PRACTICE_NAME: &str = "Short Practice Name";

const SHARK_SLOTS: usize = 6;
const FISH_SLOTS: usize = 5;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Dublin city centre
    pub const DUBLIN: GeoPoint = GeoPoint::new(53.3498, -6.2603);

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One practice after the join and normalisation steps
///
/// `fields` holds every source column plus the derived columns, with
/// normalised values, in column order. The typed fields mirror the values
/// the rest of the crate works with directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeRecord {
    pub name: String,
    pub short_name: String,
    pub post_code: String,
    pub full_address: String,
    pub website: String,
    pub acquisition_date: NaiveDate,
    pub coordinates: GeoPoint,
    /// Whether the coordinates came from data rather than the fallback
    pub coordinates_matched: bool,
    pub fields: IndexMap<String, String>,
}

impl PracticeRecord {
    /// Non-empty value of a column
    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value of a column for tabular output; unknown columns are empty
    pub fn column_value(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn legal_entity(&self) -> Option<&str> {
        self.field("Legal Entity")
    }

    pub fn company_number(&self) -> Option<&str> {
        self.field("Company No")
    }

    pub fn vat_number(&self) -> Option<&str> {
        self.field("VAT Number")
    }

    pub fn country(&self) -> Option<&str> {
        self.field(COUNTRY)
    }

    pub fn telephone(&self) -> Option<&str> {
        self.field("Telephone No")
    }

    pub fn email(&self) -> Option<&str> {
        self.field("Practice email")
    }

    pub fn group_shares(&self) -> Option<&str> {
        self.field("Hakim Group Shares (%)")
    }

    pub fn has_acquisition_date(&self) -> bool {
        self.acquisition_date != UNKNOWN_ACQUISITION_DATE
    }

    /// `YYYY-MM-DD`, or "None Provided" for the sentinel date
    pub fn acquisition_display(&self) -> String {
        if self.has_acquisition_date() {
            self.acquisition_date.format(DATE_FORMAT).to_string()
        } else {
            "None Provided".to_string()
        }
    }

    /// Present management and contact entries as (label, value) pairs
    pub fn management_details(&self) -> Vec<(String, String)> {
        let mut details = Vec::new();
        let mut push = |label: String, column: String| {
            if let Some(value) = self.field(&column) {
                details.push((label, value.to_string()));
            }
        };

        for i in 1..=SHARK_SLOTS {
            push(format!("Shark {i} Name"), format!("Shark {i} (name)"));
            push(format!("Shark {i} Email Address"), format!("Shark {i} (email address)"));
            push(
                format!("Shark {i} Shareholding - %"),
                format!("Shark {i} (shareholding - %)"),
            );
        }
        for i in 1..=FISH_SLOTS {
            push(format!("Fish {i} Name"), format!("Fish {i} (name)"));
            push(format!("Fish {i} Email"), format!("Fish {i} (email)"));
        }
        for column in ["Primary Buddy", "Secondary Buddy", "Senior Buddy", "ID"] {
            push(column.to_string(), column.to_string());
        }

        details
    }

    /// All field values joined, for free-text search
    pub fn row_text(&self) -> String {
        self.fields
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Display name: both tokens of a two-token name, the first token plus the
/// token after a standalone hyphen, or the first token alone.
pub fn short_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.as_slice() {
        [] => String::new(),
        [first, second] => format!("{} {}", first, second),
        [first, rest @ ..] => match rest.iter().position(|p| *p == "-") {
            Some(i) if i + 1 < rest.len() => format!("{} {}", first, rest[i + 1]),
            _ => first.to_string(),
        },
    }
}

/// Prefix `http://` when a non-empty URL has no scheme
pub fn normalize_website(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse an acquisition date cell; `None` when blank or unparsable
pub fn parse_acquisition_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> PracticeRecord {
        PracticeRecord {
            name: "Smile Dental".into(),
            short_name: "Smile Dental".into(),
            post_code: "D01".into(),
            full_address: "1 Main St, D01".into(),
            website: String::new(),
            acquisition_date: UNKNOWN_ACQUISITION_DATE,
            coordinates: GeoPoint::DUBLIN,
            coordinates_matched: false,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("Smile Dental"), "Smile Dental");
        assert_eq!(short_name("Bright Eyes - Cork City"), "Bright Cork");
        assert_eq!(short_name("Hakim Optical Clinic"), "Hakim");
        assert_eq!(short_name("Solo"), "Solo");
        assert_eq!(short_name("Vision-Care Group Ltd"), "Vision-Care");
        assert_eq!(short_name("Trailing Name -"), "Trailing");
        assert_eq!(short_name("   "), "");
    }

    #[test]
    fn test_normalize_website() {
        assert_eq!(normalize_website("example.com"), "http://example.com");
        assert_eq!(normalize_website("https://example.com"), "https://example.com");
        assert_eq!(normalize_website("http://example.com"), "http://example.com");
        assert_eq!(normalize_website(""), "");
        assert_eq!(normalize_website("  "), "");
    }

    #[test]
    fn test_parse_acquisition_date() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 15);
        assert_eq!(parse_acquisition_date("2021-03-15"), expected);
        assert_eq!(parse_acquisition_date("15/03/2021"), expected);
        assert_eq!(parse_acquisition_date("2021-03-15 00:00:00"), expected);
        assert_eq!(parse_acquisition_date("2021-03-15T10:30:00"), expected);
        assert_eq!(parse_acquisition_date(""), None);
        assert_eq!(parse_acquisition_date("next spring"), None);
        assert_eq!(parse_acquisition_date("2021-02-30"), None);
    }

    #[test]
    fn test_sentinel_display() {
        let mut rec = record(&[]);
        assert!(!rec.has_acquisition_date());
        assert_eq!(rec.acquisition_display(), "None Provided");

        rec.acquisition_date = NaiveDate::from_ymd_opt(2022, 7, 1).unwrap();
        assert_eq!(rec.acquisition_display(), "2022-07-01");
    }

    #[test]
    fn test_management_details_skip_blank() {
        let rec = record(&[
            ("Shark 1 (name)", "Ana"),
            ("Shark 1 (email address)", ""),
            ("Shark 1 (shareholding - %)", "40"),
            ("Fish 2 (email)", "bo@example.com"),
            ("Senior Buddy", "Cy"),
            ("ID", "17"),
        ]);

        assert_eq!(
            rec.management_details(),
            vec![
                ("Shark 1 Name".to_string(), "Ana".to_string()),
                ("Shark 1 Shareholding - %".to_string(), "40".to_string()),
                ("Fish 2 Email".to_string(), "bo@example.com".to_string()),
                ("Senior Buddy".to_string(), "Cy".to_string()),
                ("ID".to_string(), "17".to_string()),
            ]
        );
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(GeoPoint::DUBLIN.is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}

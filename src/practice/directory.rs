//! Loaded practice records and the lookups the dashboard offers

use super::join::{join_practice_data, JoinOutput, JoinWarning};
use super::record::PracticeRecord;
use super::table::Table;
use super::JoinResult;
use crate::config::DirectoryConfig;
use std::collections::HashSet;
use std::path::Path;

/// All joined practices, in source order
#[derive(Debug, Clone, Default)]
pub struct PracticeDirectory {
    records: Vec<PracticeRecord>,
    columns: Vec<String>,
}

impl PracticeDirectory {
    pub fn new(records: Vec<PracticeRecord>, columns: Vec<String>) -> Self {
        Self { records, columns }
    }

    /// Read both tables named in `config` and join them
    pub fn load(config: &DirectoryConfig) -> JoinResult<(Self, Vec<JoinWarning>)> {
        let source = Table::from_path(&config.practices_path)?;
        let coordinates = Table::from_path(&config.coordinates_path)?;
        let output = join_practice_data(&source, &coordinates, config.fallback_coordinates)?;
        Ok(Self::from_join(output))
    }

    pub fn from_join(output: JoinOutput) -> (Self, Vec<JoinWarning>) {
        (Self::new(output.records, output.columns), output.warnings)
    }

    pub fn records(&self) -> &[PracticeRecord] {
        &self.records
    }

    /// Column names available for selection and export
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record with exactly this practice name
    pub fn find(&self, name: &str) -> Option<&PracticeRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Distinct names starting with `prefix`, ignoring case, sorted
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_uppercase();
        let mut seen = HashSet::new();
        let mut names: Vec<&str> = self
            .records
            .iter()
            .map(|r| r.name.as_str())
            .filter(|name| name.to_uppercase().starts_with(&prefix))
            .filter(|name| seen.insert(*name))
            .collect();
        names.sort_unstable();
        names
    }

    /// Records containing every non-empty criterion, ignoring case.
    ///
    /// Returns `None` when no criterion has any text.
    pub fn search<S: AsRef<str>>(&self, criteria: &[S]) -> Option<Vec<&PracticeRecord>> {
        let terms: Vec<String> = criteria
            .iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if terms.is_empty() {
            return None;
        }

        Some(
            self.records
                .iter()
                .filter(|r| {
                    let text = r.row_text().to_lowercase();
                    terms.iter().all(|t| text.contains(t.as_str()))
                })
                .collect(),
        )
    }

    /// Records whose practice name appears in `names`
    pub fn select_names<S: AsRef<str>>(&self, names: &[S]) -> Vec<&PracticeRecord> {
        let wanted: HashSet<&str> = names.iter().map(|n| n.as_ref().trim()).collect();
        self.records
            .iter()
            .filter(|r| wanted.contains(r.name.as_str()))
            .collect()
    }
}

/// Practice names from the first column of a CSV file with a header row
pub fn read_name_list(path: impl AsRef<Path>) -> JoinResult<Vec<String>> {
    let table = Table::from_path(path)?;
    Ok((0..table.len())
        .map(|row| table.cell(row, 0).to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

/// Practice names given one per line
pub fn parse_name_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::practice::record::GeoPoint;

    fn directory() -> PracticeDirectory {
        let source = Table::from_reader(
            "Practice Name,Post Code,Address,Country,Shark 1 (name)\n\
             Smile Dental,D01,1 Main St,Ireland,Ana Murphy\n\
             Bright Eyes,T12,2 Quay Rd,Ireland,Bo Walsh\n\
             smart Vision,BT1,3 High St,UK,Ana Byrne\n\
             Smile Dental,D02,4 Side St,Ireland,\n"
                .as_bytes(),
        )
        .unwrap();
        let coords = Table::from_reader(
            "Practice Name,Post Code,Full Address,Latitude,Longitude\n".as_bytes(),
        )
        .unwrap();
        let output = join_practice_data(&source, &coords, GeoPoint::DUBLIN).unwrap();
        PracticeDirectory::from_join(output).0
    }

    #[test]
    fn test_names_with_prefix() {
        let dir = directory();
        assert_eq!(dir.names_with_prefix("s"), vec!["Smile Dental", "smart Vision"]);
        assert_eq!(dir.names_with_prefix("SMI"), vec!["Smile Dental"]);
        assert!(dir.names_with_prefix("xyz").is_empty());
    }

    #[test]
    fn test_find_returns_first() {
        let dir = directory();
        assert_eq!(dir.find("Smile Dental").unwrap().post_code, "D01");
        assert!(dir.find("smile dental").is_none());
    }

    #[test]
    fn test_search_all_terms() {
        let dir = directory();
        let hits = dir.search(&["ana", "IRELAND"]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Smile Dental");

        let hits = dir.search(&["ana", ""]).unwrap();
        assert_eq!(hits.len(), 2);

        assert!(dir.search(&["", "  "]).is_none());
        assert!(dir.search::<&str>(&[]).is_none());
    }

    #[test]
    fn test_select_names() {
        let dir = directory();
        let names = parse_name_lines("Bright Eyes\n\n  smart Vision \nUnknown\n");
        let hits = dir.select_names(&names);
        let found: Vec<_> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(found, vec!["Bright Eyes", "smart Vision"]);
    }
}

//! In-memory store of organisation charts, keyed by practice name

use super::chart::{OrgChart, RoleInfo};
use crate::persistence::PersistenceError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by chart lookups and mutations
#[derive(Error, Debug)]
pub enum OrgError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Role '{role}' not found for practice '{practice}'")]
    RoleNotFound { practice: String, role: String },

    #[error("No organisation chart for practice '{0}'")]
    PracticeNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

pub type OrgResult<T> = Result<T, OrgError>;

/// All organisation charts known to the directory
///
/// Serialises to the organisation document format: a JSON object mapping
/// practice name to chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgStore {
    charts: IndexMap<String, OrgChart>,
}

impl OrgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_chart(&self, practice: &str) -> Option<&OrgChart> {
        self.charts.get(practice)
    }

    /// Like [`get_chart`](Self::get_chart) but failing with `PracticeNotFound`
    pub fn require_chart(&self, practice: &str) -> OrgResult<&OrgChart> {
        self.charts
            .get(practice)
            .ok_or_else(|| OrgError::PracticeNotFound(practice.to_string()))
    }

    /// Look up a role, failing with `RoleNotFound` if the practice has no
    /// chart or the chart has no such role.
    pub fn get_role(&self, practice: &str, role: &str) -> OrgResult<&RoleInfo> {
        self.charts
            .get(practice)
            .and_then(|chart| chart.get_role(role))
            .ok_or_else(|| OrgError::RoleNotFound {
                practice: practice.to_string(),
                role: role.to_string(),
            })
    }

    /// Chart for `practice`, created empty on first use
    pub fn chart_or_default(&mut self, practice: &str) -> &mut OrgChart {
        self.charts.entry(practice.to_string()).or_default()
    }

    pub(crate) fn chart_mut(&mut self, practice: &str) -> Option<&mut OrgChart> {
        self.charts.get_mut(practice)
    }

    /// Put back a chart snapshot taken before a failed mutation
    pub(crate) fn restore(&mut self, practice: &str, snapshot: Option<OrgChart>) {
        match snapshot {
            Some(chart) => {
                self.charts.insert(practice.to_string(), chart);
            }
            None => {
                self.charts.shift_remove(practice);
            }
        }
    }

    pub fn practices(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }

    pub fn charts(&self) -> impl Iterator<Item = (&str, &OrgChart)> {
        self.charts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains_practice(&self, practice: &str) -> bool {
        self.charts.contains_key(practice)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_created_on_first_use() {
        let mut store = OrgStore::new();
        assert!(store.get_chart("Smile Dental").is_none());

        store.chart_or_default("Smile Dental");
        assert!(store.contains_practice("Smile Dental"));
        assert!(store.get_chart("Smile Dental").unwrap().is_empty());
    }

    #[test]
    fn test_get_role_not_found() {
        let mut store = OrgStore::new();
        store
            .chart_or_default("Smile Dental")
            .upsert("Owner", RoleInfo::new("Ana", vec![]));

        assert_eq!(store.get_role("Smile Dental", "Owner").unwrap().name, "Ana");
        assert!(matches!(
            store.get_role("Smile Dental", "Manager"),
            Err(OrgError::RoleNotFound { .. })
        ));
        assert!(matches!(
            store.get_role("Other", "Owner"),
            Err(OrgError::RoleNotFound { .. })
        ));
        assert!(matches!(
            store.require_chart("Other"),
            Err(OrgError::PracticeNotFound(ref p)) if p == "Other"
        ));
        assert!(store.require_chart("Smile Dental").is_ok());
    }

    #[test]
    fn test_restore_snapshot() {
        let mut store = OrgStore::new();
        store.chart_or_default("A").upsert("Owner", RoleInfo::new("Ana", vec![]));

        let snapshot = store.get_chart("A").cloned();
        store.chart_or_default("A").remove("Owner");
        store.restore("A", snapshot);
        assert!(store.get_role("A", "Owner").is_ok());

        store.chart_or_default("B");
        store.restore("B", None);
        assert!(!store.contains_practice("B"));
    }
}

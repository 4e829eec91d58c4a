//! Organisation chart data model
//!
//! A chart maps role names to the person holding the role and the ordered
//! list of roles it `reports` to. Role names are unique by construction
//! (they are the map key). Report targets are free text and may name roles
//! that are not in the chart; those are kept as dangling references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Holder and report links for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    /// Name of the person holding the role
    pub name: String,

    /// Related roles, in the order they were entered
    #[serde(default)]
    pub reports: Vec<String>,
}

impl RoleInfo {
    pub fn new(name: impl Into<String>, reports: Vec<String>) -> Self {
        RoleInfo {
            name: name.into(),
            reports,
        }
    }
}

/// A report entry that does not resolve to a role in the same chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReport {
    pub role: String,
    pub target: String,
}

/// Role graph for a single practice
///
/// Iteration order is the order roles were first inserted, which keeps
/// the JSON document stable across load and save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgChart {
    roles: IndexMap<String, RoleInfo>,
}

impl OrgChart {
    /// Create an empty chart
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_role(&self, role: &str) -> Option<&RoleInfo> {
        self.roles.get(role)
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Insert or overwrite a role. An existing role keeps its position.
    pub fn upsert(&mut self, role: impl Into<String>, info: RoleInfo) -> Option<RoleInfo> {
        self.roles.insert(role.into(), info)
    }

    /// Remove a role without touching other roles' `reports`
    pub fn remove(&mut self, role: &str) -> Option<RoleInfo> {
        self.roles.shift_remove(role)
    }

    /// Strip `target` from every role's `reports` list.
    /// Returns the number of entries removed.
    pub fn remove_reports_to(&mut self, target: &str) -> usize {
        let mut removed = 0;
        for info in self.roles.values_mut() {
            let before = info.reports.len();
            info.reports.retain(|r| r != target);
            removed += before - info.reports.len();
        }
        removed
    }

    pub fn roles(&self) -> impl Iterator<Item = (&str, &RoleInfo)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    pub(crate) fn get_key_value(&self, role: &str) -> Option<(&String, &RoleInfo)> {
        self.roles.get_key_value(role)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Every `reports` entry naming a role missing from this chart,
    /// in role order then report order.
    pub fn dangling_reports(&self) -> Vec<DanglingReport> {
        self.roles
            .iter()
            .flat_map(|(role, info)| {
                info.reports
                    .iter()
                    .filter(|target| !self.roles.contains_key(target.as_str()))
                    .map(move |target| DanglingReport {
                        role: role.clone(),
                        target: target.clone(),
                    })
            })
            .collect()
    }
}

impl FromIterator<(String, RoleInfo)> for OrgChart {
    fn from_iter<T: IntoIterator<Item = (String, RoleInfo)>>(iter: T) -> Self {
        OrgChart {
            roles: iter.into_iter().collect(),
        }
    }
}

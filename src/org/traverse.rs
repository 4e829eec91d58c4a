//! Role drill-down over an organisation chart
//!
//! Traversal follows `reports` edges depth-first, in the stored order of
//! each role's list. Every role is yielded at most once, so cycles and
//! self-references terminate. Report targets missing from the chart are
//! skipped.

use super::chart::{OrgChart, RoleInfo};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Lazy depth-first walk starting at one role
pub struct Traversal<'a> {
    chart: &'a OrgChart,
    stack: Vec<&'a str>,
    visited: FxHashSet<&'a str>,
}

impl<'a> Traversal<'a> {
    fn new(chart: &'a OrgChart, start: &str) -> Self {
        let stack = match chart.get_key_value(start) {
            Some((role, _)) => vec![role.as_str()],
            None => Vec::new(),
        };

        Traversal {
            chart,
            stack,
            visited: FxHashSet::default(),
        }
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = (&'a str, &'a RoleInfo);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(role) = self.stack.pop() {
            if self.visited.contains(role) {
                continue;
            }
            let Some((key, info)) = self.chart.get_key_value(role) else {
                continue;
            };
            self.visited.insert(key.as_str());

            // Reverse so the first entry is popped next
            for target in info.reports.iter().rev() {
                if !self.visited.contains(target.as_str()) {
                    self.stack.push(target.as_str());
                }
            }

            return Some((key.as_str(), info));
        }
        None
    }
}

/// Walk the roles reachable from `start_role`.
///
/// An unknown start role yields an empty sequence.
pub fn traverse<'a>(chart: &'a OrgChart, start_role: &str) -> Traversal<'a> {
    Traversal::new(chart, start_role)
}

/// One entry of a role's `reports` list, as shown in a drill-down step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLink<'a> {
    pub target: &'a str,
    /// Holder of the target role, `None` when the target is dangling
    pub holder: Option<&'a str>,
}

/// The direct `reports` of `role`, or `None` when the role is absent
pub fn reports_of<'a>(chart: &'a OrgChart, role: &str) -> Option<Vec<ReportLink<'a>>> {
    let info = chart.get_role(role)?;
    Some(
        info.reports
            .iter()
            .map(|target| ReportLink {
                target: target.as_str(),
                holder: chart.get_role(target).map(|r| r.name.as_str()),
            })
            .collect(),
    )
}

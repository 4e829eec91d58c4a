//! Write-side operations on organisation charts
//!
//! Every successful mutation is handed to a [`ChartSink`] before the call
//! returns. If the sink fails, the practice's chart is rolled back so the
//! in-memory store never runs ahead of the durable copy.

use super::chart::{OrgChart, RoleInfo};
use super::store::{OrgError, OrgResult, OrgStore};
use crate::persistence::PersistenceResult;
use tracing::{debug, info};

/// Destination for the full store after each mutation
pub trait ChartSink {
    fn persist(&mut self, store: &OrgStore) -> PersistenceResult<()>;
}

/// How `delete_role` treats references to the deleted role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Leave other roles' `reports` untouched
    #[default]
    Preserve,
    /// Remove the deleted role from every other role's `reports`
    Cascade,
}

/// Split comma-separated report input into trimmed, non-empty role names
pub fn parse_reports(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate(role: &str, holder_name: &str) -> OrgResult<()> {
    if role.trim().is_empty() {
        return Err(OrgError::Validation("role name must not be empty".to_string()));
    }
    if holder_name.trim().is_empty() {
        return Err(OrgError::Validation(format!(
            "holder name for role '{}' must not be empty",
            role
        )));
    }
    Ok(())
}

/// Apply `change` to the chart of `practice`, persist, and roll back on failure
fn commit<S, F>(store: &mut OrgStore, sink: &mut S, practice: &str, change: F) -> OrgResult<()>
where
    S: ChartSink + ?Sized,
    F: FnOnce(&mut OrgChart),
{
    let snapshot = store.get_chart(practice).cloned();
    change(store.chart_or_default(practice));

    if let Err(e) = sink.persist(store) {
        store.restore(practice, snapshot);
        return Err(e.into());
    }
    Ok(())
}

/// Insert a role, overwriting any existing role with the same name
pub fn add_role<S: ChartSink + ?Sized>(
    store: &mut OrgStore,
    sink: &mut S,
    practice: &str,
    role: &str,
    holder_name: &str,
    reports: Vec<String>,
) -> OrgResult<()> {
    validate(role, holder_name)?;

    commit(store, sink, practice, |chart| {
        if chart.upsert(role, RoleInfo::new(holder_name, reports)).is_some() {
            debug!("Overwrote existing role '{}' in '{}'", role, practice);
        }
    })?;

    info!("Added role '{}' to '{}'", role, practice);
    Ok(())
}

/// Replace the holder and reports of an existing role
pub fn edit_role<S: ChartSink + ?Sized>(
    store: &mut OrgStore,
    sink: &mut S,
    practice: &str,
    role: &str,
    new_holder_name: &str,
    new_reports: Vec<String>,
) -> OrgResult<()> {
    store.get_role(practice, role)?;
    validate(role, new_holder_name)?;

    commit(store, sink, practice, |chart| {
        chart.upsert(role, RoleInfo::new(new_holder_name, new_reports));
    })?;

    info!("Updated role '{}' in '{}'", role, practice);
    Ok(())
}

/// Remove a role. Other roles keep their `reports` unless `mode` is `Cascade`.
pub fn delete_role<S: ChartSink + ?Sized>(
    store: &mut OrgStore,
    sink: &mut S,
    practice: &str,
    role: &str,
    mode: DeleteMode,
) -> OrgResult<()> {
    store.get_role(practice, role)?;

    commit(store, sink, practice, |chart| {
        chart.remove(role);
        if mode == DeleteMode::Cascade {
            let removed = chart.remove_reports_to(role);
            debug!("Cascade removed {} report links to '{}'", removed, role);
        }
    })?;

    info!("Deleted role '{}' from '{}'", role, practice);
    Ok(())
}

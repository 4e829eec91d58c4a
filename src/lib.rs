//! Practice Directory
//!
//! Core library behind the practice directory dashboard: it joins the
//! practice spreadsheet with a coordinates table, answers search and
//! reporting queries over the joined records, and maintains per-practice
//! organisation charts persisted to a single JSON document.
//!
//! # Components
//!
//! - `org`: role charts, cycle-safe drill-down, node/edge rendering and
//!   validated add/edit/delete operations
//! - `persistence`: the JSON organisation document with atomic
//!   replace-on-save and concurrent-writer detection
//! - `practice`: CSV ingestion, the practice/coordinates join with
//!   fallbacks, search filters, acquisition reports and CSV export
//! - `config`: paths and fallback values, loadable from YAML
//!
//! ## Example Usage
//!
//! ```rust
//! use practice_directory::org::{render_graph, traverse, OrgChart, RoleInfo};
//!
//! let mut chart = OrgChart::new();
//! chart.upsert("Owner", RoleInfo::new("Ana", vec!["Manager".to_string()]));
//! chart.upsert("Manager", RoleInfo::new("Bo", vec![]));
//!
//! // Walk the chart from the owner down
//! let roles: Vec<&str> = traverse(&chart, "Owner").map(|(role, _)| role).collect();
//! assert_eq!(roles, vec!["Owner", "Manager"]);
//!
//! // Build a displayable graph
//! let graph = render_graph(&chart);
//! assert_eq!(graph.nodes.len(), 2);
//! assert_eq!(graph.edges.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod org;
pub mod persistence;
pub mod practice;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, DirectoryConfig};

pub use org::{
    add_role, delete_role, edit_role, render_graph, traverse, ChartGraph, ChartSink, DeleteMode,
    OrgChart, OrgError, OrgResult, OrgStore, RoleInfo,
};

pub use persistence::{
    load_store, save_store, LoadFailure, OrgDocument, OrgManager, PersistenceError,
    PersistenceResult,
};

pub use practice::{
    join_practice_data, GeoPoint, JoinError, JoinResult, JoinWarning, PracticeDirectory,
    PracticeRecord, Table,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

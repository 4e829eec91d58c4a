//! Organisation chart engine
//!
//! This module implements per-practice role charts with:
//! - A role-keyed chart model with ordered `reports` links
//! - A store of charts keyed by practice name
//! - Validated add/edit/delete operations that persist on every change
//! - Cycle-safe depth-first drill-down and a node/edge rendering adapter

pub mod chart;
pub mod mutation;
pub mod render;
pub mod store;
pub mod traverse;

// Re-export main types
pub use chart::{DanglingReport, OrgChart, RoleInfo};
pub use mutation::{add_role, delete_role, edit_role, parse_reports, ChartSink, DeleteMode};
pub use render::{render_graph, ChartGraph, GraphEdge, GraphNode, UNKNOWN_ROLE_LABEL};
pub use store::{OrgError, OrgResult, OrgStore};
pub use traverse::{reports_of, traverse, ReportLink, Traversal};

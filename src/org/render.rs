//! Node/edge description of an organisation chart for visualisation
//!
//! Every role becomes a node labelled with the role and its holder. Each
//! `reports` entry becomes a directed edge from the role to the entry.
//! Targets that are not roles in the chart are rendered as placeholder
//! nodes whose holder slot reads "(unknown role)".

use super::chart::OrgChart;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;

/// Holder text shown for a dangling report target
pub const UNKNOWN_ROLE_LABEL: &str = "(unknown role)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// Displayable graph built from a chart
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl ChartGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "nodes": self.nodes,
            "edges": self.edges,
        })
    }

    /// Graphviz DOT source for the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");
        for node in &self.nodes {
            let style = if node.placeholder { ", style=dashed" } else { "" };
            // Writing into a String cannot fail
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\"{}];",
                escape_dot(&node.id),
                escape_dot(&node.label),
                style
            );
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "    \"{}\" -> \"{}\";",
                escape_dot(&edge.source),
                escape_dot(&edge.target)
            );
        }
        out.push_str("}\n");
        out
    }
}

/// Build the display graph for `chart`
pub fn render_graph(chart: &OrgChart) -> ChartGraph {
    let mut graph = ChartGraph::default();

    for (role, info) in chart.roles() {
        graph.nodes.push(GraphNode {
            id: role.to_string(),
            label: format!("{}\n{}", role, info.name),
            placeholder: false,
        });
    }

    let mut placeholders = HashSet::new();
    for (role, info) in chart.roles() {
        for target in &info.reports {
            if !chart.contains_role(target) && placeholders.insert(target.as_str()) {
                graph.nodes.push(GraphNode {
                    id: target.clone(),
                    label: format!("{}\n{}", target, UNKNOWN_ROLE_LABEL),
                    placeholder: true,
                });
            }
            graph.edges.push(GraphEdge {
                source: role.to_string(),
                target: target.clone(),
            });
        }
    }

    graph
}

fn escape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

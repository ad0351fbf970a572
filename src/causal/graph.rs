//! Causal graph representation

use serde::{Deserialize, Serialize};

/// What a graph node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Clause,
    Risk,
}

/// A clause or a declared risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// `clause_<n>` or a risk id declared by the analysis
    pub id: String,
    pub kind: NodeKind,
    /// Clause heading or risk description
    pub label: Option<String>,
}

impl GraphNode {
    pub fn clause(id: impl Into<String>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Clause,
            label,
        }
    }

    pub fn risk(id: impl Into<String>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Risk,
            label,
        }
    }
}

/// A directed causal relation between two existing nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Normalized label, e.g. `conditions`, `depends_on`
    pub relation: String,
    pub description: Option<String>,
}

/// Validated graph: every edge endpoint is in `nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl CausalGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// True when every edge references nodes of this graph
    pub fn is_consistent(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.contains(&e.from) && self.contains(&e.to))
    }
}

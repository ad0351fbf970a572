//! Edge validation and graph assembly

use super::graph::{CausalGraph, GraphEdge, GraphNode};
use std::collections::HashSet;
use tracing::warn;

/// A relation as declared by the analysis, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredRelation {
    pub from: String,
    pub to: String,
    pub relation: String,
    pub description: Option<String>,
}

impl DeclaredRelation {
    pub fn new(from: impl Into<String>, to: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            relation: relation.into(),
            description: None,
        }
    }
}

/// Why a declared relation was not kept
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphWarning {
    #[error("dropped edge {from} -> {to}: unknown node '{missing}'")]
    UnknownEndpoint {
        from: String,
        to: String,
        missing: String,
    },
    #[error("dropped self-loop on {id}")]
    SelfLoop { id: String },
    #[error("dropped edge {from} -> {to}: empty relation label")]
    EmptyRelation { from: String, to: String },
}

/// Output of [`CausalGraphBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub graph: CausalGraph,
    pub warnings: Vec<GraphWarning>,
}

/// Lowercase, trimmed, with internal whitespace and hyphens as underscores
pub fn normalize_relation(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Collects the valid node ids, then filters declared relations against them.
///
/// Clause nodes always appear in the graph. Risk nodes appear only when a
/// kept edge touches them.
#[derive(Debug, Clone, Default)]
pub struct CausalGraphBuilder {
    clauses: Vec<GraphNode>,
    risks: Vec<GraphNode>,
}

impl CausalGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clause(mut self, id: impl Into<String>, heading: Option<String>) -> Self {
        self.clauses.push(GraphNode::clause(id, heading));
        self
    }

    /// Declare a risk id. Ids that collide with a clause id or an earlier
    /// risk are ignored.
    pub fn risk(mut self, id: impl Into<String>, description: Option<String>) -> Self {
        let id = id.into();
        let id = id.trim();
        if !id.is_empty() && !self.is_known(id) {
            self.risks.push(GraphNode::risk(id, description));
        }
        self
    }

    fn is_known(&self, id: &str) -> bool {
        self.clauses.iter().chain(&self.risks).any(|n| n.id == id)
    }

    pub fn build(self, relations: impl IntoIterator<Item = DeclaredRelation>) -> GraphBuild {
        let mut warnings = Vec::new();
        let mut edges: Vec<GraphEdge> = Vec::new();
        let mut seen = HashSet::new();

        for declared in relations {
            let from = declared.from.trim().to_string();
            let to = declared.to.trim().to_string();

            let missing = [&from, &to].into_iter().find(|id| !self.is_known(id));
            if let Some(missing) = missing {
                warnings.push(GraphWarning::UnknownEndpoint {
                    from: from.clone(),
                    to: to.clone(),
                    missing: missing.clone(),
                });
                continue;
            }
            if from == to {
                warnings.push(GraphWarning::SelfLoop { id: from });
                continue;
            }
            let relation = normalize_relation(&declared.relation);
            if relation.is_empty() {
                warnings.push(GraphWarning::EmptyRelation { from, to });
                continue;
            }
            if !seen.insert((from.clone(), to.clone(), relation.clone())) {
                continue;
            }

            edges.push(GraphEdge {
                from,
                to,
                relation,
                description: declared
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
            });
        }

        for warning in &warnings {
            warn!(%warning, "causal edge dropped");
        }

        let touched: HashSet<&str> = edges
            .iter()
            .flat_map(|e| [e.from.as_str(), e.to.as_str()])
            .collect();
        let mut nodes = self.clauses.clone();
        nodes.extend(
            self.risks
                .iter()
                .filter(|risk| touched.contains(risk.id.as_str()))
                .cloned(),
        );

        GraphBuild {
            graph: CausalGraph { nodes, edges },
            warnings,
        }
    }
}

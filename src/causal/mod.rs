//! Causal relation graph between clauses and risks
//!
//! The analysis declares relations by id; [`CausalGraphBuilder`] checks them
//! against the ids that actually exist and keeps only the valid ones. Invalid
//! edges are dropped and reported as [`GraphWarning`]s, never repaired.

mod builder;
mod graph;

pub use builder::{normalize_relation, CausalGraphBuilder, DeclaredRelation, GraphBuild, GraphWarning};
pub use graph::{CausalGraph, GraphEdge, GraphNode, NodeKind};

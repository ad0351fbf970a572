//! Clause representation

use serde::{Deserialize, Serialize};

/// Byte range into the normalized document text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Graph node id for the clause at `index` (1-based)
pub fn clause_node_id(index: usize) -> String {
    format!("clause_{}", index)
}

/// One numbered unit of a legal document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// 1-based position in document order
    pub index: usize,
    /// Marker text as written in the source (e.g. "제1조", "Article 3")
    pub marker: Option<String>,
    pub heading: Option<String>,
    pub text: String,
    pub span: Span,
    /// Labels of the parties this clause mentions
    pub parties: Vec<String>,
}

impl Clause {
    pub fn node_id(&self) -> String {
        clause_node_id(self.index)
    }
}

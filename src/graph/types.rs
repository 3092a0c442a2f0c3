//! Node, edge and result types for the relationship graph.

use serde::Serialize;

use crate::inference::RelationshipType;

/// Confidence given to every two-hop join suggestion.
pub const INDIRECT_CONFIDENCE: f64 = 0.5;

/// A table in the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableNode {
    pub name: String,
    /// `None` for failed tables and for tables known only from edges.
    pub row_count: Option<u64>,
}

/// A relationship kept as a graph edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipEdge {
    pub column: String,
    pub confidence: f64,
    pub relationship_type: RelationshipType,
}

/// An edge with its endpoints resolved to table names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub source: String,
    pub target: String,
    pub column: String,
    pub confidence: f64,
    pub relationship_type: RelationshipType,
}

/// Edges around one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Neighbors {
    /// The table is the source.
    pub outgoing: Vec<EdgeView>,
    /// The table is the target.
    pub incoming: Vec<EdgeView>,
}

impl Neighbors {
    pub fn total(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

/// How to join two tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinSuggestion {
    /// An edge between the two tables, in either direction.
    Direct(EdgeView),
    /// A two-hop path `from -> via -> to` following edge direction.
    Indirect { path: Vec<String>, confidence: f64 },
}

impl JoinSuggestion {
    pub fn confidence(&self) -> f64 {
        match self {
            JoinSuggestion::Direct(edge) => edge.confidence,
            JoinSuggestion::Indirect { confidence, .. } => *confidence,
        }
    }

    /// `Source -> Target` or `A -> B -> C`.
    pub fn describe(&self) -> String {
        match self {
            JoinSuggestion::Direct(edge) => {
                format!("{} -> {} on {}", edge.source, edge.target, edge.column)
            }
            JoinSuggestion::Indirect { path, .. } => path.join(" -> "),
        }
    }
}

/// Position of a table in the relationship structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Only outgoing edges (references others).
    Source,
    /// Only incoming edges (referenced by others).
    Sink,
    /// Both.
    Hub,
    /// No edges at all.
    Isolated,
}

impl Connectivity {
    pub fn from_degrees(incoming: usize, outgoing: usize) -> Self {
        match (incoming > 0, outgoing > 0) {
            (true, true) => Connectivity::Hub,
            (false, true) => Connectivity::Source,
            (true, false) => Connectivity::Sink,
            (false, false) => Connectivity::Isolated,
        }
    }
}

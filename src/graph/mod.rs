//! Relationship graph.
//!
//! A directed graph over table names: nodes carry the table size, edges are
//! mined relationships at or above a confidence floor, pointing from the
//! referencing table to the referenced one. Rebuilt from the relationship
//! list whenever needed; never persisted.

mod builder;
pub mod query;
pub mod types;

pub use builder::build_graph;
pub use query::{QueryError, QueryResult};
pub use types::*;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

/// Default cap on indirect join suggestions.
pub const DEFAULT_INDIRECT_PATH_CAP: usize = 10;

#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    graph: DiGraph<TableNode, RelationshipEdge>,

    /// Index: table name → NodeIndex
    node_index: HashMap<String, NodeIndex>,

    min_confidence: f64,
    indirect_path_cap: usize,
}

impl RelationshipGraph {
    fn empty(min_confidence: f64) -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            min_confidence,
            indirect_path_cap: DEFAULT_INDIRECT_PATH_CAP,
        }
    }

    pub fn with_indirect_path_cap(mut self, cap: usize) -> Self {
        self.indirect_path_cap = cap;
        self
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.node_index.contains_key(table)
    }

    pub fn table(&self, name: &str) -> Option<&TableNode> {
        self.node_index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &TableNode> {
        self.graph.node_weights()
    }

    /// All edges with resolved endpoint names.
    pub fn edges(&self) -> Vec<EdgeView> {
        self.graph
            .edge_indices()
            .filter_map(|idx| {
                let (source, target) = self.graph.edge_endpoints(idx)?;
                Some(self.view(source, target, &self.graph[idx]))
            })
            .collect()
    }

    fn view(&self, source: NodeIndex, target: NodeIndex, edge: &RelationshipEdge) -> EdgeView {
        EdgeView {
            source: self.graph[source].name.clone(),
            target: self.graph[target].name.clone(),
            column: edge.column.clone(),
            confidence: edge.confidence,
            relationship_type: edge.relationship_type,
        }
    }
}

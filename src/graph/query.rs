//! Queries over the relationship graph.
//!
//! - Neighborhood: outgoing and incoming edges of a table
//! - Joins: direct edges between two tables, else two-hop paths
//! - Connectivity: source/sink/hub/isolated classification

use std::collections::HashSet;

use petgraph::algo::all_simple_paths;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use super::{
    Connectivity, EdgeView, JoinSuggestion, Neighbors, RelationshipGraph, INDIRECT_CONFIDENCE,
};

/// Errors that can occur during graph queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

impl RelationshipGraph {
    // ========================================================================
    // Neighborhood
    // ========================================================================

    /// Split the edges touching `table` into outgoing and incoming.
    pub fn neighbors_of(&self, table: &str) -> QueryResult<Neighbors> {
        let idx = self.index(table)?;
        Ok(Neighbors {
            outgoing: self.edges_directed(idx, Direction::Outgoing),
            incoming: self.edges_directed(idx, Direction::Incoming),
        })
    }

    fn edges_directed(&self, idx: NodeIndex, direction: Direction) -> Vec<EdgeView> {
        let mut edges: Vec<EdgeView> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| self.view(e.source(), e.target(), e.weight()))
            .collect();
        // petgraph walks adjacency lists newest first
        edges.reverse();
        edges
    }

    // ========================================================================
    // Joins
    // ========================================================================

    /// Suggest how to join `a` and `b`.
    ///
    /// Direct edges in either direction come first, ranked by confidence.
    /// Only when there are none, two-hop paths `a -> x -> b` and
    /// `b -> x -> a` are returned at [`INDIRECT_CONFIDENCE`], up to the
    /// indirect path cap. An empty result means the tables are unrelated.
    pub fn suggest_join(&self, a: &str, b: &str) -> QueryResult<Vec<JoinSuggestion>> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;

        let mut direct: Vec<EdgeView> = self
            .edges_directed(ia, Direction::Outgoing)
            .into_iter()
            .filter(|e| e.target == b)
            .chain(
                self.edges_directed(ib, Direction::Outgoing)
                    .into_iter()
                    .filter(|e| e.target == a),
            )
            .collect();

        if !direct.is_empty() {
            direct.sort_by(|x, y| y.confidence.total_cmp(&x.confidence));
            return Ok(direct.into_iter().map(JoinSuggestion::Direct).collect());
        }

        let mut seen = HashSet::new();
        let suggestions = self
            .two_hop_paths(ia, ib)
            .chain(self.two_hop_paths(ib, ia))
            .filter(|path| seen.insert(path.clone()))
            .take(self.indirect_path_cap)
            .map(|path| JoinSuggestion::Indirect {
                path: path.iter().map(|idx| self.graph[*idx].name.clone()).collect(),
                confidence: INDIRECT_CONFIDENCE,
            })
            .collect();
        Ok(suggestions)
    }

    fn two_hop_paths(
        &self,
        from: NodeIndex,
        to: NodeIndex,
    ) -> impl Iterator<Item = Vec<NodeIndex>> + '_ {
        all_simple_paths::<Vec<NodeIndex>, _>(&self.graph, from, to, 1, Some(1))
    }

    // ========================================================================
    // Connectivity
    // ========================================================================

    pub fn connectivity(&self, table: &str) -> QueryResult<Connectivity> {
        let idx = self.index(table)?;
        Ok(self.classify(idx))
    }

    /// Tables with no edges, in insertion order.
    pub fn isolated_tables(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|idx| self.classify(*idx) == Connectivity::Isolated)
            .map(|idx| self.graph[idx].name.as_str())
            .collect()
    }

    fn classify(&self, idx: NodeIndex) -> Connectivity {
        let incoming = self.graph.edges_directed(idx, Direction::Incoming).count();
        let outgoing = self.graph.edges_directed(idx, Direction::Outgoing).count();
        Connectivity::from_degrees(incoming, outgoing)
    }

    fn index(&self, table: &str) -> QueryResult<NodeIndex> {
        self.node_index
            .get(table)
            .copied()
            .ok_or_else(|| QueryError::TableNotFound(table.to_string()))
    }
}

//! Graph construction from profiles and mined relationships.

use petgraph::graph::NodeIndex;

use super::{RelationshipEdge, RelationshipGraph, TableNode};
use crate::config::GraphSettings;
use crate::inference::Relationship;
use crate::scan::ProfileSet;

impl RelationshipGraph {
    /// Build the graph.
    ///
    /// Every profiled table becomes a node, including failed and isolated
    /// ones. Relationships below `min_confidence` are dropped; endpoints
    /// missing from `profiles` get a node with unknown size.
    pub fn build(
        profiles: &ProfileSet,
        relationships: &[Relationship],
        min_confidence: f64,
    ) -> Self {
        let mut graph = Self::empty(min_confidence);

        for profile in profiles {
            graph.add_table(&profile.name, profile.row_count);
        }

        let mut dropped = 0;
        for rel in relationships {
            if rel.confidence < min_confidence {
                dropped += 1;
                continue;
            }
            let source = graph.ensure_table(&rel.source_table);
            let target = graph.ensure_table(&rel.target_table);
            graph.graph.add_edge(
                source,
                target,
                RelationshipEdge {
                    column: rel.relationship_column.clone(),
                    confidence: rel.confidence,
                    relationship_type: rel.relationship_type,
                },
            );
        }

        tracing::debug!(
            tables = graph.table_count(),
            edges = graph.edge_count(),
            dropped,
            min_confidence,
            "Relationship graph built"
        );
        graph
    }

    /// Build with the floor and path cap from settings.
    pub fn from_settings(
        profiles: &ProfileSet,
        relationships: &[Relationship],
        settings: &GraphSettings,
    ) -> Self {
        Self::build(profiles, relationships, settings.min_confidence)
            .with_indirect_path_cap(settings.indirect_path_cap)
    }

    fn add_table(&mut self, name: &str, row_count: Option<u64>) -> NodeIndex {
        let index = self.graph.add_node(TableNode {
            name: name.to_string(),
            row_count,
        });
        self.node_index.insert(name.to_string(), index);
        index
    }

    fn ensure_table(&mut self, name: &str) -> NodeIndex {
        match self.node_index.get(name) {
            Some(index) => *index,
            None => self.add_table(name, None),
        }
    }
}

/// Build a relationship graph with the default path cap.
pub fn build_graph(
    profiles: &ProfileSet,
    relationships: &[Relationship],
    min_confidence: f64,
) -> RelationshipGraph {
    RelationshipGraph::build(profiles, relationships, min_confidence)
}

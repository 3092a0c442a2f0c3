// tests/graph/graph_test.rs
use std::fs;
use std::path::Path;

use schemalens::config::{GraphSettings, MiningSettings, ScanSettings};
use schemalens::graph::{build_graph, Connectivity, JoinSuggestion, QueryError};
use schemalens::inference::{mine, Relationship};
use schemalens::scan::{scan_directory, NoProgress, ProfileSet};
use schemalens::RelationshipGraph;

fn fixture() -> (tempfile::TempDir, ProfileSet, Vec<Relationship>) {
    let dir = tempfile::tempdir().unwrap();
    let files: &[(&str, &[u8])] = &[
        ("Cliente.csv", b"ClienteID,Nome\n1,Ana\n2,Bia\n3,Caio\n"),
        ("Pedido.csv", b"PedidoID,ClienteID,Data\n10,1,2024-01-02\n11,1,2024-01-03\n12,3,2024-02-01\n"),
        ("ItemPedido.csv", b"Sequencia,PedidoID,Quantidade\n1,10,2\n2,10,1\n3,11,5\n4,12,1\n"),
        ("Loja.csv", b"Nome,Cidade\nCentro,Recife\n"),
        ("Quebrada.csv", b"\xFF\xFEC\x00o\x00"),
    ];
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }

    let profiles = scan_directory(dir.path(), &ScanSettings::default(), &NoProgress).unwrap();
    let relationships = mine(&profiles, &MiningSettings::default());
    (dir, profiles, relationships)
}

fn edge_pairs(graph: &RelationshipGraph) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = graph
        .edges()
        .into_iter()
        .map(|e| (e.source, e.target))
        .collect();
    pairs.sort();
    pairs
}

#[test]
fn test_scanned_tables_form_a_chain() {
    let (_dir, profiles, relationships) = fixture();
    let graph = build_graph(&profiles, &relationships, 0.5);

    assert_eq!(graph.table_count(), 5);
    assert_eq!(
        edge_pairs(&graph),
        [
            ("ItemPedido".to_string(), "Pedido".to_string()),
            ("Pedido".to_string(), "Cliente".to_string()),
        ]
    );
    assert_eq!(graph.table("Pedido").unwrap().row_count, Some(3));
    assert_eq!(graph.table("Quebrada").unwrap().row_count, None);
}

#[test]
fn test_indirect_join_through_intermediate_table() {
    let (_dir, profiles, relationships) = fixture();
    let graph = build_graph(&profiles, &relationships, 0.5);

    let joins = graph.suggest_join("Cliente", "ItemPedido").unwrap();
    assert_eq!(
        joins,
        [JoinSuggestion::Indirect {
            path: vec![
                "ItemPedido".to_string(),
                "Pedido".to_string(),
                "Cliente".to_string()
            ],
            confidence: 0.5,
        }]
    );
    assert_eq!(joins[0].describe(), "ItemPedido -> Pedido -> Cliente");
}

#[test]
fn test_direct_join_wins() {
    let (_dir, profiles, relationships) = fixture();
    let graph = build_graph(&profiles, &relationships, 0.5);

    let joins = graph.suggest_join("Cliente", "Pedido").unwrap();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].describe(), "Pedido -> Cliente on ClienteID");
    assert_eq!(joins[0].confidence(), 1.0);
}

#[test]
fn test_connectivity_roles() {
    let (_dir, profiles, relationships) = fixture();
    let graph = build_graph(&profiles, &relationships, 0.5);

    assert_eq!(graph.connectivity("ItemPedido").unwrap(), Connectivity::Source);
    assert_eq!(graph.connectivity("Pedido").unwrap(), Connectivity::Hub);
    assert_eq!(graph.connectivity("Cliente").unwrap(), Connectivity::Sink);
    assert_eq!(graph.isolated_tables(), ["Loja", "Quebrada"]);
    assert!(graph.suggest_join("Loja", "Cliente").unwrap().is_empty());
}

#[test]
fn test_confidence_floor_drops_edges() {
    let (_dir, profiles, relationships) = fixture();
    let settings = GraphSettings {
        min_confidence: 1.01,
        ..GraphSettings::default()
    };
    let graph = RelationshipGraph::from_settings(&profiles, &relationships, &settings);

    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.table_count(), 5);
    assert_eq!(graph.isolated_tables().len(), 5);
}

#[test]
fn test_unknown_table() {
    let (_dir, profiles, relationships) = fixture();
    let graph = build_graph(&profiles, &relationships, 0.5);

    assert_eq!(
        graph.neighbors_of("Fantasma").unwrap_err(),
        QueryError::TableNotFound("Fantasma".to_string())
    );
}

// tests/inference/mining_test.rs
use std::fs;
use std::path::Path;

use schemalens::config::{MiningSettings, ScanSettings};
use schemalens::inference::*;
use schemalens::scan::{scan_directory, NoProgress, ProfileSet, TableProfile};

fn write(dir: &Path, name: &str, content: &[u8]) {
    fs::write(dir.join(name), content).unwrap();
}

fn scan(dir: &Path) -> ProfileSet {
    scan_directory(dir, &ScanSettings::default(), &NoProgress).unwrap()
}

fn table(name: &str, columns: &[&str]) -> TableProfile {
    TableProfile {
        row_count: Some(10),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        error: None,
        ..TableProfile::failed(name, format!("/data/{name}.csv"), 0, None, "")
    }
}

#[test]
fn test_cliente_pedido_naming_relationship() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Cliente.csv", b"ClienteID,Nome\n1,Ana\n2,Bia\n");
    write(
        dir.path(),
        "Pedido.csv",
        b"PedidoID,ClienteID,Valor\n10,1,5.0\n11,2,7.5\n12,2,1.0\n",
    );

    let rels = mine(&scan(dir.path()), &MiningSettings::default());
    let rel = rels
        .iter()
        .find(|r| r.source_table == "Pedido" && r.target_table == "Cliente")
        .unwrap();

    assert_eq!(rel.relationship_column, "ClienteID");
    assert_eq!(rel.relationship_type, RelationshipType::Naming);
    assert_eq!(rel.confidence, 1.0);

    let explain = rel.explain();
    assert_eq!(explain.base_score, 0.8);
    assert_eq!(
        explain.adjustments.iter().map(|a| a.reason).collect::<Vec<_>>(),
        ["Column carries an ID affix", "Target is a master table"]
    );
}

#[test]
fn test_corrupt_table_is_excluded_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Cliente.csv", b"ClienteID,Nome\n1,Ana\n");
    write(dir.path(), "Pedido.csv", b"PedidoID,ClienteID\n10,1\n");
    write(dir.path(), "PedidoCliente.csv", b"Pedido\xFFID,Cliente\xFEID\n1,1\n");

    let profiles = scan(dir.path());
    assert!(profiles.get("PedidoCliente").unwrap().is_error());

    let rels = mine(&profiles, &MiningSettings::default());
    assert!(!rels.is_empty());
    assert!(rels.iter().all(|r| !r.involves("PedidoCliente")));
}

#[test]
fn test_erp_pattern_carries_rule_confidence() {
    let profiles: ProfileSet = vec![
        table("Fornecedor", &["Codigo", "RazaoSocial"]),
        table("CompraMateriaPrima", &["Numero", "FornecedorPrincipal"]),
    ]
    .into_iter()
    .collect();

    let rels = mine(&profiles, &MiningSettings::default());
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].relationship_type, RelationshipType::ErpPattern);
    assert_eq!(rels[0].rule_confidence, Some(0.9));
    // 0.9 base + master target
    assert_eq!(rels[0].confidence, 1.0);
}

#[test]
fn test_multiple_columns_between_same_tables_survive() {
    let profiles: ProfileSet = vec![
        table("Cliente", &["ClienteID"]),
        table("Pedido", &["ClienteID", "IdClienteEntrega"]),
    ]
    .into_iter()
    .collect();

    let rels = mine(&profiles, &MiningSettings::default());
    let columns: Vec<&str> = rels
        .iter()
        .filter(|r| r.source_table == "Pedido")
        .map(|r| r.relationship_column.as_str())
        .collect();
    assert_eq!(columns, ["ClienteID", "IdClienteEntrega"]);
}

#[test]
fn test_mining_is_deterministic() {
    let profiles: ProfileSet = vec![
        table("Cliente", &["ClienteID", "VendedorID"]),
        table("Vendedor", &["VendedorID", "Nome"]),
        table("Venda", &["VendaID", "ClienteID", "VendedorID", "ProdutoCod"]),
        table("Produto", &["ProdutoCod", "Descricao"]),
        table("Estoque", &["produto_cod", "Saldo"]),
    ]
    .into_iter()
    .collect();

    let first = mine(&profiles, &MiningSettings::default());
    let second = mine(&profiles, &MiningSettings::default());
    assert_eq!(first, second);
    assert!(first.len() >= 4);
}

#[test]
fn test_data_pattern_honors_table_cap() {
    let profiles: ProfileSet = vec![
        table("Deposito", &["loja_id"]),
        table("Filial", &["loja_cod"]),
    ]
    .into_iter()
    .collect();

    assert_eq!(mine(&profiles, &MiningSettings::default()).len(), 1);

    let capped = MiningSettings {
        data_pattern_max_tables: 1,
        ..MiningSettings::default()
    };
    assert!(mine(&profiles, &capped).is_empty());
}

#[test]
fn test_custom_detector_appends_candidates() {
    struct Fixed;

    impl CandidateGenerator for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn generate(&self, tables: &[&TableProfile]) -> Vec<Relationship> {
            vec![
                Relationship::candidate(
                    &tables[0].name,
                    &tables[1].name,
                    "x",
                    RelationshipType::Unknown,
                    "fixed",
                ),
                Relationship::candidate(&tables[0].name, &tables[0].name, "x", RelationshipType::Unknown, ""),
            ]
        }
    }

    let profiles: ProfileSet = vec![table("A", &["x"]), table("B", &["y"])]
        .into_iter()
        .collect();
    let rels = RelationshipMiner::empty().with_detector(Fixed).mine(&profiles);

    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].confidence, 0.4);
}

#[test]
fn test_export_rows() {
    let profiles: ProfileSet = vec![
        table("Cliente", &["ClienteID"]),
        table("Loja", &["LojaID"]),
        table("Venda", &["ClienteID", "loja_id"]),
    ]
    .into_iter()
    .collect();
    let rows = to_rows(&mine(&profiles, &MiningSettings::default()));

    assert!(rows.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    let csv = RelationshipRow::to_csv_string(&rows).unwrap();
    assert!(csv.starts_with(
        "source_table,target_table,relationship_column,relationship_type,confidence,evidence\n"
    ));
    assert_eq!(csv.lines().count(), rows.len() + 1);
}

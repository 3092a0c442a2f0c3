// tests/inference/properties_test.rs
use proptest::prelude::*;

use schemalens::config::MiningSettings;
use schemalens::inference::mine;
use schemalens::scan::{ProfileSet, TableProfile};

const TABLES: &[&str] = &[
    "Cliente", "Clientes", "Pedido", "ItemPedido", "Produto", "Fornecedor", "Compra", "Venda",
    "Vendedor", "Estoque", "Lancamento", "ContaBanco", "Loja",
];

const COLUMNS: &[&str] = &[
    "ClienteID", "cod_produto", "IdPedido", "FornecedorCod", "VendedorID", "loja_id", "LojaCod",
    "Numero", "Nome", "Valor", "conta", "produto_cod", "ID", "Descricao",
];

fn profile_set() -> impl Strategy<Value = ProfileSet> {
    prop::collection::vec(
        (
            prop::sample::select(TABLES),
            prop::collection::vec(prop::sample::select(COLUMNS), 0..5),
            0u64..200_000,
            any::<bool>(),
        ),
        0..8,
    )
    .prop_map(|tables| {
        tables
            .into_iter()
            .map(|(name, columns, rows, broken)| {
                let base = TableProfile::failed(name, format!("/data/{name}.csv"), 0, None, "boom");
                if broken {
                    base
                } else {
                    TableProfile {
                        row_count: Some(rows),
                        columns: columns.into_iter().map(str::to_string).collect(),
                        error: None,
                        ..base
                    }
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn confidence_is_bounded(profiles in profile_set()) {
        for rel in mine(&profiles, &MiningSettings::default()) {
            prop_assert!((0.0..=1.0).contains(&rel.confidence), "{rel:?}");
        }
    }

    #[test]
    fn no_self_edges_or_error_tables(profiles in profile_set()) {
        for rel in mine(&profiles, &MiningSettings::default()) {
            prop_assert_ne!(&rel.source_table, &rel.target_table);
            for table in [&rel.source_table, &rel.target_table] {
                let profile = profiles.get(table);
                prop_assert!(profile.is_some_and(|p| !p.is_error()), "{table}");
            }
        }
    }

    #[test]
    fn keys_are_unique(profiles in profile_set()) {
        let rels = mine(&profiles, &MiningSettings::default());
        let mut keys: Vec<_> = rels.iter().map(|r| r.key()).collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), rels.len());
    }

    #[test]
    fn mining_is_deterministic(profiles in profile_set()) {
        let settings = MiningSettings::default();
        prop_assert_eq!(mine(&profiles, &settings), mine(&profiles, &settings));
    }
}

//! Relationship detectors.
//!
//! Each detector is an independent [`CandidateGenerator`]. Detectors only
//! propose candidates; merging, deduplication and scoring happen in the miner.

use crate::config::MiningSettings;
use crate::scan::TableProfile;

use super::inflection::singularize;
use super::rules::{
    looks_like_id, naming_patterns, normalize_id_column, CompiledRule, ErpRule, ERP_RULES,
};
use super::{Relationship, RelationshipType};

/// A strategy that proposes candidate relationships over valid tables.
///
/// `tables` never contains error-state profiles and is ordered by name.
pub trait CandidateGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, tables: &[&TableProfile]) -> Vec<Relationship>;
}

// ============================================================================
// Naming
// ============================================================================

/// Columns whose name embeds another table's name (`ClienteID`, `cod_produto`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingDetector;

impl NamingDetector {
    fn patterns_for(table: &str) -> Vec<String> {
        let lower = table.to_lowercase();
        let singular = singularize(&lower);
        let mut patterns = naming_patterns(&lower);
        if singular != lower && !singular.is_empty() {
            patterns.extend(naming_patterns(&singular));
        }
        patterns
    }
}

impl CandidateGenerator for NamingDetector {
    fn name(&self) -> &'static str {
        "naming"
    }

    fn generate(&self, tables: &[&TableProfile]) -> Vec<Relationship> {
        let patterns: Vec<(&str, Vec<String>)> = tables
            .iter()
            .map(|t| (t.name.as_str(), Self::patterns_for(&t.name)))
            .collect();

        let mut found = Vec::new();
        for table in tables {
            for column in &table.columns {
                let column_lower = column.to_lowercase();
                for (other, other_patterns) in &patterns {
                    if *other == table.name {
                        continue;
                    }
                    if other_patterns.iter().any(|p| column_lower.contains(p.as_str())) {
                        found.push(Relationship::candidate(
                            &table.name,
                            *other,
                            column,
                            RelationshipType::Naming,
                            format!("Column '{column}' references table '{other}'"),
                        ));
                    }
                }
            }
        }
        found
    }
}

// ============================================================================
// ERP patterns
// ============================================================================

/// Known ERP table families joined by a column fragment.
#[derive(Debug, Clone)]
pub struct ErpPatternDetector {
    rules: Vec<CompiledRule>,
}

impl Default for ErpPatternDetector {
    fn default() -> Self {
        Self::new(ERP_RULES)
    }
}

impl ErpPatternDetector {
    /// Rules whose patterns do not compile are skipped with a warning.
    pub fn new(rules: &[ErpRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match rule.compile() {
                Ok(compiled) => Some(compiled),
                Err(error) => {
                    tracing::warn!(?rule, %error, "Skipping invalid ERP rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl CandidateGenerator for ErpPatternDetector {
    fn name(&self) -> &'static str {
        "erp_pattern"
    }

    fn generate(&self, tables: &[&TableProfile]) -> Vec<Relationship> {
        let mut found = Vec::new();
        for rule in &self.rules {
            let targets = tables.iter().filter(|t| rule.matches_target(&t.name));
            for target in targets {
                let sources = tables.iter().filter(|t| rule.matches_source(&t.name));
                for source in sources {
                    if source.name == target.name {
                        continue;
                    }
                    for column in source.columns.iter().filter(|c| rule.matches_column(c)) {
                        let mut rel = Relationship::candidate(
                            &source.name,
                            &target.name,
                            column,
                            RelationshipType::ErpPattern,
                            format!("ERP pattern: {}.{column} -> {}", source.name, target.name),
                        );
                        rel.rule_confidence = Some(rule.rule.base_confidence);
                        found.push(rel);
                    }
                }
            }
        }
        found
    }
}

// ============================================================================
// Data patterns
// ============================================================================

/// Equivalent ID-like columns shared by two small tables.
#[derive(Debug, Clone)]
pub struct DataPatternDetector {
    max_rows: u64,
    max_tables: usize,
}

impl Default for DataPatternDetector {
    fn default() -> Self {
        Self::new(&MiningSettings::default())
    }
}

impl DataPatternDetector {
    pub fn new(settings: &MiningSettings) -> Self {
        Self {
            max_rows: settings.data_pattern_max_rows,
            max_tables: settings.data_pattern_max_tables,
        }
    }

    /// Order a matched pair as `(source, target)`.
    ///
    /// The side whose column is more unique is the referenced one. On a tie
    /// the table named by the column wins; failing that, the pair order holds.
    fn orient<'a>(
        a: (&'a TableProfile, &'a str),
        b: (&'a TableProfile, &'a str),
    ) -> ((&'a TableProfile, &'a str), (&'a TableProfile, &'a str)) {
        let ua = a.0.uniqueness(a.1).unwrap_or(0.0);
        let ub = b.0.uniqueness(b.1).unwrap_or(0.0);
        if ua > ub {
            return (b, a);
        }
        if ub > ua {
            return (a, b);
        }
        let names = |table: &TableProfile, column: &str| {
            column.to_lowercase().contains(&singularize(&table.name))
        };
        if names(a.0, a.1) && !names(b.0, b.1) {
            (b, a)
        } else {
            (a, b)
        }
    }
}

impl CandidateGenerator for DataPatternDetector {
    fn name(&self) -> &'static str {
        "data_pattern"
    }

    fn generate(&self, tables: &[&TableProfile]) -> Vec<Relationship> {
        let small: Vec<&TableProfile> = tables
            .iter()
            .copied()
            .filter(|t| t.rows() < self.max_rows)
            .take(self.max_tables)
            .collect();

        let mut found = Vec::new();
        for (i, a) in small.iter().enumerate() {
            for b in &small[i + 1..] {
                for ca in a.columns.iter().filter(|c| looks_like_id(c)) {
                    let key = normalize_id_column(ca);
                    for cb in b.columns.iter().filter(|c| looks_like_id(c)) {
                        if normalize_id_column(cb) != key {
                            continue;
                        }
                        let (source, target) =
                            Self::orient((*a, ca.as_str()), (*b, cb.as_str()));
                        found.push(Relationship::candidate(
                            &source.0.name,
                            &target.0.name,
                            source.1,
                            RelationshipType::DataPattern,
                            format!(
                                "Equivalent ID columns {}.{} and {}.{}",
                                source.0.name, source.1, target.0.name, target.1
                            ),
                        ));
                    }
                }
            }
        }
        tracing::debug!(
            eligible = small.len(),
            candidates = found.len(),
            "Data pattern detector finished"
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn table(name: &str, columns: &[&str], rows: u64) -> TableProfile {
        TableProfile {
            row_count: Some(rows),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            error: None,
            ..TableProfile::failed(name, format!("/data/{name}.csv"), 0, None, "")
        }
    }

    fn with_uniqueness(mut t: TableProfile, column: &str, unique: usize) -> TableProfile {
        t.sample_size = 10;
        t.null_rate = BTreeMap::from([(column.to_string(), 0.0)]);
        t.unique_count = BTreeMap::from([(column.to_string(), unique)]);
        t
    }

    #[test]
    fn test_naming_detects_embedded_table_name() {
        let cliente = table("Cliente", &["ClienteID", "Nome"], 3);
        let pedido = table("Pedido", &["PedidoID", "ClienteID", "Valor"], 5);
        let found = NamingDetector.generate(&[&cliente, &pedido]);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_table, "Pedido");
        assert_eq!(found[0].target_table, "Cliente");
        assert_eq!(found[0].relationship_column, "ClienteID");
    }

    #[test]
    fn test_naming_uses_singular_form() {
        let clientes = table("Clientes", &["Id"], 3);
        let vendas = table("Vendas", &["cod_cliente", "IdCliente"], 5);
        let found = NamingDetector.generate(&[&clientes, &vendas]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].relationship_column, "IdCliente");
    }

    #[test]
    fn test_erp_rule_targets_master() {
        let cliente = table("Cliente", &["Codigo"], 3);
        let venda = table("VendaBalcao", &["ClienteCodigo", "Total"], 5);
        let found = ErpPatternDetector::default().generate(&[&cliente, &venda]);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_table, "VendaBalcao");
        assert_eq!(found[0].rule_confidence, Some(0.9));
    }

    #[test]
    fn test_invalid_rule_is_skipped() {
        let detector = ErpPatternDetector::new(&[
            ErpRule::new("(", "pedido", "x", 0.5),
            ErpRule::new("cliente", "pedido", "cliente", 0.9),
        ]);
        assert_eq!(detector.rule_count(), 1);
    }

    #[test]
    fn test_data_pattern_orients_by_uniqueness() {
        let produto = with_uniqueness(table("Produto", &["produto_id"], 10), "produto_id", 10);
        let estoque = with_uniqueness(table("Estoque", &["PRODUTO_ID"], 10), "PRODUTO_ID", 4);
        let found = DataPatternDetector::default().generate(&[&estoque, &produto]);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source_table, "Estoque");
        assert_eq!(found[0].target_table, "Produto");
        assert_eq!(found[0].relationship_column, "PRODUTO_ID");
    }

    #[test]
    fn test_data_pattern_respects_row_ceiling() {
        let a = table("A", &["loja_id"], 10);
        let b = table("B", &["loja_id"], 1_000_000);
        assert!(DataPatternDetector::default().generate(&[&a, &b]).is_empty());
    }

    #[test]
    fn test_data_pattern_ignores_non_id_columns() {
        let a = table("A", &["Nome"], 10);
        let b = table("B", &["Nome"], 10);
        assert!(DataPatternDetector::default().generate(&[&a, &b]).is_empty());
    }
}

//! Read-only helpers over a scanned [`ProfileSet`].
//!
//! Domain categories, master/transaction classification, primary key
//! candidates, shared columns and size queries. Nothing here mutates the
//! profiles; failed tables are excluded from anything that depends on size or
//! columns.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::scan::{ProfileSet, TableProfile};

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w]").unwrap());

/// Prefixes removed by [`clean_table_name`], applied in this order.
pub const TABLE_PREFIXES: &[&str] = &["dbo.", "tbl_", "tb_", "t_"];

/// Business domain of a table, guessed from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCategory {
    Customers,
    Products,
    Sales,
    Finance,
    Inventory,
    Purchasing,
    Production,
    Personnel,
    Invoices,
    Reports,
    Other,
}

impl TableCategory {
    /// Every category, in matching order.
    pub const ALL: [TableCategory; 11] = [
        TableCategory::Customers,
        TableCategory::Products,
        TableCategory::Sales,
        TableCategory::Finance,
        TableCategory::Inventory,
        TableCategory::Purchasing,
        TableCategory::Production,
        TableCategory::Personnel,
        TableCategory::Invoices,
        TableCategory::Reports,
        TableCategory::Other,
    ];

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            TableCategory::Customers => &["cliente", "clientes"],
            TableCategory::Products => &["produto", "produtos", "item", "prod"],
            TableCategory::Sales => &["venda", "pedido", "orcamento"],
            TableCategory::Finance => {
                &["financeiro", "conta", "pagamento", "recebimento", "titulo"]
            }
            TableCategory::Inventory => &["estoque", "inventario", "almox", "deposito"],
            TableCategory::Purchasing => &["compra", "fornecedor", "cotacao"],
            TableCategory::Production => &["producao", "of", "ordem", "faccao"],
            TableCategory::Personnel => &["funcionario", "folha", "rh", "colaborador"],
            TableCategory::Invoices => &["nota", "nfe", "nfisc", "fiscal"],
            TableCategory::Reports => &["rpt", "relatorio", "report"],
            TableCategory::Other => &[],
        }
    }

    /// First category with a keyword contained in `table`, else `Other`.
    pub fn of(table: &str) -> Self {
        let lower = table.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.keywords().iter().any(|k| lower.contains(k)))
            .unwrap_or(TableCategory::Other)
    }
}

/// Group every table (failed ones included) by category.
///
/// All categories are present in the result, possibly empty.
pub fn categorize_tables(profiles: &ProfileSet) -> BTreeMap<TableCategory, Vec<String>> {
    let mut result: BTreeMap<TableCategory, Vec<String>> = TableCategory::ALL
        .into_iter()
        .map(|category| (category, Vec::new()))
        .collect();
    for name in profiles.names() {
        result
            .entry(TableCategory::of(name))
            .or_default()
            .push(name.to_string());
    }
    result
}

/// Tables whose name contains `keyword`, case-insensitively.
pub fn tables_by_keyword<'a>(profiles: &'a ProfileSet, keyword: &str) -> Vec<&'a str> {
    let keyword = keyword.to_lowercase();
    profiles
        .names()
        .filter(|name| name.to_lowercase().contains(&keyword))
        .collect()
}

/// Valid tables with `min <= rows <= max`, largest first.
pub fn tables_by_size(profiles: &ProfileSet, min: u64, max: Option<u64>) -> Vec<&str> {
    let mut tables: Vec<&TableProfile> = profiles
        .valid()
        .filter(|p| p.rows() >= min && max.map_or(true, |max| p.rows() <= max))
        .collect();
    tables.sort_by(|a, b| b.rows().cmp(&a.rows()));
    tables.into_iter().map(|p| p.name.as_str()).collect()
}

// ============================================================================
// Key tables
// ============================================================================

/// Name keywords of reference tables.
pub const MASTER_KEYWORDS: &[&str] = &[
    "cliente",
    "produto",
    "fornecedor",
    "funcionario",
    "vendedor",
    "cidade",
    "estado",
    "pais",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Master,
    Transaction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyTable {
    pub score: u32,
    pub role: TableRole,
}

/// Score valid tables as master or transaction tables.
///
/// +3 for a master keyword in the name, +2 for `100 < rows < 1_000_000`.
/// Tables scoring zero are left out; a score of 3 or more is a master table.
pub fn key_tables(profiles: &ProfileSet) -> BTreeMap<String, KeyTable> {
    profiles
        .valid()
        .filter_map(|profile| {
            let lower = profile.name.to_lowercase();
            let mut score = 0;
            if MASTER_KEYWORDS.iter().any(|k| lower.contains(k)) {
                score += 3;
            }
            if (101..1_000_000).contains(&profile.rows()) {
                score += 2;
            }
            let role = if score >= 3 {
                TableRole::Master
            } else {
                TableRole::Transaction
            };
            (score > 0).then(|| (profile.name.clone(), KeyTable { score, role }))
        })
        .collect()
}

// ============================================================================
// Primary keys
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrimaryKeyCandidate {
    pub column: String,
    pub score: f64,
    pub reason: String,
}

/// Best primary key candidates of one table, from its sample statistics.
///
/// Fully unique and null-free columns score 1.0; null-free columns above 90%
/// uniqueness score their uniqueness; other columns whose name contains `id`
/// or `cod` score `0.5 + 0.5 * uniqueness`.
pub fn primary_key_candidates(profile: &TableProfile, max: usize) -> Vec<PrimaryKeyCandidate> {
    if profile.is_error() || profile.sample_size == 0 {
        return Vec::new();
    }
    let sampled = profile.sample_size as f64;

    let mut candidates: Vec<PrimaryKeyCandidate> = profile
        .columns
        .iter()
        .filter_map(|column| {
            let unique = *profile.unique_count.get(column)? as f64;
            let null_free = profile.null_rate.get(column).copied().unwrap_or(0.0) == 0.0;
            let ratio = unique / sampled;
            let lower = column.to_lowercase();

            let (score, reason) = if null_free && unique == sampled {
                (1.0, "Fully unique values".to_string())
            } else if null_free && ratio > 0.9 {
                (ratio, format!("High uniqueness ({:.1}%)", ratio * 100.0))
            } else if lower.contains("id") || lower.contains("cod") {
                (
                    0.5 + ratio * 0.5,
                    format!("ID-like name with {:.1}% uniqueness", ratio * 100.0),
                )
            } else {
                return None;
            };
            Some(PrimaryKeyCandidate {
                column: column.clone(),
                score,
                reason,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(max);
    candidates
}

// ============================================================================
// Common columns
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonColumn {
    /// Cleaned column name.
    pub column: String,
    pub tables: Vec<String>,
    pub id_like: bool,
}

/// Cleaned column names shared by more than one table.
///
/// Ordered by table count, then ID-likeness, both descending; ties keep
/// alphabetical order.
pub fn common_columns(profiles: &ProfileSet) -> Vec<CommonColumn> {
    let mut occurrences: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for profile in profiles.valid() {
        for column in &profile.columns {
            let tables = occurrences.entry(clean_column_name(column)).or_default();
            if !tables.contains(&profile.name) {
                tables.push(profile.name.clone());
            }
        }
    }

    let mut common: Vec<CommonColumn> = occurrences
        .into_iter()
        .filter(|(_, tables)| tables.len() > 1)
        .map(|(column, tables)| CommonColumn {
            id_like: ["id", "cod", "key"].iter().any(|k| column.contains(k)),
            column,
            tables,
        })
        .collect();
    common.sort_by(|a, b| (b.tables.len(), b.id_like).cmp(&(a.tables.len(), a.id_like)));
    common
}

// ============================================================================
// Names
// ============================================================================

/// Strip the `dbo.`, `tbl_`, `tb_` and `t_` prefixes.
pub fn clean_table_name(table: &str) -> &str {
    TABLE_PREFIXES
        .iter()
        .fold(table, |name, prefix| name.strip_prefix(prefix).unwrap_or(name))
}

/// Non-word characters to `_`, outer underscores trimmed, lowercased.
pub fn clean_column_name(column: &str) -> String {
    NON_WORD
        .replace_all(column, "_")
        .trim_matches('_')
        .to_lowercase()
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub tables: usize,
    pub failed: usize,
    /// Over valid tables only.
    pub total_rows: u64,
    /// Over valid tables only.
    pub total_columns: usize,
}

pub fn summary(profiles: &ProfileSet) -> CatalogSummary {
    profiles.valid().fold(
        CatalogSummary {
            tables: profiles.len(),
            failed: profiles.failed().count(),
            ..CatalogSummary::default()
        },
        |mut acc, profile| {
            acc.total_rows += profile.rows();
            acc.total_columns += profile.columns.len();
            acc
        },
    )
}

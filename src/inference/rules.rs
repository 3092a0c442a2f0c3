//! Declarative heuristics for relationship discovery.
//!
//! Adding a domain rule means adding a row to [`ERP_RULES`]; detectors,
//! merging and scoring stay untouched.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::semantic::ID_KEYWORDS;

/// A known ERP relationship between two table families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErpRule {
    /// Regex over the referenced (master) table name.
    pub target: &'static str,
    /// Regex over the referencing table name.
    pub source: &'static str,
    /// Column-name fragment that carries the reference in the source table.
    pub column_fragment: &'static str,
    pub base_confidence: f64,
}

impl ErpRule {
    pub const fn new(
        target: &'static str,
        source: &'static str,
        column_fragment: &'static str,
        base_confidence: f64,
    ) -> Self {
        Self {
            target,
            source,
            column_fragment,
            base_confidence,
        }
    }

    /// Compile both table patterns, case-insensitively.
    pub fn compile(&self) -> Result<CompiledRule, regex::Error> {
        Ok(CompiledRule {
            rule: *self,
            target: case_insensitive(self.target)?,
            source: case_insensitive(self.source)?,
            fragment: self.column_fragment.to_lowercase(),
        })
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// An [`ErpRule`] ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: ErpRule,
    target: Regex,
    source: Regex,
    fragment: String,
}

impl CompiledRule {
    pub fn matches_target(&self, table: &str) -> bool {
        self.target.is_match(table)
    }

    pub fn matches_source(&self, table: &str) -> bool {
        self.source.is_match(table)
    }

    pub fn matches_column(&self, column: &str) -> bool {
        column.to_lowercase().contains(&self.fragment)
    }
}

/// Relationships common in fashion/apparel ERP exports.
pub const ERP_RULES: &[ErpRule] = &[
    // customers
    ErpRule::new("cliente.*", "pedido.*", "cliente", 0.9),
    ErpRule::new("cliente.*", "venda.*", "cliente", 0.9),
    ErpRule::new("cliente.*", "notafiscal.*", "cliente", 0.8),
    // products
    ErpRule::new("produto.*", "pedidoitem.*", "produto", 0.9),
    ErpRule::new("produto.*", "item.*", "produto", 0.9),
    ErpRule::new("produto.*", "estoque.*", "produto", 0.8),
    // suppliers
    ErpRule::new("fornecedor.*", "compra.*", "fornecedor", 0.9),
    ErpRule::new("fornecedor.*", "notafiscalcompra.*", "fornecedor", 0.8),
    // staff
    ErpRule::new("vendedor.*", "venda.*", "vendedor", 0.8),
    ErpRule::new("funcionario.*", "folha.*", "funcionario", 0.9),
    // finance
    ErpRule::new("contabanco.*", "lancamento.*", "conta", 0.8),
    ErpRule::new("planoconta.*", "lancamento.*", "planoconta", 0.8),
];

/// Table-name keywords of master (reference) tables, for scoring.
pub const MASTER_TABLE_KEYWORDS: &[&str] = &["cliente", "produto", "fornecedor", "funcionario"];

/// Fragments that mark a column as a key, for scoring.
pub const ID_AFFIXES: &[&str] = &["id", "cod", "code", "key", "ref"];

/// Suffixes stripped before comparing column names across tables.
pub const ID_SUFFIXES: &[&str] = &["_id", "_cod", "_code", "_key", "_num", "_nro"];

/// Concatenations of a table name that a referencing column may contain.
pub const NAMING_PATTERNS: &[&str] = &[
    "{t}id", "id{t}", "{t}_id", "id_{t}", "cod{t}", "{t}cod", "{t}codigo", "{t}code",
];

static ID_AFFIX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(fk|pk|id|cod)_|(id|cod|code|key|num|nro)$").unwrap()
});

/// Expand [`NAMING_PATTERNS`] for a lowercase table name.
pub fn naming_patterns(table: &str) -> Vec<String> {
    NAMING_PATTERNS
        .iter()
        .map(|pattern| pattern.replace("{t}", table))
        .collect()
}

/// True if a column name reads like a key.
pub fn looks_like_id(column: &str) -> bool {
    let lower = column.to_lowercase();
    ID_KEYWORDS.iter().any(|k| lower.contains(k)) || ID_AFFIX_PATTERN.is_match(column)
}

/// Lowercase column name with one trailing ID suffix removed.
pub fn normalize_id_column(column: &str) -> String {
    let lower = column.trim().to_lowercase();
    ID_SUFFIXES
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or(lower)
}

pub fn is_master_table(table: &str) -> bool {
    let lower = table.to_lowercase();
    MASTER_TABLE_KEYWORDS.iter().any(|k| lower.contains(k))
}

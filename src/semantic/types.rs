//! Semantic role inference for a single column.
//!
//! Name patterns are checked first (in tag order), then the value
//! distribution of the sample decides between boolean, categorical, numeric
//! and free text.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name fragments that mark identifier columns.
pub const ID_KEYWORDS: &[&str] = &["id", "cod", "code", "key", "numero", "num", "nro", "chave"];

/// Name fragments that mark date/time columns.
pub const DATE_KEYWORDS: &[&str] = &["data", "date", "dt_", "hora", "time", "periodo"];

/// Name fragments that mark monetary columns.
pub const CURRENCY_KEYWORDS: &[&str] = &[
    "valor", "preco", "custo", "total", "vlr", "venda", "compra", "desconto", "acrescimo",
    "lucro", "prejuizo",
];

/// Name fragments that mark quantity columns.
pub const QUANTITY_KEYWORDS: &[&str] = &[
    "quantidade",
    "qtd",
    "qtde",
    "estoque",
    "saldo",
    "peso",
    "volume",
    "medida",
];

/// Tokens accepted as boolean values (compared lowercase).
pub const BOOLEAN_TOKENS: &[&str] = &[
    "0", "1", "true", "false", "sim", "não", "nao", "yes", "no", "s", "n",
];

/// Columns with fewer distinct values than this are categorical.
pub const CATEGORICAL_MAX_DISTINCT: usize = 20;

/// Boolean columns have at most this many distinct values.
pub const BOOLEAN_MAX_DISTINCT: usize = 3;

/// Share of non-null values that must parse as numbers for a numeric column.
pub const NUMERIC_MIN_RATIO: f64 = 0.70;

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Id,
    Date,
    Currency,
    Quantity,
    Boolean,
    Categorical,
    Numeric,
    Text,
}

impl SemanticType {
    /// Stable lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Id => "id",
            SemanticType::Date => "date",
            SemanticType::Currency => "currency",
            SemanticType::Quantity => "quantity",
            SemanticType::Boolean => "boolean",
            SemanticType::Categorical => "categorical",
            SemanticType::Numeric => "numeric",
            SemanticType::Text => "text",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name keyword sets in decision order.
const NAME_RULES: &[(SemanticType, &[&str])] = &[
    (SemanticType::Id, ID_KEYWORDS),
    (SemanticType::Date, DATE_KEYWORDS),
    (SemanticType::Currency, CURRENCY_KEYWORDS),
    (SemanticType::Quantity, QUANTITY_KEYWORDS),
];

/// Match a column name against the curated keyword sets.
pub fn semantic_type_from_name(column_name: &str) -> Option<SemanticType> {
    let lower = column_name.to_lowercase();
    NAME_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| *tag)
}

/// Infer the semantic tag of a column from its name and sample values.
///
/// `None` entries are missing values and are ignored by the distribution
/// checks.
pub fn infer_semantic_type(column_name: &str, values: &[Option<&str>]) -> SemanticType {
    if let Some(tag) = semantic_type_from_name(column_name) {
        return tag;
    }

    let present: Vec<&str> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return SemanticType::Text;
    }

    let distinct: HashSet<&str> = present.iter().copied().collect();
    if distinct.len() <= BOOLEAN_MAX_DISTINCT && distinct.iter().all(|v| is_boolean_token(v)) {
        return SemanticType::Boolean;
    }

    if distinct.len() < CATEGORICAL_MAX_DISTINCT {
        return SemanticType::Categorical;
    }

    let numeric = present.iter().filter(|v| parse_number(v).is_some()).count();
    if numeric as f64 >= present.len() as f64 * NUMERIC_MIN_RATIO {
        return SemanticType::Numeric;
    }

    SemanticType::Text
}

/// True if the value is one of [`BOOLEAN_TOKENS`].
pub fn is_boolean_token(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    BOOLEAN_TOKENS.contains(&lower.as_str())
}

/// Parse a number the way ERP exports write them.
///
/// Accepts plain `1234.5` and, when no dot is present, a decimal comma
/// (`1234,5`).
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = match trimmed.parse::<f64>() {
        Ok(n) => n,
        Err(_) if !trimmed.contains('.') && trimmed.matches(',').count() == 1 => {
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
        Err(_) => return None,
    };
    parsed.is_finite().then_some(parsed)
}

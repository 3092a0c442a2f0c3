//! Singular forms of table names.
//!
//! ERP exports mostly name tables in Portuguese, where the English rules in
//! `inflector` get plurals like `fornecedores` wrong. Portuguese suffix rules
//! run first; anything they do not cover falls back to `inflector`.

use inflector::Inflector;

/// Words whose singular the suffix rules would get wrong.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("pais", "paises"),
    ("mes", "meses"),
    ("cor", "cores"),
    ("lapis", "lapis"),
    ("status", "status"),
];

/// Plural suffix to singular suffix, longest first.
static SUFFIX_RULES: &[(&str, &str)] = &[
    ("oes", "ao"),
    ("aes", "ao"),
    ("ais", "al"),
    ("eis", "el"),
    ("res", "r"),
    ("zes", "z"),
    ("ns", "m"),
];

/// Lowercase singular form of `word`.
///
/// # Examples
/// ```ignore
/// assert_eq!(singularize("Clientes"), "cliente");
/// assert_eq!(singularize("fornecedores"), "fornecedor");
/// assert_eq!(singularize("itens"), "item");
/// assert_eq!(singularize("customers"), "customer");
/// ```
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    for (plural, singular) in SUFFIX_RULES {
        if let Some(stem) = lower.strip_suffix(plural) {
            if stem.len() >= 2 {
                return format!("{stem}{singular}");
            }
        }
    }

    lower.to_singular()
}

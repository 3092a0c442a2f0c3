//! Semantic type inference for columns.
//!
//! Two independent answers per column:
//!
//! 1. **Semantic tag** - the business role (`id`, `date`, `currency`, ...),
//!    decided by name keywords first and the value distribution second
//! 2. **Storage type** - the narrowest primitive that holds the observed
//!    values, used by the cache manager when it materializes artifacts

mod annotate;
mod storage;
mod types;

pub use annotate::{annotate_frame, annotate_table, annotate_values, ColumnAnnotation};
pub use storage::{
    parses_as_datetime, suggest_storage_type, StorageType, DATETIME_PARSE_MIN_RATIO,
    NUMERIC_PARSE_MIN_RATIO,
};
pub use types::{
    infer_semantic_type, is_boolean_token, parse_number, semantic_type_from_name, SemanticType,
    BOOLEAN_MAX_DISTINCT, BOOLEAN_TOKENS, CATEGORICAL_MAX_DISTINCT, CURRENCY_KEYWORDS,
    DATE_KEYWORDS, ID_KEYWORDS, NUMERIC_MIN_RATIO, QUANTITY_KEYWORDS,
};

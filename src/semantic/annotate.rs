//! Column annotation over loaded frames and scan samples.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::storage::{suggest_storage_type, StorageType};
use super::types::{infer_semantic_type, SemanticType};
use crate::cache::{CacheManager, CacheResult, LoadRequest};

/// Inferred role and storage suggestion for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAnnotation {
    pub column: String,
    pub semantic_type: SemanticType,
    pub storage_type: StorageType,
}

/// Annotate one column from its name and sample values.
pub fn annotate_values(column: &str, values: &[Option<&str>]) -> ColumnAnnotation {
    ColumnAnnotation {
        column: column.to_string(),
        semantic_type: infer_semantic_type(column, values),
        storage_type: suggest_storage_type(values),
    }
}

/// Annotate every column of a frame, in column order.
///
/// Values are compared in their text form, so narrowed artifacts and raw
/// string frames give the same answer.
pub fn annotate_frame(df: &DataFrame) -> PolarsResult<Vec<ColumnAnnotation>> {
    df.get_columns()
        .iter()
        .map(|column| {
            let as_text = column.cast(&DataType::String)?;
            let values: Vec<Option<&str>> = as_text.str()?.into_iter().collect();
            Ok(annotate_values(column.name().as_str(), &values))
        })
        .collect()
}

/// Annotate a table from a cached sample of `sample_rows` rows.
pub fn annotate_table(
    cache: &CacheManager,
    table: &str,
    sample_rows: usize,
) -> CacheResult<Vec<ColumnAnnotation>> {
    let df = cache.load(table, &LoadRequest::sample(sample_rows))?;
    Ok(annotate_frame(&df)?)
}

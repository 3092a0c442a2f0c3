//! Flat relationship rows for external consumers.

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::Relationship;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One relationship as a table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub source_table: String,
    pub target_table: String,
    pub relationship_column: String,
    pub relationship_type: String,
    pub confidence: f64,
    pub evidence: String,
}

impl From<&Relationship> for RelationshipRow {
    fn from(rel: &Relationship) -> Self {
        Self {
            source_table: rel.source_table.clone(),
            target_table: rel.target_table.clone(),
            relationship_column: rel.relationship_column.clone(),
            relationship_type: rel.relationship_type.to_string(),
            confidence: rel.confidence,
            evidence: rel.evidence.clone(),
        }
    }
}

/// Rows sorted by descending confidence; ties keep mining order.
pub fn to_rows(relationships: &[Relationship]) -> Vec<RelationshipRow> {
    let mut rows: Vec<RelationshipRow> = relationships.iter().map(Into::into).collect();
    rows.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    rows
}

impl RelationshipRow {
    /// Write rows as CSV with a header line.
    pub fn write_csv<W: Write>(rows: &[RelationshipRow], writer: W) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn to_csv_string(rows: &[RelationshipRow]) -> Result<String, ExportError> {
        let mut buffer = Vec::new();
        Self::write_csv(rows, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn to_json(rows: &[RelationshipRow]) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(rows)?)
    }
}

//! Confidence scoring for merged relationships.
//!
//! Scores are computed once per surviving relationship, after deduplication.
//! The final score is clamped to `[0, 1]`.

use serde::Serialize;

use super::rules::{is_master_table, ID_AFFIXES};
use super::{Relationship, RelationshipType};

/// Added once per satisfied factor.
pub const FACTOR_BONUS: f64 = 0.1;

/// Starting weight per detector family.
pub fn base_weight(relationship_type: RelationshipType, rule_confidence: Option<f64>) -> f64 {
    match relationship_type {
        RelationshipType::Naming => 0.8,
        RelationshipType::ErpPattern => rule_confidence.unwrap_or(0.7),
        RelationshipType::DataPattern => 0.6,
        RelationshipType::Unknown => 0.4,
    }
}

/// Facts about a relationship that raise its score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringFactors {
    /// Column contains (or ends with) an ID/code affix.
    pub column_has_id_affix: bool,
    /// Column starts with an ID/code affix (`IdCliente`, `cod_produto`).
    pub column_starts_with_id_affix: bool,
    /// Target table is a master table.
    pub target_is_master: bool,
}

impl ScoringFactors {
    pub fn for_relationship(relationship: &Relationship) -> Self {
        let column = relationship.relationship_column.to_lowercase();
        Self {
            column_has_id_affix: ID_AFFIXES.iter().any(|a| column.contains(a)),
            column_starts_with_id_affix: ID_AFFIXES.iter().any(|a| column.starts_with(a)),
            target_is_master: is_master_table(&relationship.target_table),
        }
    }
}

/// Computed confidence score with breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceScore {
    /// Final confidence score (0.0 to 1.0)
    pub final_score: f64,
    /// Base score from the detector family
    pub base_score: f64,
    pub adjustments: Vec<ScoreAdjustment>,
}

/// A single adjustment to the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAdjustment {
    pub reason: &'static str,
    pub delta: f64,
}

impl ConfidenceScore {
    #[must_use]
    pub fn calculate(base_score: f64, factors: &ScoringFactors) -> Self {
        let candidates = [
            (factors.column_has_id_affix, "Column carries an ID affix"),
            (
                factors.column_starts_with_id_affix,
                "Column starts with an ID affix",
            ),
            (factors.target_is_master, "Target is a master table"),
        ];

        let adjustments: Vec<ScoreAdjustment> = candidates
            .into_iter()
            .filter(|(applies, _)| *applies)
            .map(|(_, reason)| ScoreAdjustment {
                reason,
                delta: FACTOR_BONUS,
            })
            .collect();

        let total = base_score + adjustments.iter().map(|a| a.delta).sum::<f64>();
        ConfidenceScore {
            final_score: total.clamp(0.0, 1.0),
            base_score,
            adjustments,
        }
    }

    /// Score a relationship from its type and column/target names.
    #[must_use]
    pub fn for_relationship(relationship: &Relationship) -> Self {
        Self::calculate(
            base_weight(relationship.relationship_type, relationship.rule_confidence),
            &ScoringFactors::for_relationship(relationship),
        )
    }
}

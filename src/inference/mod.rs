//! Relationship mining.
//!
//! Reconstructs candidate foreign keys between tables that declare none.
//!
//! # Pipeline
//!
//! 1. Every [`CandidateGenerator`] runs over the valid profiles, in order
//!    (naming, ERP patterns, data patterns)
//! 2. Outputs are concatenated and deduplicated on
//!    `(source_table, target_table, relationship_column)`; the first entry wins
//! 3. Each survivor is scored ([`ConfidenceScore`])
//!
//! Tables in error state take no part, as source or as target.

mod detectors;
mod export;
mod inflection;
mod rules;
mod scoring;

pub use detectors::{CandidateGenerator, DataPatternDetector, ErpPatternDetector, NamingDetector};
pub use export::{to_rows, ExportError, RelationshipRow};
pub use inflection::singularize;
pub use rules::{
    is_master_table, looks_like_id, naming_patterns, normalize_id_column, CompiledRule, ErpRule,
    ERP_RULES, ID_AFFIXES, ID_SUFFIXES, MASTER_TABLE_KEYWORDS, NAMING_PATTERNS,
};
pub use scoring::{base_weight, ConfidenceScore, ScoreAdjustment, ScoringFactors, FACTOR_BONUS};

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MiningSettings;
use crate::scan::{ProfileSet, TableProfile};

/// Detector provenance of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Naming,
    ErpPattern,
    DataPattern,
    #[serde(other)]
    Unknown,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Naming => "naming",
            RelationshipType::ErpPattern => "erp_pattern",
            RelationshipType::DataPattern => "data_pattern",
            RelationshipType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate directed edge `source_table.relationship_column -> target_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_table: String,
    pub target_table: String,
    pub relationship_column: String,
    pub relationship_type: RelationshipType,
    /// In `[0, 1]` once mined; zero on raw candidates.
    pub confidence: f64,
    /// Diagnostic only.
    pub evidence: String,
    /// Base confidence carried by an ERP rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_confidence: Option<f64>,
}

/// Deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipKey {
    pub source_table: String,
    pub target_table: String,
    pub relationship_column: String,
}

impl Relationship {
    /// An unscored candidate.
    pub fn candidate(
        source_table: impl Into<String>,
        target_table: impl Into<String>,
        relationship_column: impl Into<String>,
        relationship_type: RelationshipType,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            target_table: target_table.into(),
            relationship_column: relationship_column.into(),
            relationship_type,
            confidence: 0.0,
            evidence: evidence.into(),
            rule_confidence: None,
        }
    }

    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source_table: self.source_table.clone(),
            target_table: self.target_table.clone(),
            relationship_column: self.relationship_column.clone(),
        }
    }

    /// Score breakdown behind `confidence`.
    pub fn explain(&self) -> ConfidenceScore {
        ConfidenceScore::for_relationship(self)
    }

    pub fn involves(&self, table: &str) -> bool {
        self.source_table == table || self.target_table == table
    }
}

/// Keep the first relationship per [`RelationshipKey`], preserving order.
pub fn deduplicate(relationships: Vec<Relationship>) -> Vec<Relationship> {
    let mut seen = HashSet::new();
    relationships
        .into_iter()
        .filter(|rel| seen.insert(rel.key()))
        .collect()
}

/// Runs detectors and merges their output.
pub struct RelationshipMiner {
    detectors: Vec<Box<dyn CandidateGenerator>>,
}

impl fmt::Debug for RelationshipMiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationshipMiner")
            .field("detectors", &self.detector_names())
            .finish()
    }
}

impl Default for RelationshipMiner {
    fn default() -> Self {
        Self::new(&MiningSettings::default())
    }
}

impl RelationshipMiner {
    /// The three standard detectors in precedence order.
    pub fn new(settings: &MiningSettings) -> Self {
        Self::empty()
            .with_detector(NamingDetector)
            .with_detector(ErpPatternDetector::default())
            .with_detector(DataPatternDetector::new(settings))
    }

    /// A miner with no detectors.
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Append a detector. Earlier detectors win deduplication.
    pub fn with_detector(mut self, detector: impl CandidateGenerator + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Mine scored relationships from a profile set.
    ///
    /// Deterministic: the same profiles always yield the same list, in the
    /// same order.
    pub fn mine(&self, profiles: &ProfileSet) -> Vec<Relationship> {
        let tables: Vec<&TableProfile> = profiles.valid().collect();
        let skipped = profiles.len() - tables.len();

        let mut candidates = Vec::new();
        for detector in &self.detectors {
            let found = detector.generate(&tables);
            tracing::debug!(
                detector = detector.name(),
                candidates = found.len(),
                "Detector finished"
            );
            candidates.extend(
                found
                    .into_iter()
                    .filter(|rel| rel.source_table != rel.target_table),
            );
        }

        let total = candidates.len();
        let mut relationships = deduplicate(candidates);
        for rel in &mut relationships {
            rel.confidence = rel.explain().final_score;
        }

        tracing::info!(
            tables = tables.len(),
            skipped,
            candidates = total,
            relationships = relationships.len(),
            "Relationship mining finished"
        );
        relationships
    }
}

/// Mine with the standard detectors.
pub fn mine(profiles: &ProfileSet, settings: &MiningSettings) -> Vec<Relationship> {
    RelationshipMiner::new(settings).mine(profiles)
}

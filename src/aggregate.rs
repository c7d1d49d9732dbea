//! Per-record outcomes and batch aggregation
//!
//! Every input feature yields exactly one [`RecordOutcome`]. Scored records
//! keep their raw feature for certificate assembly; rejected records keep the
//! reason they were skipped.

use crate::crop::Crop;
use crate::error::ScoringError;
use crate::feature::FarmRecord;
use crate::geometry::NormalizedGeometry;
use crate::intermediates::IntermediateMetrics;
use crate::reference::FipsCode;
use crate::scoring::{N2oComparators, ScoreSet};
use serde::Serialize;
use serde_json::Value;

/// Both scored series of one planting
#[derive(Debug, Clone)]
pub struct FeatureScore {
    /// Position in the input feature list
    pub index: usize,
    pub planting_id: String,
    pub crop: Crop,
    pub record: FarmRecord,
    /// Raw input feature
    pub feature: Value,
    /// `None` when the bbox was missing or malformed
    pub geometry: Option<NormalizedGeometry>,
    pub state_abbreviation: String,
    /// Normalized to end with " County"
    pub county: String,
    pub fips: Option<FipsCode>,
    pub default_intermediates: IntermediateMetrics,
    pub crop_intermediates: IntermediateMetrics,
    pub default_scores: ScoreSet,
    pub crop_scores: ScoreSet,
    pub n2o_comparators: N2oComparators,
}

impl FeatureScore {
    pub fn centroid(&self) -> Option<[f64; 2]> {
        self.geometry.map(|g| g.centroid)
    }
}

/// A record left out of the scores, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    #[serde(rename = "Index")]
    pub index: usize,
    #[serde(rename = "Planting ID")]
    pub planting_id: String,
    #[serde(rename = "Error")]
    pub kind: String,
    #[serde(rename = "Reason")]
    pub reason: String,
}

impl RejectedRecord {
    pub fn new(index: usize, planting_id: impl Into<String>, error: &ScoringError) -> Self {
        Self {
            index,
            planting_id: planting_id.into(),
            kind: error.kind().to_string(),
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Scored(Box<FeatureScore>),
    Rejected(RejectedRecord),
}

/// Scored and rejected records, each in input order
#[derive(Debug, Clone, Default)]
pub struct ScoredBatch {
    pub scored: Vec<FeatureScore>,
    pub rejected: Vec<RejectedRecord>,
}

impl ScoredBatch {
    pub fn len(&self) -> usize {
        self.scored.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct FeatureScoreAggregator;

impl FeatureScoreAggregator {
    /// Split outcomes into scored and rejected records.
    ///
    /// Fails with `LengthMismatch` unless there is one outcome per feature.
    pub fn aggregate(feature_count: usize, outcomes: Vec<RecordOutcome>) -> Result<ScoredBatch, ScoringError> {
        if outcomes.len() != feature_count {
            return Err(ScoringError::LengthMismatch {
                scores: outcomes.len(),
                features: feature_count,
            });
        }

        let mut batch = ScoredBatch::default();
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Scored(score) => batch.scored.push(*score),
                RecordOutcome::Rejected(rejected) => {
                    tracing::warn!(
                        index = rejected.index,
                        planting_id = %rejected.planting_id,
                        "Record rejected: {}",
                        rejected.reason
                    );
                    batch.rejected.push(rejected);
                }
            }
        }

        tracing::info!(
            "Aggregated {} records: {} scored, {} rejected",
            feature_count,
            batch.scored.len(),
            batch.rejected.len()
        );
        Ok(batch)
    }
}

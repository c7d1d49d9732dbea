//! CI calculator - batch entry point
//!
//! Scores every feature of a batch against the shared reference store, then
//! builds the certificates and the results collection. Includes both
//! sequential and parallel (Rayon) implementations.

use crate::aggregate::{FeatureScore, FeatureScoreAggregator, RecordOutcome, RejectedRecord, ScoredBatch};
use crate::certificate::{Certificate, CertificateAssembler};
use crate::collection::{CollectionAssembler, ResultsCollection};
use crate::crop::Crop;
use crate::error::ScoringError;
use crate::feature::{BatchRequest, FarmRecord, NOT_AVAILABLE};
use crate::geometry::GeometryNormalizer;
use crate::intermediates::{IntermediateMetrics, SeriesInputs};
use crate::reference::{ReferenceDataStore, SocScenario, Tillage, UNKNOWN_STATE};
use crate::scoring::{names, CiScoringEngine, CropSideContext, NitrogenPolicy, SocAdjuster};
use crate::utils::normalize_county_name;
use chrono::Local;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Everything a batch produces
#[derive(Debug, Clone, Serialize)]
pub struct CalculationOutput {
    #[serde(rename = "ResultsCollection")]
    pub results_collection: ResultsCollection,
    #[serde(rename = "Certificates")]
    pub certificates: Vec<Certificate>,
}

#[derive(Clone)]
pub struct CiCalculator {
    store: Arc<ReferenceDataStore>,
}

impl CiCalculator {
    pub fn new(store: Arc<ReferenceDataStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ReferenceDataStore {
        &self.store
    }

    /// Score a batch feature by feature
    pub fn calculate(&self, request: &BatchRequest) -> Result<CalculationOutput, ScoringError> {
        let features = &request.geojson.features;
        tracing::info!("Scoring {} features (sequential)", features.len());

        let outcomes: Vec<RecordOutcome> = features
            .iter()
            .enumerate()
            .map(|(i, f)| self.score_feature(i, f))
            .collect();
        self.finish(request, outcomes)
    }

    /// Score a batch with Rayon; output order matches input order
    pub fn calculate_parallel(&self, request: &BatchRequest) -> Result<CalculationOutput, ScoringError> {
        let features = &request.geojson.features;
        tracing::info!("Scoring {} features (parallel)", features.len());

        let outcomes: Vec<RecordOutcome> = features
            .par_iter()
            .enumerate()
            .map(|(i, f)| self.score_feature(i, f))
            .collect();
        self.finish(request, outcomes)
    }

    /// Score one feature; every record-level error becomes a rejection
    pub fn score_feature(&self, index: usize, feature: &Value) -> RecordOutcome {
        match self.try_score(index, feature) {
            Ok(score) => RecordOutcome::Scored(Box::new(score)),
            Err(err) => RecordOutcome::Rejected(RejectedRecord::new(index, planting_id_of(feature), &err)),
        }
    }

    fn finish(&self, request: &BatchRequest, outcomes: Vec<RecordOutcome>) -> Result<CalculationOutput, ScoringError> {
        let attributes = &request.attributes;
        let batch: ScoredBatch = FeatureScoreAggregator::aggregate(request.geojson.features.len(), outcomes)?;
        let created = Local::now();

        let certificates = if attributes.generate_certificates {
            let mut rng = rand::thread_rng();
            CertificateAssembler::new(attributes, created).assemble_all(&batch.scored, &mut rng)
        } else {
            Vec::new()
        };
        let results_collection = CollectionAssembler::new(attributes, created).assemble(&batch, &certificates);

        Ok(CalculationOutput {
            results_collection,
            certificates,
        })
    }

    fn try_score(&self, index: usize, feature: &Value) -> Result<FeatureScore, ScoringError> {
        let store = self.store.as_ref();
        let record = FarmRecord::from_feature(feature)?;
        let identity = &record.identity;

        let crop = Crop::normalize(&identity.crop_label).ok_or_else(|| ScoringError::UnknownCrop {
            label: identity.crop_label.clone(),
        })?;
        let defaults = store.crop_defaults(crop)?;

        let geometry = match GeometryNormalizer::normalize(feature) {
            Ok(g) => Some(g),
            Err(err) => {
                tracing::warn!(planting_id = %identity.planting_id, "{}; centroid left empty", err);
                None
            }
        };

        let state_abbreviation = store.state_abbreviation(&identity.state);
        let county = normalize_county_name(&identity.county);
        let fips = store.fips(state_abbreviation, &county);
        if fips.is_none() {
            if state_abbreviation == UNKNOWN_STATE {
                tracing::warn!(planting_id = %identity.planting_id, "Unknown state '{}'", identity.state);
            } else {
                tracing::warn!(
                    planting_id = %identity.planting_id,
                    "No FIPS code for {}, {}",
                    county,
                    state_abbreviation
                );
            }
        }

        let cover_crop = record.cover_crop_present();
        let manure = record.manure_present();
        let constants = store.constants();
        let default_intermediates =
            IntermediateMetrics::derive(&SeriesInputs::greet(defaults, cover_crop, manure), constants)?;
        let crop_intermediates = IntermediateMetrics::derive(&SeriesInputs::farm(&record), constants)?;

        let policy = NitrogenPolicy::from_inputs(crop, &record.management);
        let engine = CiScoringEngine::new(constants);
        let default_series =
            engine.score_default(crop, &default_intermediates, policy.ammonia_source, record.manure.total_tons())?;
        let (crop_series, n2o_comparators) = engine.score_crop(
            crop,
            &crop_intermediates,
            &CropSideContext {
                policy: &policy,
                baseline_total_n: default_intermediates.nitrogen.total(),
                crop_area: record.crop_area,
                average_crop_price: record.average_crop_price,
            },
        )?;

        let scenario = SocScenario {
            cover_crop,
            manure,
            tillage: Tillage::from_label(&record.management.soc_tillage),
        };
        let adjuster = SocAdjuster::new(store);
        let soc = adjuster.resolve(crop, fips, scenario);

        let mut default_scores = default_series.scores;
        adjuster.apply(&mut default_scores, &soc, default_intermediates.yield_bu_per_acre, None);
        let mut crop_scores = crop_series.scores;
        let bushels = crop_scores.number(names::BUSHELS);
        adjuster.apply(&mut crop_scores, &soc, crop_intermediates.yield_bu_per_acre, bushels);

        tracing::debug!(
            index,
            planting_id = %identity.planting_id,
            crop = %crop,
            fips = ?fips,
            score_a = ?crop_scores.number(names::SCORE_A),
            "Scored record"
        );

        Ok(FeatureScore {
            index,
            planting_id: identity.planting_id.clone(),
            crop,
            state_abbreviation: state_abbreviation.to_string(),
            county,
            fips,
            geometry,
            feature: feature.clone(),
            default_intermediates,
            crop_intermediates,
            default_scores,
            crop_scores,
            n2o_comparators,
            record,
        })
    }
}

/// `PlantingId` of a raw feature, for rejection listings
fn planting_id_of(feature: &Value) -> String {
    match feature.get("properties").and_then(|p| p.get("PlantingId")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::NO_SOC_RESULTS;
    use crate::test_support::{fixture_store, sample_batch, sample_feature, STORY_COUNTY_FIPS};
    use serde_json::json;

    fn calculator() -> CiCalculator {
        CiCalculator::new(Arc::new(fixture_store()))
    }

    #[test]
    fn test_score_feature_resolves_location() {
        let calc = calculator();
        let RecordOutcome::Scored(score) = calc.score_feature(0, &sample_feature("P-1", "Corn")) else {
            panic!("sample corn feature should score");
        };

        assert_eq!(score.state_abbreviation, "IA");
        assert_eq!(score.county, "Story County");
        assert_eq!(score.fips, Some(STORY_COUNTY_FIPS));
        assert_eq!(score.centroid(), Some([42.02, -93.61]));
        assert!(score.crop_scores.number(names::SOC).is_some());
    }

    #[test]
    fn test_unknown_crop_rejected() {
        let calc = calculator();
        match calc.score_feature(3, &sample_feature("P-9", "Wheat")) {
            RecordOutcome::Rejected(r) => {
                assert_eq!(r.index, 3);
                assert_eq!(r.planting_id, "P-9");
                assert_eq!(r.kind, "UnknownCrop");
            }
            RecordOutcome::Scored(_) => panic!("wheat must be rejected"),
        }
    }

    #[test]
    fn test_missing_bbox_keeps_record() {
        let calc = calculator();
        let mut feature = sample_feature("P-2", "Soybeans");
        feature.as_object_mut().unwrap().remove("bbox");

        let RecordOutcome::Scored(score) = calc.score_feature(0, &feature) else {
            panic!("record should survive a missing bbox");
        };
        assert!(score.centroid().is_none());
    }

    #[test]
    fn test_unknown_county_gives_no_soc() {
        let calc = calculator();
        let mut feature = sample_feature("P-3", "Corn");
        feature["properties"]["County"] = json!("Nowhere");

        let RecordOutcome::Scored(score) = calc.score_feature(0, &feature) else {
            panic!("record should score without a FIPS code");
        };
        assert_eq!(score.fips, None);
        assert_eq!(score.crop_scores.presented(names::SOC), json!(NO_SOC_RESULTS));
        assert_eq!(
            score.crop_scores.number(names::SCORE_A),
            score.crop_scores.number(names::TOTAL)
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let calc = calculator();
        let features = (0..8)
            .map(|i| sample_feature(&format!("P-{}", i), if i % 2 == 0 { "Corn" } else { "Soybean" }))
            .collect();
        let request: BatchRequest = serde_json::from_value(sample_batch(features, false, "TEST")).unwrap();

        let sequential = calc.calculate(&request).unwrap();
        let parallel = calc.calculate_parallel(&request).unwrap();

        assert_eq!(sequential.results_collection.data, parallel.results_collection.data);
        assert!(sequential.certificates.is_empty());
    }
}

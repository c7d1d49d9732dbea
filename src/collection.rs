//! Batch results collection

use crate::aggregate::{FeatureScore, RejectedRecord, ScoredBatch};
use crate::certificate::{BucketSummary, Certificate};
use crate::feature::FileAttributes;
use crate::scoring::{names, ScoreSet};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{json, Value};

pub const COLLECTION_DATA_TYPE: &str = "ResultsCollection";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsCollection {
    #[serde(rename = "Data Type")]
    pub data_type: String,
    #[serde(rename = "Collection ID")]
    pub collection_id: String,
    #[serde(rename = "Date of Creation")]
    pub date_of_creation: String,
    #[serde(rename = "Data Provider")]
    pub data_provider: String,
    #[serde(rename = "Generate Certificates")]
    pub generate_certificates: bool,
    #[serde(rename = "UOM")]
    pub uom: Value,
    #[serde(rename = "Data")]
    pub data: Vec<CollectionEntry>,
    #[serde(rename = "Rejected Records")]
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    #[serde(rename = "Planting ID")]
    pub planting_id: String,
    #[serde(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Default Scores")]
    pub default_scores: DefaultScoreSummary,
    #[serde(rename = "Crop Scores")]
    pub crop_scores: CropScoreSummary,
    #[serde(rename = "Corn N2O Emission cell C37 comparators")]
    pub n2o_comparators: N2oComparatorSummary,
    #[serde(rename = "Certificate", skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultScoreSummary {
    #[serde(flatten)]
    pub buckets: BucketSummary,
    #[serde(rename = "Default SOC")]
    pub soc: Value,
    #[serde(rename = "GREET Default Score A")]
    pub score_a: Value,
    #[serde(rename = "GREET Default Score B")]
    pub score_b: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropScoreSummary {
    #[serde(flatten)]
    pub buckets: BucketSummary,
    #[serde(rename = "Crop SOC")]
    pub soc: Value,
    #[serde(rename = "CI Score A")]
    pub score_a: Value,
    #[serde(rename = "CI Score B")]
    pub score_b: Value,
    #[serde(rename = "CI Score C")]
    pub score_c: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N2oComparatorSummary {
    #[serde(rename = "Crop Nitrogen Management")]
    pub nitrogen_management: Value,
    #[serde(rename = "Fertilizer Rate Type")]
    pub fertilizer_rate_type: Value,
    #[serde(rename = "C37Scenario")]
    pub scenario: Value,
    #[serde(rename = "N2O emission CI")]
    pub chosen: Value,
    #[serde(rename = "N2O emission CI BAU")]
    pub business_as_usual: Value,
    #[serde(rename = "N2O emission CI enhanced efficiency")]
    pub enhanced_efficiency: Value,
}

impl N2oComparatorSummary {
    fn from_scores(crop: &ScoreSet) -> Self {
        Self {
            nitrogen_management: crop.presented(names::NITROGEN_MANAGEMENT),
            fertilizer_rate_type: crop.presented(names::RATE_TYPE),
            scenario: crop.presented(names::N2O_SCENARIO),
            chosen: crop.presented(names::N2O_EMISSION),
            business_as_usual: crop.presented(names::N2O_BAU),
            enhanced_efficiency: crop.presented(names::N2O_EE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateReference {
    #[serde(rename = "Certificate ID")]
    pub certificate_id: String,
    #[serde(rename = "Certificate Type")]
    pub certificate_type: String,
    #[serde(rename = "Date Created")]
    pub date_created: String,
}

pub fn collection_uom() -> Value {
    json!({
        "Average Crop Price": "U$",
        "Crop Value": "U$",
        "Carbon Intensity Score A": "g GHG per Bu",
        "Carbon Intensity Score B": "g GHG per MJ",
        "Farm Size": "Acres",
        "Crop Area": "Acres",
        "Yield": "Bushels/Acre"
    })
}

pub struct CollectionAssembler<'a> {
    attributes: &'a FileAttributes,
    created: DateTime<Local>,
}

impl<'a> CollectionAssembler<'a> {
    pub fn new(attributes: &'a FileAttributes, created: DateTime<Local>) -> Self {
        Self { attributes, created }
    }

    /// Summaries for every scored record, with a reference to its certificate when one exists
    pub fn assemble(&self, batch: &ScoredBatch, certificates: &[Certificate]) -> ResultsCollection {
        let date = self.created.format(DATE_FORMAT).to_string();
        // Certificates cover the leading scored records, in order
        let data = batch
            .scored
            .iter()
            .enumerate()
            .map(|(i, score)| {
                let certificate = certificates.get(i).map(|c| CertificateReference {
                    certificate_id: c.cis_id.clone(),
                    certificate_type: self.attributes.certificate_type.clone(),
                    date_created: date.clone(),
                });
                entry(score, certificate)
            })
            .collect();

        ResultsCollection {
            data_type: COLLECTION_DATA_TYPE.to_string(),
            collection_id: self.attributes.collection_id.clone(),
            date_of_creation: date,
            data_provider: self.attributes.data_provider.clone(),
            generate_certificates: self.attributes.generate_certificates,
            uom: collection_uom(),
            data,
            rejected: batch.rejected.clone(),
        }
    }
}

fn entry(score: &FeatureScore, certificate: Option<CertificateReference>) -> CollectionEntry {
    let defaults = &score.default_scores;
    let crop = &score.crop_scores;
    CollectionEntry {
        planting_id: score.planting_id.clone(),
        crop: score.crop.as_str().to_string(),
        default_scores: DefaultScoreSummary {
            buckets: BucketSummary::from_scores(defaults),
            soc: defaults.presented(names::SOC),
            score_a: defaults.presented(names::SCORE_A),
            score_b: defaults.presented(names::SCORE_B),
        },
        crop_scores: CropScoreSummary {
            buckets: BucketSummary::from_scores(crop),
            soc: crop.presented(names::SOC),
            score_a: crop.presented(names::SCORE_A),
            score_b: crop.presented(names::SCORE_B),
            score_c: crop.presented(names::SCORE_C),
        },
        n2o_comparators: N2oComparatorSummary::from_scores(crop),
        certificate,
    }
}

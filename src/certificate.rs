//! CI score certificates
//!
//! One certificate per scored planting: a denormalized snapshot of the
//! planting, its default and crop scores, provenance fields and the raw input
//! feature. Scores are rounded to 2 decimals here and nowhere earlier.

use crate::aggregate::FeatureScore;
use crate::feature::FileAttributes;
use crate::reference::FipsCode;
use crate::scoring::{names, ScoreSet};
use chrono::{DateTime, Datelike, Local};
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{json, Value};

pub const CERTIFICATE_DATA_TYPE: &str = "CI Score";
pub const BILLING_STATUS: &str = "not billed";
pub const OWNER_ID: &str = "Ravah Carbon";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Diagnostic batches only certify this many records
const DIAGNOSTIC_CERTIFICATES: usize = 2;

/// Bucket totals of one series, presentation-rounded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    #[serde(rename = "Energy")]
    pub energy: Value,
    #[serde(rename = "Nitrogen Fertilizer")]
    pub nitrogen_fertilizer: Value,
    #[serde(rename = "N2O Emissions")]
    pub n2o: Value,
    #[serde(rename = "CO2 Emissions")]
    pub co2: Value,
    #[serde(rename = "CH4 Emissions")]
    pub ch4: Value,
    #[serde(rename = "Other Chemicals")]
    pub other_chemicals: Value,
    #[serde(rename = "CI Score Total")]
    pub total: Value,
}

impl BucketSummary {
    pub fn from_scores(scores: &ScoreSet) -> Self {
        Self {
            energy: scores.presented(names::ENERGY),
            nitrogen_fertilizer: scores.presented(names::NITROGEN_FERTILIZER),
            n2o: scores.presented(names::N2O),
            co2: scores.presented(names::CO2),
            ch4: scores.presented(names::CH4),
            other_chemicals: scores.presented(names::OTHER_CHEMICALS),
            total: scores.presented(names::TOTAL),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultScoringElements {
    #[serde(flatten)]
    pub buckets: BucketSummary,
    #[serde(rename = "Default SOC")]
    pub soc: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropScoringElements {
    #[serde(flatten)]
    pub buckets: BucketSummary,
    #[serde(rename = "Crop SOC")]
    pub soc: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    #[serde(rename = "Data Type")]
    pub data_type: String,
    #[serde(rename = "Certificate Type")]
    pub certificate_type: String,
    #[serde(rename = "CIS_ID")]
    pub cis_id: String,
    #[serde(rename = "Crop")]
    pub crop: String,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Millpont Key")]
    pub key: u32,
    #[serde(rename = "DateTime Created")]
    pub created: String,
    #[serde(rename = "DateTime Expired")]
    pub expired: String,
    pub billing_status: String,
    #[serde(rename = "owner_Id")]
    pub owner_id: String,
    pub owner_timestamp: String,
    #[serde(rename = "Data Provider")]
    pub data_provider: String,
    #[serde(rename = "Input CollectionId")]
    pub input_collection_id: String,
    #[serde(rename = "BusinessId")]
    pub business_id: String,
    #[serde(rename = "Attested By 1")]
    pub attested_by_1: String,
    #[serde(rename = "Signature 1")]
    pub signature_1: String,
    #[serde(rename = "Attested DateTime 1")]
    pub attested_datetime_1: String,
    #[serde(rename = "Attested By 2")]
    pub attested_by_2: String,
    #[serde(rename = "Signature 2")]
    pub signature_2: String,
    #[serde(rename = "Attested DateTime 2")]
    pub attested_datetime_2: String,
    #[serde(rename = "FarmId")]
    pub farm_id: String,
    #[serde(rename = "FieldId")]
    pub field_id: String,
    #[serde(rename = "PlantingId")]
    pub planting_id: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "FIPS Code")]
    pub fips: Option<FipsCode>,
    #[serde(rename = "Centroid")]
    pub centroid: Option<[f64; 2]>,
    #[serde(rename = "UOM")]
    pub uom: Value,
    #[serde(rename = "Crop Area")]
    pub crop_area: f64,
    #[serde(rename = "Yield")]
    pub yield_bu_per_acre: f64,
    #[serde(rename = "Bushel Amount")]
    pub bushel_amount: Value,
    #[serde(rename = "Average Crop Price")]
    pub average_crop_price: f64,
    #[serde(rename = "Crop Value")]
    pub crop_value: Value,
    #[serde(rename = "GREET Default Score A")]
    pub default_score_a: Value,
    #[serde(rename = "GREET Default Score B")]
    pub default_score_b: Value,
    #[serde(rename = "CI Score A")]
    pub score_a: Value,
    #[serde(rename = "CI Score B")]
    pub score_b: Value,
    #[serde(rename = "CI Score C")]
    pub score_c: Value,
    #[serde(rename = "GREET Default Scoring Elements")]
    pub default_elements: DefaultScoringElements,
    #[serde(rename = "Crop Scoring Elements")]
    pub crop_elements: CropScoringElements,
    #[serde(rename = "Input Properties")]
    pub input_properties: Value,
    pub bbox: Option<[f64; 4]>,
    pub geometry: Value,
    #[serde(rename = "GeoJSON")]
    pub geojson: Value,
}

/// Units block carried on every certificate
pub fn certificate_uom() -> Value {
    json!({
        "Farm Size": "Acres",
        "Crop Area": "Acres",
        "Yield": "Bushels/Acre",
        "Average Crop Price": "U$",
        "Crop Value": "U$",
        "Certificate Value": "U$",
        "Score A": "g GHG/Bu",
        "Score B": "g GHG/MJ",
        "Score C": "ton GHG",
        "Energy": "g GHG per Bu",
        "Nitrogen Fertilizer": "g GHG/Bu",
        "N2O Emissions": "g GHG/Bu",
        "CO2 Emissions": "g GHG/Bu",
        "CH4 Emissions": "g GHG/Bu",
        "Other Chemicals": "g GHG/Bu",
        "CI Score Total": "g GHG/MJ",
        "Default SOC": "g GHG/MJ",
        "Nutrients": "Pounds/Acre",
        "Cover Crop Energy": "BTU",
        "Cover Crop Yield": "Tons/Acre",
        "Cover Crop Herbicide": "grams/Acre",
        "Herbicide": "grams/Acre",
        "Insecticide": "grams/Acre",
        "Diesel": "Gallons/Acre",
        "Gasoline": "Gallons/Acre",
        "Natural Gas": "Cubic Feet/Acre",
        "LPG": "Gallons/Acre",
        "Electricity": "Kilowatt-hour (kWh)",
        "Manure": "Tons/Acre",
        "Manure Application Energy": "BTU",
        "Manure Transportation Distance": "Miles",
        "Manure Transportation Energy": "BTU/Tons/Mile",
        "Reduction In Fertilizer": "%"
    })
}

/// Builds certificates for one batch
pub struct CertificateAssembler<'a> {
    attributes: &'a FileAttributes,
    created: DateTime<Local>,
}

impl<'a> CertificateAssembler<'a> {
    pub fn new(attributes: &'a FileAttributes, created: DateTime<Local>) -> Self {
        Self { attributes, created }
    }

    /// Number of records to certify: 2 for diagnostic batches, otherwise all
    pub fn certificate_count(&self, scored: usize) -> usize {
        if self.attributes.certificate_type.to_lowercase().contains("diag") {
            scored.min(DIAGNOSTIC_CERTIFICATES)
        } else {
            scored
        }
    }

    pub fn certificate_id(&self, planting_id: &str) -> String {
        format!("{}-{}", self.attributes.certificate_type, planting_id)
    }

    /// Certificates for the leading scored records, in order
    pub fn assemble_all<R: Rng>(&self, scored: &[FeatureScore], rng: &mut R) -> Vec<Certificate> {
        let count = self.certificate_count(scored.len());
        tracing::info!("Generating {}/{} certificates", count, scored.len());
        scored
            .iter()
            .zip(unique_keys(count, rng))
            .map(|(score, key)| self.assemble(score, key))
            .collect()
    }

    pub fn assemble(&self, score: &FeatureScore, key: u32) -> Certificate {
        let a = self.attributes;
        let identity = &score.record.identity;
        let timestamp = self.created.format(TIMESTAMP_FORMAT).to_string();
        let defaults = &score.default_scores;
        let crop = &score.crop_scores;

        Certificate {
            data_type: CERTIFICATE_DATA_TYPE.to_string(),
            certificate_type: a.certificate_type.clone(),
            cis_id: self.certificate_id(&score.planting_id),
            crop: identity.crop_label.clone(),
            season: a.season.clone(),
            year: self.created.year(),
            key,
            created: timestamp.clone(),
            expired: String::new(),
            billing_status: BILLING_STATUS.to_string(),
            owner_id: OWNER_ID.to_string(),
            owner_timestamp: timestamp,
            data_provider: a.data_provider.clone(),
            input_collection_id: a.collection_id.clone(),
            business_id: identity.business_id.clone(),
            attested_by_1: a.attested_by_1.clone(),
            signature_1: a.signature_1.clone(),
            attested_datetime_1: a.attested_datetime_1.clone(),
            attested_by_2: a.attested_by_2.clone(),
            signature_2: a.signature_2.clone(),
            attested_datetime_2: a.attested_datetime_2.clone(),
            farm_id: identity.farm_id.clone(),
            field_id: identity.field_id.clone(),
            planting_id: score.planting_id.clone(),
            country: a.country.clone(),
            state: identity.state.clone(),
            county: identity.county.clone(),
            fips: score.fips,
            centroid: score.centroid(),
            uom: certificate_uom(),
            crop_area: score.record.crop_area,
            yield_bu_per_acre: score.record.yield_bu_per_acre,
            bushel_amount: crop.presented(names::BUSHELS),
            average_crop_price: score.record.average_crop_price,
            crop_value: crop.presented(names::CROP_VALUE),
            default_score_a: defaults.presented(names::SCORE_A),
            default_score_b: defaults.presented(names::SCORE_B),
            score_a: crop.presented(names::SCORE_A),
            score_b: crop.presented(names::SCORE_B),
            score_c: crop.presented(names::SCORE_C),
            default_elements: DefaultScoringElements {
                buckets: BucketSummary::from_scores(defaults),
                soc: defaults.presented(names::SOC),
            },
            crop_elements: CropScoringElements {
                buckets: BucketSummary::from_scores(crop),
                soc: crop.presented(names::SOC),
            },
            input_properties: score.feature.get("properties").cloned().unwrap_or(Value::Null),
            bbox: score.geometry.map(|g| g.bbox),
            geometry: score.feature.get("geometry").cloned().unwrap_or(Value::Null),
            geojson: json!({
                "type": "FeatureCollection",
                "features": [score.feature.clone()]
            }),
        }
    }
}

/// `count` distinct random keys; a repeated draw is discarded and redrawn
fn unique_keys<R: Rng>(count: usize, rng: &mut R) -> Vec<u32> {
    let mut used = FxHashSet::default();
    let mut keys = Vec::with_capacity(count);
    while keys.len() < count {
        let key = rng.gen::<u32>();
        if used.insert(key) {
            keys.push(key);
        }
    }
    keys
}

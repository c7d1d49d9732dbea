//! Batch input model
//!
//! A batch is a JSON object of file-level attributes plus a `GeoJSON`
//! FeatureCollection. Features stay as raw JSON so one malformed record
//! cannot fail the whole batch; each is parsed into a [`FarmRecord`] when
//! it is scored.

use crate::error::ScoringError;
use crate::inputs::{ChemicalInputs, CoverCropInputs, EnergyInputs, FertilizerInputs, ManureInputs};
use crate::utils::{parse_flag, starts_with_ignore_case};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_COVER_CROP: &str = "No cover crop";
pub const DEFAULT_RATE_TYPE: &str =
    "User specified reduction (%) in fertilizer application rate under 4R";
pub const DEFAULT_CROP_PRICE: f64 = 6.01;

// ============================================================================
// Batch
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchRequest {
    #[serde(flatten)]
    pub attributes: FileAttributes,
    #[serde(rename = "GeoJSON")]
    pub geojson: FeatureCollection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Value>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// File-level attributes shared by every record of a batch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileAttributes {
    #[serde(rename = "Season", default = "default_season", deserialize_with = "string_or_number")]
    pub season: String,
    #[serde(rename = "Certificate Type", default = "default_certificate_type")]
    pub certificate_type: String,
    #[serde(rename = "Data Provider", default = "default_data_provider")]
    pub data_provider: String,
    #[serde(rename = "CollectionId", default = "not_available", deserialize_with = "string_or_number")]
    pub collection_id: String,
    #[serde(rename = "Generate Certificates", default, deserialize_with = "flag")]
    pub generate_certificates: bool,
    #[serde(rename = "Attested By 1", default = "not_available")]
    pub attested_by_1: String,
    #[serde(rename = "Signature 1", default = "not_available")]
    pub signature_1: String,
    #[serde(rename = "Attested DateTime 1", default = "not_available")]
    pub attested_datetime_1: String,
    #[serde(rename = "Attested By 2", default = "not_available")]
    pub attested_by_2: String,
    #[serde(rename = "Signature 2", default = "not_available")]
    pub signature_2: String,
    #[serde(rename = "Attested DateTime 2", default = "not_available")]
    pub attested_datetime_2: String,
    #[serde(rename = "Country", default = "default_country")]
    pub country: String,
    /// Units declared by the provider (e.g. `[{"Reduction In Fertilizer": "%"}]`)
    #[serde(rename = "UOM", default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<Value>,
}

impl Default for FileAttributes {
    fn default() -> Self {
        Self {
            season: default_season(),
            certificate_type: default_certificate_type(),
            data_provider: default_data_provider(),
            collection_id: not_available(),
            generate_certificates: false,
            attested_by_1: not_available(),
            signature_1: not_available(),
            attested_datetime_1: not_available(),
            attested_by_2: not_available(),
            signature_2: not_available(),
            attested_datetime_2: not_available(),
            country: default_country(),
            uom: None,
        }
    }
}

fn default_season() -> String {
    use chrono::Datelike;
    chrono::Local::now().year().to_string()
}

fn default_certificate_type() -> String {
    "TEST".to_string()
}

fn default_data_provider() -> String {
    "agCommander".to_string()
}

fn default_country() -> String {
    "United States".to_string()
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(NOT_AVAILABLE.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(parse_flag(&s)),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected yes/no flag, found {}",
            other
        ))),
    }
}

// ============================================================================
// Feature records
// ============================================================================

/// Identifiers and location labels of one planting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantingIdentity {
    pub business_id: String,
    pub farm_name: String,
    pub farm_id: String,
    pub field_id: String,
    pub fsa_farm_number: String,
    pub fsa_tract_number: String,
    pub fsa_field_number: String,
    pub planting_id: String,
    pub county: String,
    pub state: String,
    pub climate_zone: String,
    /// Crop label as reported
    pub crop_label: String,
}

/// Management practice labels that select scoring branches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagementInputs {
    pub tillage: String,
    pub soc_tillage: String,
    pub cover_crop_label: String,
    pub ammonia_source: String,
    pub nitrogen_management: String,
    pub fertilizer_rate_type: String,
    /// As reported: a fraction or a whole-number percent
    pub reduction_in_fertilizer: f64,
}

/// One farm-reported planting with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmRecord {
    pub identity: PlantingIdentity,
    pub farm_size: f64,
    pub crop_area: f64,
    pub yield_bu_per_acre: f64,
    pub average_crop_price: f64,
    pub energy: EnergyInputs,
    pub fertilizer: FertilizerInputs,
    pub chemicals: ChemicalInputs,
    pub cover_crop: CoverCropInputs,
    pub manure: ManureInputs,
    pub management: ManagementInputs,
}

impl FarmRecord {
    pub fn from_feature(feature: &Value) -> Result<Self, ScoringError> {
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| ScoringError::InvalidRecord {
                reason: "feature has no properties object".to_string(),
            })?;
        let p = Properties(props);

        let cover_crop_label = p.text("Cover Crop Used", NOT_AVAILABLE);
        let tillage = p.text("Tillage", NOT_AVAILABLE);

        Ok(FarmRecord {
            identity: PlantingIdentity {
                business_id: p.text("BusinessId", NOT_AVAILABLE),
                farm_name: p.text("Farm Name", NOT_AVAILABLE),
                farm_id: p.text("FarmId", NOT_AVAILABLE),
                field_id: p.text("FieldId", NOT_AVAILABLE),
                fsa_farm_number: p.text("FSA Farm Number", NOT_AVAILABLE),
                fsa_tract_number: p.text("FSA Tract Number", NOT_AVAILABLE),
                fsa_field_number: p.text("FSA Field Number", NOT_AVAILABLE),
                planting_id: p.text("PlantingId", NOT_AVAILABLE),
                county: p.text("County", NOT_AVAILABLE),
                state: p.text("State", NOT_AVAILABLE),
                climate_zone: p.text("Climate Zone", NOT_AVAILABLE),
                crop_label: p.text("Crop", NOT_AVAILABLE),
            },
            farm_size: p.number("Farm Size", 1.0)?,
            crop_area: p.number("Crop Area", 1.0)?,
            yield_bu_per_acre: p.number("Yield", 1.0)?,
            average_crop_price: p.number("Average Crop Price", DEFAULT_CROP_PRICE)?,
            energy: EnergyInputs {
                diesel_gal: p.number("Diesel", 0.0)?,
                gasoline_gal: p.number("Gasoline", 0.0)?,
                natural_gas_ft3: p.number("Natural Gas", 0.0)?,
                lpg_gal: p.number("LPG", 0.0)?,
                electricity_kwh: p.number("Electricity", 0.0)?,
            },
            fertilizer: FertilizerInputs {
                ammonia_lbs: p.number("Ammonia", 0.0)?,
                urea_lbs: p.number("Urea", 0.0)?,
                ammonium_nitrate_lbs: p.number("Ammonium Nitrate", 0.0)?,
                ammonium_sulfate_lbs: p.number("Ammonium Sulfate", 0.0)?,
                uan_lbs: p.number("Urea-ammonium Nitrate Solution", 0.0)?,
                map_lbs: p.number("Monoammonium Nitrate", 0.0)?,
                dap_lbs: p.number("Diammonium Nitrate", 0.0)?,
                map_p2o5_lbs: p.number("Monoammonium Phosphate P2O5", 0.0)?,
                dap_p2o5_lbs: p.number("Diammonium Phosphate P2O5", 0.0)?,
                k2o_lbs: p.number("Potash K2O", 0.0)?,
                caco3_lbs: p.number("Limestone CaCO3", 0.0)?,
            },
            chemicals: ChemicalInputs {
                herbicide_g: p.number("Herbicide", 0.0)?,
                insecticide_g: p.number("Insecticide", 0.0)?,
            },
            cover_crop: CoverCropInputs {
                energy_btu: p.number("Cover Crop Energy", 0.0)?,
                herbicide_g: p.number("Cover Crop Herbicide", 0.0)?,
                yield_tons: p.number("Cover Crop Yield", 1.0)?,
            },
            manure: ManureInputs {
                swine_tons: p.number("Swine Manure", 0.0)?,
                dairy_cow_tons: p.number("Dairy Cow Manure", 0.0)?,
                beef_cattle_tons: p.number("Beef Cattle Manure", 0.0)?,
                chicken_tons: p.number("Chicken Manure", 0.0)?,
                application_energy_btu: p.number("Manure Application Energy", 0.0)?,
                transport_miles: p.number("Manure Transportation Distance", 0.0)?,
                transport_btu_per_ton_mile: p.number("Manure Transportation Energy", 0.0)?,
            },
            management: ManagementInputs {
                soc_tillage: p.text("SOC Tillage", &tillage),
                tillage,
                cover_crop_label,
                ammonia_source: p.text("Ammonia Source", NOT_AVAILABLE),
                nitrogen_management: p.text("Nitrogen Management", NOT_AVAILABLE),
                fertilizer_rate_type: p.text("Fertilizer Rate Type", DEFAULT_RATE_TYPE),
                reduction_in_fertilizer: p.number("Reduction In Fertilizer", 0.0)?,
            },
        })
    }

    /// A cover crop is grown unless the label starts with "No cover crop"
    pub fn cover_crop_present(&self) -> bool {
        !starts_with_ignore_case(&self.management.cover_crop_label, NO_COVER_CROP)
    }

    pub fn manure_present(&self) -> bool {
        self.manure.any_applied()
    }

    /// "Manure" / "No manure", the label used in scenario selection
    pub fn manure_label(&self) -> &'static str {
        if self.manure_present() {
            "Manure"
        } else {
            "No manure"
        }
    }
}

/// Typed accessors over a feature's `properties` object
struct Properties<'a>(&'a Map<String, Value>);

impl Properties<'_> {
    fn text(&self, key: &str, default: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    fn number(&self, key: &str, default: f64) -> Result<f64, ScoringError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid_number(key, n)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(default),
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid_number(key, s)),
            Some(other) => Err(invalid_number(key, other)),
        }
    }
}

fn invalid_number(key: &str, value: impl std::fmt::Display) -> ScoringError {
    ScoringError::InvalidRecord {
        reason: format!("property '{}' is not a number: {}", key, value),
    }
}

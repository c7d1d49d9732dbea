//! CI scoring
//!
//! Every record is scored twice: once against the farm's own inputs (crop
//! series) and once against the GREET national defaults for its crop (default
//! series). Both series are ordered `(name, source cell, value)` lists so the
//! output can be traced back to the calculator workbook cells.
//!
//! - `nitrogen`: ammonia source, 4R reduction and N2O scenario policy
//! - `engine`: per-category contributions and bucket totals
//! - `soc`: SOC adjustment and composite scores A/B/C

pub mod engine;
pub mod nitrogen;
pub mod soc;

pub use engine::{CategoryContributions, CiScoringEngine, CropSideContext, N2oComparators, ScoredSeries};
pub use nitrogen::{AmmoniaSource, FertilizerRateType, N2oScenario, NitrogenManagement, NitrogenPolicy};
pub use soc::{SocAdjuster, SocOutcome, MJ_PER_BUSHEL, NO_SOC_RESULTS};

use crate::utils::round_to;
use serde::Serialize;
use serde_json::Value;

/// Decimals used when scores are presented
pub const PRESENTATION_DECIMALS: u32 = 2;

/// Entry names, without the series prefix
pub mod names {
    pub const DIESEL: &str = "Diesel_CI";
    pub const GASOLINE: &str = "Gasoline_CI";
    pub const NATURAL_GAS: &str = "NaturalGas_CI";
    pub const LPG: &str = "LPG_CI";
    pub const ELECTRICITY: &str = "Electricity_CI";
    pub const AMMONIA: &str = "Ammonia_CI";
    pub const UREA: &str = "Urea_CI";
    pub const AMMONIUM_NITRATE: &str = "AmmoniumNitrate_CI";
    pub const AMMONIUM_SULFATE: &str = "AmmoniumSulfate_CI";
    pub const UAN: &str = "UAN_CI";
    pub const MAP: &str = "MAP_CI";
    pub const DAP: &str = "DAP_CI";
    pub const MAP_P2O5: &str = "MAP_P2O5_CI";
    pub const DAP_P2O5: &str = "DAP_P2O5_CI";
    pub const POTASH: &str = "Potash_CI";
    pub const LIMESTONE: &str = "Limestone_CI";
    pub const HERBICIDE: &str = "Herbicide_CI";
    pub const INSECTICIDE: &str = "Insecticide_CI";
    pub const N2O_EMISSION: &str = "N2OEmission_CI";
    pub const CO2_UREA: &str = "CO2EmissionUrea_CI";
    pub const CO2_CACO3: &str = "CO2EmissionCaCO3_CI";
    pub const SOYBEAN_FIXATION: &str = "N2OEmissionSoybeanFixation_CI";

    pub const ENERGY: &str = "Result_Energy";
    pub const NITROGEN_FERTILIZER: &str = "Result_NitrogenFertilizer";
    pub const N2O: &str = "Result_N2O_Emissions";
    pub const CO2: &str = "Result_CO2_Emissions";
    pub const CH4: &str = "Result_CH4_Emissions";
    pub const OTHER_CHEMICALS: &str = "Result_OtherChemicals";
    pub const TOTAL: &str = "CI_Total";

    pub const SOC_FACTOR: &str = "SOC_Factor";
    pub const SOC: &str = "SOC";
    pub const SCORE_A: &str = "ScoreA";
    pub const SCORE_B: &str = "ScoreB";
    pub const SCORE_C: &str = "ScoreC";

    pub const BUSHELS: &str = "Bushel_Amount";
    pub const CROP_VALUE: &str = "Crop_Value";

    pub const TOTAL_N: &str = "Total_N_gN_Bu";
    pub const N2O_SCENARIO: &str = "C37Scenario";
    pub const NITROGEN_MANAGEMENT: &str = "NitrogenManagement";
    pub const RATE_TYPE: &str = "FertilizerRateType";
    pub const N2O_BAU: &str = "N2OEmission_CI_BAU";
    pub const N2O_EE: &str = "N2OEmission_CI_EE";
}

/// Which input set a series was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Series {
    /// Farm-reported inputs
    Crop,
    /// GREET national defaults
    Default,
}

impl Series {
    pub fn prefix(self) -> &'static str {
        match self {
            Series::Crop => "crop",
            Series::Default => "default",
        }
    }

    pub fn name(self, suffix: &str) -> String {
        format!("{}_{}", self.prefix(), suffix)
    }

    /// Workbook column of per-bushel intermediates
    pub fn intermediate_cell(self, row: u16) -> String {
        match self {
            Series::Crop => format!("L{}", row),
            Series::Default => format!("M{}", row),
        }
    }

    /// Workbook column of category contributions
    pub fn score_cell(self, row: u16) -> String {
        match self {
            Series::Crop => format!("C{}", row),
            Series::Default => format!("D{}", row),
        }
    }

    /// Workbook column of the summary block (total, SOC, score A)
    pub fn summary_cell(self, row: u16) -> String {
        match self {
            Series::Crop => format!("J{}", row),
            Series::Default => format!("K{}", row),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Text(String),
}

impl ScoreValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(v) => Some(*v),
            ScoreValue::Text(_) => None,
        }
    }

    /// JSON form with numbers rounded to 2 decimals
    pub fn presented(&self) -> Value {
        match self {
            ScoreValue::Number(v) => Value::from(round_to(*v, PRESENTATION_DECIMALS)),
            ScoreValue::Text(s) => Value::from(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub cell: String,
    pub value: ScoreValue,
}

/// Ordered named values for one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSet {
    pub series: Series,
    entries: Vec<ScoreEntry>,
}

impl ScoreSet {
    pub fn new(series: Series) -> Self {
        Self { series, entries: Vec::new() }
    }

    pub fn push(&mut self, suffix: &str, cell: String, value: ScoreValue) {
        self.entries.push(ScoreEntry {
            name: self.series.name(suffix),
            cell,
            value,
        });
    }

    pub fn push_number(&mut self, suffix: &str, cell: String, value: f64) {
        self.push(suffix, cell, ScoreValue::Number(value));
    }

    pub fn push_text(&mut self, suffix: &str, cell: String, value: impl Into<String>) {
        self.push(suffix, cell, ScoreValue::Text(value.into()));
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Find an entry by its unprefixed name
    pub fn lookup(&self, suffix: &str) -> Option<&ScoreValue> {
        let full = self.series.name(suffix);
        self.entries.iter().find(|e| e.name == full).map(|e| &e.value)
    }

    pub fn number(&self, suffix: &str) -> Option<f64> {
        self.lookup(suffix).and_then(ScoreValue::as_f64)
    }

    /// Presentation value; `null` when the entry does not exist
    pub fn presented(&self, suffix: &str) -> Value {
        self.lookup(suffix).map(ScoreValue::presented).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_uses_series_prefix() {
        let mut set = ScoreSet::new(Series::Default);
        set.push_number(names::TOTAL, Series::Default.summary_cell(32), 1234.5678);
        set.push_text(names::SOC, Series::Default.summary_cell(33), NO_SOC_RESULTS);

        assert_eq!(set.entries()[0].name, "default_CI_Total");
        assert_eq!(set.entries()[0].cell, "K32");
        assert_eq!(set.number(names::TOTAL), Some(1234.5678));
        assert_eq!(set.presented(names::TOTAL), serde_json::json!(1234.57));
        assert_eq!(set.presented(names::SOC), serde_json::json!("No SOC Results"));
        assert_eq!(set.number(names::SOC), None);
        assert_eq!(set.presented(names::SCORE_C), Value::Null);
    }

    #[test]
    fn test_cells() {
        assert_eq!(Series::Crop.intermediate_cell(13), "L13");
        assert_eq!(Series::Default.intermediate_cell(13), "M13");
        assert_eq!(Series::Crop.score_cell(5), "C5");
        assert_eq!(Series::Crop.summary_cell(34), "J34");
    }
}

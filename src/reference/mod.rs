//! Reference data store
//!
//! Read-only lookup surface over the GREET constants, per-crop GREET defaults,
//! the SOC factor tables and the county FIPS index. Built once at startup and
//! shared (`Arc`) across scoring threads.
//!
//! Files expected in the data directory:
//! - `reference_constants.csv` (`name,value[,description]`)
//! - `greet_defaults.csv` (`Var_Name` + one column per crop)
//! - `corn_soc.csv`, `soybean_soc.csv` (`FIPS` + one column per scenario code)
//! - `national_county.txt` (Census layout, no header)

pub mod constants;
pub mod greet_defaults;
pub mod location;
pub mod soc_table;

pub use constants::{FertilizerIntensities, ReferenceConstants, HERBICIDE_CI_CORRECTED};
pub use greet_defaults::{CropDefaults, GreetDefaults};
pub use location::{state_abbreviation, FipsCode, LocationIndex, UNKNOWN_STATE};
pub use soc_table::{SocFactorTable, SocScenario, Tillage};

use crate::crop::Crop;
use crate::error::ScoringError;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use std::io::Cursor;
use std::path::Path;

pub const CONSTANTS_FILE: &str = "reference_constants.csv";
pub const GREET_DEFAULTS_FILE: &str = "greet_defaults.csv";
pub const CORN_SOC_FILE: &str = "corn_soc.csv";
pub const SOYBEAN_SOC_FILE: &str = "soybean_soc.csv";
pub const COUNTY_FILE: &str = "national_county.txt";

/// Raw table contents, used to build a store without touching the filesystem
#[derive(Debug, Clone)]
pub struct ReferenceSources {
    pub constants_csv: Vec<u8>,
    pub greet_defaults_csv: Vec<u8>,
    pub corn_soc_csv: Vec<u8>,
    pub soybean_soc_csv: Vec<u8>,
    pub national_county_txt: Vec<u8>,
}

pub struct ReferenceDataStore {
    constants: ReferenceConstants,
    descriptions: FxHashMap<String, String>,
    greet_defaults: GreetDefaults,
    soc: SocFactorTable,
    locations: LocationIndex,
}

impl ReferenceDataStore {
    /// Load every reference table from `data_dir`
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        tracing::info!("Loading reference data from {}", dir.display());

        let constants = read_csv_path(&dir.join(CONSTANTS_FILE), true)?;
        let greet = read_csv_path(&dir.join(GREET_DEFAULTS_FILE), true)?;
        let corn_soc = read_csv_path(&dir.join(CORN_SOC_FILE), true)?;
        let soybean_soc = read_csv_path(&dir.join(SOYBEAN_SOC_FILE), true)?;
        let counties = read_csv_path(&dir.join(COUNTY_FILE), false)?;

        Self::from_frames(&constants, &greet, &corn_soc, &soybean_soc, &counties)
    }

    pub fn from_sources(sources: ReferenceSources) -> Result<Self> {
        let constants = read_csv_bytes(sources.constants_csv, true)?;
        let greet = read_csv_bytes(sources.greet_defaults_csv, true)?;
        let corn_soc = read_csv_bytes(sources.corn_soc_csv, true)?;
        let soybean_soc = read_csv_bytes(sources.soybean_soc_csv, true)?;
        let counties = read_csv_bytes(sources.national_county_txt, false)?;

        Self::from_frames(&constants, &greet, &corn_soc, &soybean_soc, &counties)
    }

    fn from_frames(
        constants: &DataFrame,
        greet: &DataFrame,
        corn_soc: &DataFrame,
        soybean_soc: &DataFrame,
        counties: &DataFrame,
    ) -> Result<Self> {
        let loaded = constants::constants_from_frame(constants)
            .context("Failed to load reference constants")?;
        let greet_defaults = GreetDefaults::from_frame(greet)
            .context("Failed to load GREET crop defaults")?;

        let mut soc = SocFactorTable::default();
        soc.add_crop_frame(Crop::Corn, corn_soc)
            .context("Failed to load corn SOC table")?;
        soc.add_crop_frame(Crop::Soybean, soybean_soc)
            .context("Failed to load soybean SOC table")?;

        let locations = LocationIndex::from_frame(counties)
            .context("Failed to load county FIPS index")?;

        tracing::info!(
            "Reference data loaded: {} constants, defaults for {:?}, {} SOC factors, {} counties",
            ReferenceConstants::NAMES.len(),
            greet_defaults.crops(),
            soc.len(),
            locations.len()
        );

        Ok(Self {
            constants: loaded.constants,
            descriptions: loaded.descriptions,
            greet_defaults,
            soc,
            locations,
        })
    }

    pub fn constants(&self) -> &ReferenceConstants {
        &self.constants
    }

    pub fn constant_description(&self, name: &str) -> Option<&str> {
        self.descriptions.get(name).map(String::as_str)
    }

    /// Default per-acre inputs for a crop label.
    ///
    /// Labels outside the closed crop set fail with `UnknownCrop`; a known crop
    /// without a defaults column fails with `MissingReferenceData`.
    pub fn crop_defaults_for(&self, label: &str) -> Result<&CropDefaults, ScoringError> {
        let crop = Crop::normalize(label).ok_or_else(|| ScoringError::UnknownCrop {
            label: label.to_string(),
        })?;
        self.crop_defaults(crop)
    }

    pub fn crop_defaults(&self, crop: Crop) -> Result<&CropDefaults, ScoringError> {
        self.greet_defaults
            .get(crop)
            .ok_or_else(|| ScoringError::MissingReferenceData {
                what: format!("GREET defaults for {}", crop),
            })
    }

    /// SOC factor for a county and management scenario, `None` when absent
    pub fn soc_factor(&self, fips: FipsCode, crop: Crop, scenario: SocScenario) -> Option<f64> {
        self.soc.get(fips, crop, scenario)
    }

    pub fn fips(&self, state_abbr: &str, county: &str) -> Option<FipsCode> {
        self.locations.fips(state_abbr, county)
    }

    pub fn location(&self, fips: FipsCode) -> Option<(&str, &str)> {
        self.locations.location(fips)
    }

    pub fn counties_in(&self, state_abbr: &str) -> Vec<&str> {
        self.locations.counties_in(state_abbr)
    }

    pub fn state_abbreviation(&self, name: &str) -> &'static str {
        state_abbreviation(name)
    }
}

// ============================================================================
// CSV helpers
// ============================================================================

/// Read a CSV file with every column as text; values are parsed explicitly
pub(crate) fn read_csv_path(path: &Path, has_header: bool) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.into()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

pub(crate) fn read_csv_bytes(bytes: Vec<u8>, has_header: bool) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .context("Failed to parse in-memory CSV")
}

pub(crate) fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .str()
        .with_context(|| format!("Column '{}' is not string type", name))
}

/// Parse one text cell; blank and null cells are `None`
pub(crate) fn numeric_cell(cell: Option<&str>) -> Result<Option<f64>> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("'{}' is not a number", text)),
    }
}

#[cfg(test)]
mod tests {
    use crate::crop::Crop;
    use crate::error::ScoringError;
    use crate::test_support::fixture_store;

    #[test]
    fn test_crop_defaults_for_labels() {
        let store = fixture_store();

        assert!(store.crop_defaults_for("corn").is_ok());
        assert!(store.crop_defaults_for("Soybeans").is_ok());
        assert!(matches!(
            store.crop_defaults_for("Wheat"),
            Err(ScoringError::UnknownCrop { .. })
        ));
    }

    #[test]
    fn test_missing_defaults_column() {
        // The fixture defaults table has no Rice column
        let store = fixture_store();
        assert!(matches!(
            store.crop_defaults(Crop::Rice),
            Err(ScoringError::MissingReferenceData { .. })
        ));
    }

    #[test]
    fn test_location_round_trip() {
        let store = fixture_store();
        let fips = store.fips("IA", "Story County").unwrap();

        assert_eq!(fips, 19169);
        assert_eq!(store.location(fips), Some(("IA", "Story County")));
        assert_eq!(store.state_abbreviation("Iowa"), "IA");
        assert!(store.counties_in("IA").contains(&"Story County"));
    }

    #[test]
    fn test_constant_descriptions_kept() {
        let store = fixture_store();
        assert_eq!(store.constant_description("N2O_GWP"), Some("100-year GWP of N2O"));
        assert_eq!(store.constant_description("Unknown_Constant"), None);
    }

    #[test]
    fn test_numeric_cell() {
        assert_eq!(super::numeric_cell(None).unwrap(), None);
        assert_eq!(super::numeric_cell(Some("  ")).unwrap(), None);
        assert_eq!(super::numeric_cell(Some("1.5")).unwrap(), Some(1.5));
        assert!(super::numeric_cell(Some("abc")).is_err());
    }
}

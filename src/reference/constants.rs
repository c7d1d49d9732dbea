//! GREET reference constants
//!
//! Loaded from a `name,value[,description]` table whose names are the GREET
//! reference variable names. Every name listed below must be present.

use super::{numeric_cell, string_column};
use anyhow::{bail, Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

/// Herbicide intensity as published in the calculator workbook.
///
/// The exported table carries 25.29087007 for `Herbicide_CI`; scoring uses
/// the workbook value.
pub const HERBICIDE_CI_CORRECTED: f64 = 29.52011704;

macro_rules! reference_constants {
    ($( $(#[$doc:meta])* $field:ident => $name:literal ),+ $(,)?) => {
        /// Immutable physical and economic constants used by every formula
        #[derive(Debug, Clone, PartialEq)]
        pub struct ReferenceConstants {
            $( $(#[$doc])* pub $field: f64, )+
        }

        impl ReferenceConstants {
            /// GREET variable names, in declaration order
            pub const NAMES: &'static [&'static str] = &[$($name),+];

            /// Build from a name → value map, listing every missing name on failure
            pub fn from_values(values: &FxHashMap<String, f64>) -> Result<Self> {
                let missing: Vec<&str> = Self::NAMES
                    .iter()
                    .copied()
                    .filter(|name| !values.contains_key(*name))
                    .collect();
                if !missing.is_empty() {
                    bail!("Missing reference constants: {}", missing.join(", "));
                }
                Ok(Self {
                    $( $field: values[$name], )+
                })
            }
        }
    };
}

reference_constants! {
    // Energy densities
    /// BTU per gallon of diesel
    diesel_btu_per_gal => "Diesel_BTU2gal",
    gasoline_btu_per_gal => "Gasoline_BTU2gal",
    natural_gas_btu_per_ft3 => "Natural_gas_BTU2ft3",
    lpg_btu_per_gal => "LPG_BTU2gal",
    electricity_btu_per_kwh => "Electricity_BTU2kWh",

    // Unit conversions
    /// Grams per pound
    g_per_lb => "g_to_lb",
    /// Grams per short ton
    g_per_ton => "ton2g",
    g_per_kg => "kg2g",
    acre_to_hectare => "acre2hectare",
    co2_c_to_co2 => "CO2_C_to_CO2",
    n2o_n_to_n2o => "N2O_N_To_N2O",
    n2o_gwp => "N2O_GWP",

    // Energy carbon intensities (g GHG per BTU)
    diesel_ci => "Diesel_CI",
    gasoline_ci => "Gasoline_CI",
    natural_gas_ci => "NaturalGas_CI",
    lpg_ci => "LPG_CI",
    electricity_ci => "Electricity_CI",

    // Fertilizer production intensities (g GHG per ton of product)
    conventional_ammonia_ci => "ConventionalAmmonia_CI",
    conventional_urea_ci => "ConventionalUrea_CI",
    conventional_ammonium_nitrate_ci => "ConventionalAmmoniumNitrate_CI",
    conventional_ammonium_sulfate_ci => "ConventionalAmmoniumSulfate_CI",
    conventional_uan_ci => "ConventionalUAN_CI",
    conventional_map_ci => "ConventionalMAP_CI",
    conventional_dap_ci => "ConventionalDAP_CI",
    green_ammonia_ci => "GreenAmmonia_CI",
    green_urea_ci => "GreenUrea_CI",
    green_ammonium_nitrate_ci => "GreenAmmoniumNitrate_CI",
    green_ammonium_sulfate_ci => "GreenAmmoniumSulfate_CI",
    green_uan_ci => "GreenUAN_CI",
    green_map_ci => "GreenMAP_CI",
    green_dap_ci => "GreenDAP_CI",

    // Nutrient contents
    ammonia_n_content => "Ammonia_N_Content",
    urea_n_content => "Urea_N_Content",
    ammonium_nitrate_n_content => "AmmoniumNitrate_N_Content",
    ammonium_sulfate_n_content => "AmmoniumSulfate_N_Content",
    uan_n_content => "UAN_N_Content",
    map_n_content => "MAP_N_Content",
    dap_n_content => "DAP_N_Content",
    /// Share of MAP production burden allocated to its nitrogen
    map_share_as_n_fertilizer => "MAP_share_as_Nfert",
    dap_share_as_n_fertilizer => "DAP_share_as_Nfert",
    map_p2o5_content => "MAP_P2O5_Content",
    dap_p2o5_content => "DAP_P2O5_Content",

    // Other chemicals
    potash_ci => "ConventionalPotash_CI",
    limestone_ci => "ConventionalLimestone_CI",
    /// Replaced by [`HERBICIDE_CI_CORRECTED`] on load
    herbicide_ci => "Herbicide_CI",
    insecticide_ci => "Insecticide_CI",
    corn_herbicide_production_ghg => "ProductionEmissions_CornHerbicide_GHG",

    // N2O factors
    n2o_factor_corn => "N2O_Factor_US_Corn",
    n2o_factor_soybean => "N2O_Factor_US_Soybean",
    n2o_factor_sorghum => "N2O_Factor_US_Sorghum",
    n2o_factor_rice => "N2O_Factor_US_Rice",
    n2o_factor_corn_direct => "N2O_Factor_US_Corn_Direct",
    n2o_factor_corn_indirect => "N2O_Factor_US_Corn_Indirect",

    // Residue nitrogen
    corn_residue_n_factor => "Corn_Ninbiomass_ResidueFactor",
    soybean_residue_n_factor => "Soybean_Ninbiomass_ResidueFactor",
    sorghum_residue_n_factor => "Sorghum_Ninbiomass_ResidueFactor",
    rice_residue_n_factor => "Rice_Ninbiomass_ResidueFactor",
    /// Rye is the reference cover crop
    rye_residue_n_factor => "Rye_Ninbiomass_ResidueFactor",
    corn_biomass_n2o_factor => "Corn_Biomass_N2O_Factor",
    soybean_biomass_n2o_factor => "Soybean_Biomass_N2O_Factor",
    sorghum_biomass_n2o_factor => "Sorghum_Biomass_N2O_Factor",
    rice_biomass_n2o_factor => "Rice_Biomass_N2O_Factor",

    // Cover crop, manure, CO2
    cover_crop_n2o_factor => "coverCrop_N2O_Emissions",
    manure_n2o_factor => "Manure_N2O_factor",
    urea_n_to_co2 => "Urea_N_to_CO2",
    urea_share_in_uan => "UreaProductionUsage_In_UAN",
    urea_n => "Urea_N",
    caco3_co2_content => "CaCO3_CO2_Content",
    caco3_acidification_share => "CaCO3_PercentAcidification",
}

/// Fertilizer production intensities for one ammonia source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FertilizerIntensities {
    pub ammonia: f64,
    pub urea: f64,
    pub ammonium_nitrate: f64,
    pub ammonium_sulfate: f64,
    pub uan: f64,
    pub map: f64,
    pub dap: f64,
}

impl ReferenceConstants {
    /// GWP of one gram of N2O-N
    pub fn gwp_n2o_n(&self) -> f64 {
        self.n2o_n_to_n2o * self.n2o_gwp
    }

    pub fn conventional_fertilizers(&self) -> FertilizerIntensities {
        FertilizerIntensities {
            ammonia: self.conventional_ammonia_ci,
            urea: self.conventional_urea_ci,
            ammonium_nitrate: self.conventional_ammonium_nitrate_ci,
            ammonium_sulfate: self.conventional_ammonium_sulfate_ci,
            uan: self.conventional_uan_ci,
            map: self.conventional_map_ci,
            dap: self.conventional_dap_ci,
        }
    }

    pub fn green_fertilizers(&self) -> FertilizerIntensities {
        FertilizerIntensities {
            ammonia: self.green_ammonia_ci,
            urea: self.green_urea_ci,
            ammonium_nitrate: self.green_ammonium_nitrate_ci,
            ammonium_sulfate: self.green_ammonium_sulfate_ci,
            uan: self.green_uan_ci,
            map: self.green_map_ci,
            dap: self.green_dap_ci,
        }
    }
}

/// Constants plus the optional description column, kept for the load summary
#[derive(Debug, Clone)]
pub struct LoadedConstants {
    pub constants: ReferenceConstants,
    pub descriptions: FxHashMap<String, String>,
}

/// Parse the constants frame and apply the herbicide correction
pub fn constants_from_frame(df: &DataFrame) -> Result<LoadedConstants> {
    let names = string_column(df, "name")?;
    let values = string_column(df, "value")?;
    let description_col = df
        .column("description")
        .ok()
        .and_then(|c| c.str().ok());

    let mut parsed = FxHashMap::default();
    let mut descriptions = FxHashMap::default();

    for idx in 0..df.height() {
        let Some(name) = names.get(idx).map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let value = numeric_cell(values.get(idx))
            .with_context(|| format!("Reference constant '{}' has a non-numeric value", name))?
            .with_context(|| format!("Reference constant '{}' has no value", name))?;
        parsed.insert(name.to_string(), value);

        if let Some(desc) = description_col.and_then(|c| c.get(idx)) {
            descriptions.insert(name.to_string(), desc.to_string());
        }
    }

    let mut constants = ReferenceConstants::from_values(&parsed)?;
    if constants.herbicide_ci != HERBICIDE_CI_CORRECTED {
        tracing::info!(
            "Herbicide_CI changed from {} to {}",
            constants.herbicide_ci,
            HERBICIDE_CI_CORRECTED
        );
    }
    constants.herbicide_ci = HERBICIDE_CI_CORRECTED;

    Ok(LoadedConstants { constants, descriptions })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::read_csv_bytes;
    use crate::test_support::reference_constants_csv;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_applies_herbicide_correction() {
        let df = read_csv_bytes(reference_constants_csv().into_bytes(), true).unwrap();
        let loaded = constants_from_frame(&df).unwrap();

        assert_relative_eq!(loaded.constants.herbicide_ci, HERBICIDE_CI_CORRECTED);
        assert_relative_eq!(loaded.constants.g_per_lb, 453.59237);
        assert!(loaded.descriptions.contains_key("Diesel_BTU2gal"));
    }

    #[test]
    fn test_missing_names_are_all_listed() {
        let csv = "name,value\nDiesel_BTU2gal,128450\n";
        let df = read_csv_bytes(csv.as_bytes().to_vec(), true).unwrap();
        let err = constants_from_frame(&df).unwrap_err().to_string();

        assert!(err.contains("Gasoline_BTU2gal"));
        assert!(err.contains("CaCO3_PercentAcidification"));
        assert!(!err.contains("Diesel_BTU2gal,"));
    }

    #[test]
    fn test_gwp_n2o_n() {
        let df = read_csv_bytes(reference_constants_csv().into_bytes(), true).unwrap();
        let c = constants_from_frame(&df).unwrap().constants;
        assert_relative_eq!(c.gwp_n2o_n(), c.n2o_n_to_n2o * c.n2o_gwp);
    }
}

//! GREET per-crop default inputs
//!
//! Table layout: a `Var_Name` column (`default_Yield`, `default_Diesel_Gal`, ...)
//! and one column per crop. Blank cells count as zero.

use super::{numeric_cell, string_column};
use crate::crop::Crop;
use crate::inputs::{ChemicalInputs, EnergyInputs, FertilizerInputs};
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

const VAR_NAME_COLUMN: &str = "Var_Name";

/// Baseline per-acre practice for one crop
#[derive(Debug, Clone, PartialEq)]
pub struct CropDefaults {
    pub crop: Crop,
    /// Bushels per acre
    pub yield_bu_per_acre: f64,
    pub energy: EnergyInputs,
    pub fertilizer: FertilizerInputs,
    pub chemicals: ChemicalInputs,
}

#[derive(Debug, Default)]
pub struct GreetDefaults {
    by_crop: FxHashMap<Crop, CropDefaults>,
}

impl GreetDefaults {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let var_names = string_column(df, VAR_NAME_COLUMN)?;
        let mut by_crop = FxHashMap::default();

        for column in df.get_columns() {
            let header = column.name().as_str();
            if header == VAR_NAME_COLUMN {
                continue;
            }
            let Some(crop) = Crop::normalize(header) else {
                tracing::debug!("Ignoring GREET defaults column '{}'", header);
                continue;
            };

            let cells = column
                .str()
                .with_context(|| format!("Column '{}' is not string type", header))?;
            let mut values: FxHashMap<&str, f64> = FxHashMap::default();
            for idx in 0..df.height() {
                let Some(var) = var_names.get(idx).map(str::trim) else {
                    continue;
                };
                let value = numeric_cell(cells.get(idx))
                    .with_context(|| format!("Bad value for {} / {}", var, header))?
                    .unwrap_or(0.0);
                values.insert(var, value);
            }

            match CropDefaults::from_values(crop, &values) {
                Ok(defaults) => {
                    by_crop.insert(crop, defaults);
                }
                Err(missing) => tracing::warn!(
                    "GREET defaults for {} unavailable, missing rows: {}",
                    crop,
                    missing.join(", ")
                ),
            }
        }

        Ok(Self { by_crop })
    }

    pub fn get(&self, crop: Crop) -> Option<&CropDefaults> {
        self.by_crop.get(&crop)
    }

    /// Crops with a complete defaults column, in canonical order
    pub fn crops(&self) -> Vec<Crop> {
        Crop::ALL
            .into_iter()
            .filter(|c| self.by_crop.contains_key(c))
            .collect()
    }
}

impl CropDefaults {
    fn from_values(crop: Crop, values: &FxHashMap<&str, f64>) -> Result<Self, Vec<&'static str>> {
        let mut missing = Vec::new();
        let mut take = |name: &'static str| -> f64 {
            values.get(name).copied().unwrap_or_else(|| {
                missing.push(name);
                0.0
            })
        };

        let defaults = CropDefaults {
            crop,
            yield_bu_per_acre: take("default_Yield"),
            energy: EnergyInputs {
                diesel_gal: take("default_Diesel_Gal"),
                gasoline_gal: take("default_Gasoline_Gal"),
                natural_gas_ft3: take("default_NaturalGas_Gal"),
                lpg_gal: take("default_LPG_Ft3"),
                electricity_kwh: take("default_Electricity_kWh"),
            },
            fertilizer: FertilizerInputs {
                ammonia_lbs: take("default_Ammonia_Lbs"),
                urea_lbs: take("default_Urea_Lbs"),
                ammonium_nitrate_lbs: take("default_AmmoniumNitrate_Lbs"),
                ammonium_sulfate_lbs: take("default_AmmoniumSulfate_Lbs"),
                uan_lbs: take("default_UAN_Lbs"),
                map_lbs: take("default_MAP_Lbs"),
                dap_lbs: take("default_DAP_Lbs"),
                map_p2o5_lbs: take("default_MAP_P2O5_Lbs_N"),
                dap_p2o5_lbs: take("default_DAP_P2O5_Lbs_N"),
                k2o_lbs: take("default_K2O_Lbs_N"),
                caco3_lbs: take("default_CaCO3_Lbs_N"),
            },
            chemicals: ChemicalInputs {
                herbicide_g: take("default_Herbicide_g_Acre"),
                insecticide_g: take("default_Insecticide_g_Acre"),
            },
        };

        if missing.is_empty() {
            Ok(defaults)
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::read_csv_bytes;
    use crate::test_support::greet_defaults_csv;
    use approx::assert_relative_eq;

    #[test]
    fn test_blank_cells_are_zero() {
        let df = read_csv_bytes(greet_defaults_csv().into_bytes(), true).unwrap();
        let table = GreetDefaults::from_frame(&df).unwrap();

        let soy = table.get(Crop::Soybean).unwrap();
        assert_relative_eq!(soy.fertilizer.ammonia_lbs, 0.0);
        assert!(soy.yield_bu_per_acre > 0.0);
        assert_eq!(table.crops(), vec![Crop::Corn, Crop::Soybean, Crop::Sorghum]);
    }

    #[test]
    fn test_missing_row_leaves_crop_without_defaults() {
        let csv = "Var_Name,Corn\ndefault_Yield,180\n";
        let df = read_csv_bytes(csv.as_bytes().to_vec(), true).unwrap();
        let table = GreetDefaults::from_frame(&df).unwrap();

        assert!(table.get(Crop::Corn).is_none());
        assert!(table.crops().is_empty());
    }
}

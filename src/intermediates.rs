//! Per-acre → per-bushel conversion
//!
//! `per_bushel = per_acre × unit conversion / yield`, computed once with the
//! farm's yield (crop series) and once with the crop's GREET default yield
//! (default series). A zero yield or any non-finite value rejects the record.

use crate::error::{ensure_finite, ScoringError};
use crate::feature::FarmRecord;
use crate::inputs::{ChemicalInputs, CoverCropInputs, EnergyInputs, FertilizerInputs, ManureInputs};
use crate::reference::{CropDefaults, ReferenceConstants};
use crate::scoring::{ScoreEntry, ScoreValue, Series};

/// Per-acre inputs of one series, cover crop and manure already resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesInputs {
    pub series: Series,
    pub yield_bu_per_acre: f64,
    pub energy: EnergyInputs,
    pub fertilizer: FertilizerInputs,
    pub chemicals: ChemicalInputs,
    /// `None` when no cover crop is grown
    pub cover_crop: Option<CoverCropInputs>,
    /// `None` when no manure is applied
    pub manure: Option<ManureInputs>,
}

impl SeriesInputs {
    pub fn farm(record: &FarmRecord) -> Self {
        Self {
            series: Series::Crop,
            yield_bu_per_acre: record.yield_bu_per_acre,
            energy: record.energy,
            fertilizer: record.fertilizer,
            chemicals: record.chemicals,
            cover_crop: record.cover_crop_present().then_some(record.cover_crop),
            manure: record.manure_present().then_some(record.manure),
        }
    }

    /// GREET baseline for the same practices the farm reports
    pub fn greet(defaults: &CropDefaults, cover_crop: bool, manure: bool) -> Self {
        Self {
            series: Series::Default,
            yield_bu_per_acre: defaults.yield_bu_per_acre,
            energy: defaults.energy,
            fertilizer: defaults.fertilizer,
            chemicals: defaults.chemicals,
            cover_crop: cover_crop.then_some(CoverCropInputs::GREET_BASELINE),
            manure: manure.then_some(ManureInputs::GREET_BASELINE),
        }
    }
}

/// BTU per bushel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyPerBushel {
    pub diesel: f64,
    pub gasoline: f64,
    pub natural_gas: f64,
    pub lpg: f64,
    pub electricity: f64,
}

/// Grams of N per bushel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NitrogenPerBushel {
    pub ammonia: f64,
    pub urea: f64,
    pub ammonium_nitrate: f64,
    pub ammonium_sulfate: f64,
    pub uan: f64,
    pub map: f64,
    pub dap: f64,
}

impl NitrogenPerBushel {
    pub fn total(&self) -> f64 {
        self.ammonia
            + self.urea
            + self.ammonium_nitrate
            + self.ammonium_sulfate
            + self.uan
            + self.map
            + self.dap
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateMetrics {
    pub series: Series,
    pub yield_bu_per_acre: f64,
    pub energy: EnergyPerBushel,
    pub nitrogen: NitrogenPerBushel,
    /// g per bushel
    pub map_p2o5: f64,
    pub dap_p2o5: f64,
    pub k2o: f64,
    pub caco3: f64,
    pub herbicide: f64,
    pub insecticide: f64,

    pub cover_crop_present: bool,
    /// BTU per bushel
    pub cover_crop_energy: f64,
    /// g per bushel
    pub cover_crop_herbicide: f64,
    /// g N per bushel from cover crop residue
    pub cover_crop_n: f64,

    pub manure_present: bool,
    pub manure_swine_n: f64,
    pub manure_dairy_cow_n: f64,
    pub manure_beef_cattle_n: f64,
    pub manure_chicken_n: f64,
    /// Tons per acre, all species
    pub manure_total_tons: f64,
    pub manure_total_n: f64,
    /// BTU per bushel
    pub manure_application_energy: f64,
    pub manure_transport_energy: f64,
}

impl IntermediateMetrics {
    pub fn derive(inputs: &SeriesInputs, c: &ReferenceConstants) -> Result<Self, ScoringError> {
        let series = inputs.series;
        let yield_bu = inputs.yield_bu_per_acre;
        if !(yield_bu > 0.0 && yield_bu.is_finite()) {
            return Err(ScoringError::arithmetic(format!(
                "{} (yield {})",
                series.name("Yield"),
                yield_bu
            )));
        }
        let per_bu = |per_acre: f64, conversion: f64| per_acre * conversion / yield_bu;

        let e = &inputs.energy;
        let f = &inputs.fertilizer;
        let cover = inputs.cover_crop.unwrap_or_default();
        let manure = inputs.manure.unwrap_or_default();

        let manure_swine_n = per_bu(manure.swine_tons, c.g_per_ton);
        let manure_dairy_cow_n = per_bu(manure.dairy_cow_tons, c.g_per_ton);
        let manure_beef_cattle_n = per_bu(manure.beef_cattle_tons, c.g_per_ton);
        let manure_chicken_n = per_bu(manure.chicken_tons, c.g_per_ton);
        let manure_total_tons = manure.total_tons();

        let metrics = IntermediateMetrics {
            series,
            yield_bu_per_acre: yield_bu,
            energy: EnergyPerBushel {
                diesel: per_bu(e.diesel_gal, c.diesel_btu_per_gal),
                gasoline: per_bu(e.gasoline_gal, c.gasoline_btu_per_gal),
                natural_gas: per_bu(e.natural_gas_ft3, c.natural_gas_btu_per_ft3),
                lpg: per_bu(e.lpg_gal, c.lpg_btu_per_gal),
                electricity: per_bu(e.electricity_kwh, c.electricity_btu_per_kwh),
            },
            nitrogen: NitrogenPerBushel {
                ammonia: per_bu(f.ammonia_lbs, c.g_per_lb),
                urea: per_bu(f.urea_lbs, c.g_per_lb),
                ammonium_nitrate: per_bu(f.ammonium_nitrate_lbs, c.g_per_lb),
                ammonium_sulfate: per_bu(f.ammonium_sulfate_lbs, c.g_per_lb),
                uan: per_bu(f.uan_lbs, c.g_per_lb),
                map: per_bu(f.map_lbs, c.g_per_lb),
                dap: per_bu(f.dap_lbs, c.g_per_lb),
            },
            map_p2o5: per_bu(f.map_p2o5_lbs, c.g_per_lb),
            dap_p2o5: per_bu(f.dap_p2o5_lbs, c.g_per_lb),
            k2o: per_bu(f.k2o_lbs, c.g_per_lb),
            caco3: per_bu(f.caco3_lbs, c.g_per_lb),
            herbicide: per_bu(inputs.chemicals.herbicide_g, 1.0),
            insecticide: per_bu(inputs.chemicals.insecticide_g, 1.0),

            cover_crop_present: inputs.cover_crop.is_some(),
            cover_crop_energy: per_bu(cover.energy_btu, 1.0),
            cover_crop_herbicide: per_bu(cover.herbicide_g, 1.0),
            cover_crop_n: per_bu(cover.yield_tons, c.rye_residue_n_factor),

            manure_present: inputs.manure.is_some(),
            manure_swine_n,
            manure_dairy_cow_n,
            manure_beef_cattle_n,
            manure_chicken_n,
            manure_total_tons,
            manure_total_n: manure_swine_n + manure_dairy_cow_n + manure_beef_cattle_n + manure_chicken_n,
            manure_application_energy: per_bu(manure.application_energy_btu, 1.0),
            manure_transport_energy: per_bu(
                manure.transport_btu_per_ton_mile * manure_total_tons,
                manure.transport_miles,
            ),
        };

        for entry in metrics.entries() {
            if let ScoreValue::Number(v) = entry.value {
                ensure_finite(v, &entry.name)?;
            }
        }
        Ok(metrics)
    }

    /// Ordered `(name, cell, value)` listing
    pub fn entries(&self) -> Vec<ScoreEntry> {
        let s = self.series;
        let rows: [(&str, String, f64); 31] = [
            ("Diesel_BTU_Bu", s.intermediate_cell(13), self.energy.diesel),
            ("Gasoline_BTU_Bu", s.intermediate_cell(14), self.energy.gasoline),
            ("NaturalGas_BTU_Bu", s.intermediate_cell(15), self.energy.natural_gas),
            ("LPG_BTU_Bu", s.intermediate_cell(16), self.energy.lpg),
            ("Electricity_BTU_Bu", s.intermediate_cell(17), self.energy.electricity),
            ("Ammonia_gN_Bu", s.intermediate_cell(22), self.nitrogen.ammonia),
            ("Urea_gN_Bu", s.intermediate_cell(23), self.nitrogen.urea),
            ("AmmoniumNitrate_gN_Bu", s.intermediate_cell(24), self.nitrogen.ammonium_nitrate),
            ("AmmoniumSulfate_gN_Bu", s.intermediate_cell(25), self.nitrogen.ammonium_sulfate),
            ("UAN_gN_Bu", s.intermediate_cell(26), self.nitrogen.uan),
            ("MAP_gN_Bu", s.intermediate_cell(27), self.nitrogen.map),
            ("DAP_gN_Bu", s.intermediate_cell(28), self.nitrogen.dap),
            ("Total_N_gN_Bu", s.intermediate_cell(29), self.nitrogen.total()),
            ("MAP_P2O5_gP_Bu", s.intermediate_cell(31), self.map_p2o5),
            ("DAP_P2O5_gP_Bu", s.intermediate_cell(32), self.dap_p2o5),
            ("K2O_g_Bu", s.intermediate_cell(35), self.k2o),
            ("CaCO3_g_Bu", s.intermediate_cell(38), self.caco3),
            ("Herbicide_g_Bu", s.intermediate_cell(41), self.herbicide),
            ("Insecticide_g_Bu", s.intermediate_cell(44), self.insecticide),
            ("CoverCrop_Energy_BTU_Bu", s.intermediate_cell(50), self.cover_crop_energy),
            ("CoverCrop_Herbicide_g_Bu", s.intermediate_cell(51), self.cover_crop_herbicide),
            ("CoverCropN_gN_Bu", s.intermediate_cell(52), self.cover_crop_n),
            ("Manure_Swine_N_gN_Bu", s.intermediate_cell(59), self.manure_swine_n),
            ("Manure_Cow_N_gN_Bu", s.intermediate_cell(60), self.manure_dairy_cow_n),
            ("Manure_Beef_N_gN_Bu", s.intermediate_cell(61), self.manure_beef_cattle_n),
            ("Manure_Chicken_N_gN_Bu", s.intermediate_cell(62), self.manure_chicken_n),
            ("Manure_TotalTons_Acre", "computed".to_string(), self.manure_total_tons),
            ("Manure_Total_N_gN_Bu", s.intermediate_cell(63), self.manure_total_n),
            ("Manure_Energy_BTU_Bu", s.intermediate_cell(64), self.manure_application_energy),
            (
                "Manure_TransportationEnergy_BTU_Bu",
                s.intermediate_cell(67),
                self.manure_transport_energy,
            ),
            ("Yield_Bu_Acre", "computed".to_string(), self.yield_bu_per_acre),
        ];

        rows.into_iter()
            .map(|(name, cell, value)| ScoreEntry {
                name: s.name(name),
                cell,
                value: ScoreValue::Number(value),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_store;
    use approx::assert_relative_eq;

    fn farm_inputs(yield_bu: f64) -> SeriesInputs {
        SeriesInputs {
            series: Series::Crop,
            yield_bu_per_acre: yield_bu,
            energy: EnergyInputs { diesel_gal: 4.0, ..Default::default() },
            fertilizer: FertilizerInputs { urea_lbs: 20.0, uan_lbs: 30.0, ..Default::default() },
            chemicals: ChemicalInputs { herbicide_g: 900.0, insecticide_g: 0.0 },
            cover_crop: None,
            manure: None,
        }
    }

    #[test]
    fn test_per_bushel_conversion() {
        let store = fixture_store();
        let c = store.constants();
        let m = IntermediateMetrics::derive(&farm_inputs(200.0), c).unwrap();

        assert_relative_eq!(m.energy.diesel, 4.0 * c.diesel_btu_per_gal / 200.0);
        assert_relative_eq!(m.nitrogen.urea, 20.0 * c.g_per_lb / 200.0);
        assert_relative_eq!(m.nitrogen.total(), 50.0 * c.g_per_lb / 200.0);
        assert_relative_eq!(m.herbicide, 4.5);
        assert_relative_eq!(m.cover_crop_energy, 0.0);
        assert_relative_eq!(m.manure_total_n, 0.0);
    }

    #[test]
    fn test_zero_yield_rejected() {
        let store = fixture_store();
        let err = IntermediateMetrics::derive(&farm_inputs(0.0), store.constants()).unwrap_err();
        assert_eq!(err.kind(), "Arithmetic");
    }

    #[test]
    fn test_cover_crop_and_manure_terms() {
        let store = fixture_store();
        let c = store.constants();
        let mut inputs = farm_inputs(100.0);
        inputs.cover_crop = Some(CoverCropInputs { energy_btu: 50_000.0, herbicide_g: 200.0, yield_tons: 1.5 });
        inputs.manure = Some(ManureInputs {
            swine_tons: 2.0,
            chicken_tons: 1.0,
            application_energy_btu: 10_000.0,
            transport_miles: 2.0,
            transport_btu_per_ton_mile: 1_000.0,
            ..Default::default()
        });
        let m = IntermediateMetrics::derive(&inputs, c).unwrap();

        assert_relative_eq!(m.cover_crop_energy, 500.0);
        assert_relative_eq!(m.cover_crop_n, 1.5 * c.rye_residue_n_factor / 100.0);
        assert_relative_eq!(m.manure_total_tons, 3.0);
        assert_relative_eq!(m.manure_total_n, 3.0 * c.g_per_ton / 100.0);
        assert_relative_eq!(m.manure_transport_energy, 1_000.0 * 3.0 * 2.0 / 100.0);
    }

    #[test]
    fn test_entries_are_prefixed_and_ordered() {
        let store = fixture_store();
        let m = IntermediateMetrics::derive(&farm_inputs(180.0), store.constants()).unwrap();
        let entries = m.entries();

        assert_eq!(entries[0].name, "crop_Diesel_BTU_Bu");
        assert_eq!(entries[0].cell, "L13");
        assert!(entries.iter().any(|e| e.name == "crop_Total_N_gN_Bu" && e.cell == "L29"));
    }
}

//! Per-acre input bundles shared by farm records and GREET defaults

use serde::Serialize;

/// Fuel and power use per acre
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyInputs {
    pub diesel_gal: f64,
    pub gasoline_gal: f64,
    pub natural_gas_ft3: f64,
    pub lpg_gal: f64,
    pub electricity_kwh: f64,
}

/// Fertilizer and soil amendment application, lbs per acre
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FertilizerInputs {
    pub ammonia_lbs: f64,
    pub urea_lbs: f64,
    pub ammonium_nitrate_lbs: f64,
    pub ammonium_sulfate_lbs: f64,
    pub uan_lbs: f64,
    /// Nitrogen applied as monoammonium phosphate
    pub map_lbs: f64,
    /// Nitrogen applied as diammonium phosphate
    pub dap_lbs: f64,
    pub map_p2o5_lbs: f64,
    pub dap_p2o5_lbs: f64,
    pub k2o_lbs: f64,
    pub caco3_lbs: f64,
}

/// Herbicide and insecticide, grams per acre
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChemicalInputs {
    pub herbicide_g: f64,
    pub insecticide_g: f64,
}

/// Cover crop practice, all zero when no cover crop is grown
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoverCropInputs {
    pub energy_btu: f64,
    pub herbicide_g: f64,
    pub yield_tons: f64,
}

impl CoverCropInputs {
    /// GREET baseline cover crop practice
    pub const GREET_BASELINE: CoverCropInputs = CoverCropInputs {
        energy_btu: 62_060.0,
        herbicide_g: 612.3496995,
        yield_tons: 1.21405880091459,
    };
}

/// Manure application, tons per acre by species
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ManureInputs {
    pub swine_tons: f64,
    pub dairy_cow_tons: f64,
    pub beef_cattle_tons: f64,
    pub chicken_tons: f64,
    pub application_energy_btu: f64,
    pub transport_miles: f64,
    pub transport_btu_per_ton_mile: f64,
}

/// GREET baseline manure rate, tons per acre
const GREET_MANURE_TONS: f64 = 7.854;

impl ManureInputs {
    /// GREET baseline manure practice
    pub const GREET_BASELINE: ManureInputs = ManureInputs {
        swine_tons: GREET_MANURE_TONS * 0.243,
        dairy_cow_tons: GREET_MANURE_TONS * 0.423,
        beef_cattle_tons: GREET_MANURE_TONS * 0.216,
        chicken_tons: GREET_MANURE_TONS * 0.119,
        application_energy_btu: 221_365.589648777,
        transport_miles: 0.367,
        transport_btu_per_ton_mile: 10_416.49299,
    };

    pub fn total_tons(&self) -> f64 {
        self.swine_tons + self.dairy_cow_tons + self.beef_cattle_tons + self.chicken_tons
    }

    pub fn any_applied(&self) -> bool {
        self.swine_tons > 0.0
            || self.dairy_cow_tons > 0.0
            || self.beef_cattle_tons > 0.0
            || self.chicken_tons > 0.0
    }
}

//! County SOC change factors
//!
//! One table per crop: a `FIPS` column plus one column per management scenario,
//! named by a three-letter code:
//!   1. cover crop: `C` (cover crop) or `N`
//!   2. manure: `M` (manure) or `N`
//!   3. tillage: `C` (conventional), `R` (reduced) or `N` (no-till)

use super::{numeric_cell, string_column, FipsCode};
use crate::crop::Crop;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tillage {
    Conventional,
    Reduced,
    NoTill,
}

impl Tillage {
    /// "Conventional tillage" / "Reduced tillage" / anything else is no-till
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.starts_with("conventional") {
            Tillage::Conventional
        } else if lower.starts_with("reduced") {
            Tillage::Reduced
        } else {
            Tillage::NoTill
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocScenario {
    pub cover_crop: bool,
    pub manure: bool,
    pub tillage: Tillage,
}

impl SocScenario {
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(3);
        code.push(if self.cover_crop { 'C' } else { 'N' });
        code.push(if self.manure { 'M' } else { 'N' });
        code.push(match self.tillage {
            Tillage::Conventional => 'C',
            Tillage::Reduced => 'R',
            Tillage::NoTill => 'N',
        });
        code
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let bytes = code.trim().as_bytes();
        if bytes.len() != 3 {
            return None;
        }
        let cover_crop = match bytes[0] {
            b'C' => true,
            b'N' => false,
            _ => return None,
        };
        let manure = match bytes[1] {
            b'M' => true,
            b'N' => false,
            _ => return None,
        };
        let tillage = match bytes[2] {
            b'C' => Tillage::Conventional,
            b'R' => Tillage::Reduced,
            b'N' => Tillage::NoTill,
            _ => return None,
        };
        Some(Self { cover_crop, manure, tillage })
    }
}

#[derive(Debug, Default)]
pub struct SocFactorTable {
    factors: FxHashMap<(Crop, FipsCode, SocScenario), f64>,
}

impl SocFactorTable {
    pub fn add_crop_frame(&mut self, crop: Crop, df: &DataFrame) -> Result<()> {
        let fips_col = string_column(df, "FIPS")?;
        let scenario_cols: Vec<(SocScenario, &StringChunked)> = df
            .get_columns()
            .iter()
            .filter_map(|c| {
                let scenario = SocScenario::from_code(c.name().as_str())?;
                c.str().ok().map(|s| (scenario, s))
            })
            .collect();

        for idx in 0..df.height() {
            let Some(fips) = fips_col.get(idx).and_then(parse_fips) else {
                continue;
            };
            for (scenario, col) in &scenario_cols {
                let value = numeric_cell(col.get(idx)).with_context(|| {
                    format!("Bad SOC factor for FIPS {} scenario {}", fips, scenario.code())
                })?;
                // Blank cells mean no data for that scenario
                if let Some(value) = value {
                    self.factors.insert((crop, fips, *scenario), value);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, fips: FipsCode, crop: Crop, scenario: SocScenario) -> Option<f64> {
        self.factors.get(&(crop, fips, scenario)).copied()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// FIPS cells may be written as integers or floats ("1031", "1031.0")
fn parse_fips(text: &str) -> Option<FipsCode> {
    let text = text.trim();
    text.parse::<FipsCode>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as FipsCode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::read_csv_bytes;

    #[test]
    fn test_scenario_codes() {
        let s = SocScenario { cover_crop: true, manure: false, tillage: Tillage::Reduced };
        assert_eq!(s.code(), "CNR");
        assert_eq!(SocScenario::from_code("CNR"), Some(s));
        assert_eq!(SocScenario::from_code("FIPS"), None);
        assert_eq!(SocScenario::from_code("XMC"), None);
    }

    #[test]
    fn test_tillage_labels() {
        assert_eq!(Tillage::from_label("Conventional tillage"), Tillage::Conventional);
        assert_eq!(Tillage::from_label("reduced till"), Tillage::Reduced);
        assert_eq!(Tillage::from_label("No till"), Tillage::NoTill);
        assert_eq!(Tillage::from_label("N/A"), Tillage::NoTill);
    }

    #[test]
    fn test_blank_cell_is_no_data() {
        let csv = "FIPS,NNC,NNR\n1031,-0.12,\n19169.0,0.05,0.07\n";
        let df = read_csv_bytes(csv.as_bytes().to_vec(), true).unwrap();
        let mut table = SocFactorTable::default();
        table.add_crop_frame(Crop::Corn, &df).unwrap();

        let nnc = SocScenario::from_code("NNC").unwrap();
        let nnr = SocScenario::from_code("NNR").unwrap();
        assert_eq!(table.get(1031, Crop::Corn, nnc), Some(-0.12));
        assert_eq!(table.get(1031, Crop::Corn, nnr), None);
        assert_eq!(table.get(19169, Crop::Corn, nnr), Some(0.07));
        assert_eq!(table.get(19169, Crop::Soybean, nnr), None);
        assert_eq!(table.len(), 3);
    }
}

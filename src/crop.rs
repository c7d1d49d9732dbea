//! Closed crop set and per-crop emission factor selection

use crate::reference::ReferenceConstants;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Corn,
    Soybean,
    Sorghum,
    Rice,
}

impl Crop {
    pub const ALL: [Crop; 4] = [Crop::Corn, Crop::Soybean, Crop::Sorghum, Crop::Rice];

    /// Map a free-form label onto the closed set.
    ///
    /// Matching is a case-insensitive substring test in the order
    /// corn, soybean, sorghum, rice, so "Yellow Corn #2" is Corn.
    pub fn normalize(label: &str) -> Option<Crop> {
        let lower = label.to_lowercase();
        Crop::ALL
            .into_iter()
            .find(|crop| lower.contains(crop.search_term()))
    }

    fn search_term(self) -> &'static str {
        match self {
            Crop::Corn => "corn",
            Crop::Soybean => "soybean",
            Crop::Sorghum => "sorghum",
            Crop::Rice => "rice",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Crop::Corn => "Corn",
            Crop::Soybean => "Soybean",
            Crop::Sorghum => "Sorghum",
            Crop::Rice => "Rice",
        }
    }

    /// SOC tables exist for Corn and Soybean only
    pub fn has_soc_table(self) -> bool {
        matches!(self, Crop::Corn | Crop::Soybean)
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crop-dependent N2O and residue factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropEmissionFactors {
    /// Fraction of applied N emitted as N2O-N
    pub n2o_factor: f64,
    /// N left in above/below-ground residue per bushel
    pub residue_n_factor: f64,
    /// Fraction of residue N emitted as N2O-N
    pub biomass_n2o_factor: f64,
}

impl CropEmissionFactors {
    pub fn for_crop(crop: Crop, c: &ReferenceConstants) -> Self {
        match crop {
            Crop::Corn => CropEmissionFactors {
                n2o_factor: c.n2o_factor_corn,
                residue_n_factor: c.corn_residue_n_factor,
                biomass_n2o_factor: c.corn_biomass_n2o_factor,
            },
            Crop::Soybean => CropEmissionFactors {
                n2o_factor: c.n2o_factor_soybean,
                residue_n_factor: c.soybean_residue_n_factor,
                biomass_n2o_factor: c.soybean_biomass_n2o_factor,
            },
            Crop::Sorghum => CropEmissionFactors {
                n2o_factor: c.n2o_factor_sorghum,
                residue_n_factor: c.sorghum_residue_n_factor,
                biomass_n2o_factor: c.sorghum_biomass_n2o_factor,
            },
            Crop::Rice => CropEmissionFactors {
                n2o_factor: c.n2o_factor_rice,
                residue_n_factor: c.rice_residue_n_factor,
                biomass_n2o_factor: c.rice_biomass_n2o_factor,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_substring_case_insensitive() {
        assert_eq!(Crop::normalize("Yellow Corn #2"), Some(Crop::Corn));
        assert_eq!(Crop::normalize("SOYBEANS"), Some(Crop::Soybean));
        assert_eq!(Crop::normalize("grain sorghum"), Some(Crop::Sorghum));
        assert_eq!(Crop::normalize("Long grain rice"), Some(Crop::Rice));
        assert_eq!(Crop::normalize("Wheat"), None);
        assert_eq!(Crop::normalize(""), None);
    }

    #[test]
    fn test_soc_table_crops() {
        assert!(Crop::Corn.has_soc_table());
        assert!(Crop::Soybean.has_soc_table());
        assert!(!Crop::Sorghum.has_soc_table());
        assert!(!Crop::Rice.has_soc_table());
    }
}

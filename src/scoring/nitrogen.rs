//! Nitrogen management policy
//!
//! Ammonia source selects the fertilizer intensity table. For Corn under 4R
//! management the crop series applies a fertilizer reduction and picks one of
//! the N2O (cell C37) scenarios.

use crate::crop::Crop;
use crate::feature::ManagementInputs;
use crate::reference::{FertilizerIntensities, ReferenceConstants};
use crate::utils::starts_with_ignore_case;
use serde::Serialize;

/// Fixed 4R reduction when the rate type is "Default"
pub const DEFAULT_4R_REDUCTION: f64 = 0.14;

/// Share of the direct N2O factor kept under enhanced-efficiency fertilizers
pub const ENHANCED_EFFICIENCY_DIRECT_SHARE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmmoniaSource {
    Conventional,
    Green,
}

impl AmmoniaSource {
    /// "Conventional" (any case) or anything else, which is green
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("conventional") {
            AmmoniaSource::Conventional
        } else {
            AmmoniaSource::Green
        }
    }

    pub fn intensities(self, c: &ReferenceConstants) -> FertilizerIntensities {
        match self {
            AmmoniaSource::Conventional => c.conventional_fertilizers(),
            AmmoniaSource::Green => c.green_fertilizers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NitrogenManagement {
    BusinessAsUsual,
    FourR,
    Other,
}

impl NitrogenManagement {
    pub fn from_label(label: &str) -> Self {
        if starts_with_ignore_case(label, "business as usual") {
            NitrogenManagement::BusinessAsUsual
        } else if starts_with_ignore_case(label, "4r") {
            NitrogenManagement::FourR
        } else {
            NitrogenManagement::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FertilizerRateType {
    Default,
    UserSpecified,
    Other,
}

impl FertilizerRateType {
    pub fn from_label(label: &str) -> Self {
        if starts_with_ignore_case(label, "default") {
            FertilizerRateType::Default
        } else if starts_with_ignore_case(label, "user") {
            FertilizerRateType::UserSpecified
        } else {
            FertilizerRateType::Other
        }
    }
}

/// Which N2O formula the crop series used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum N2oScenario {
    NonCorn,
    CornBusinessAsUsual,
    CornFourRDefaultRate,
    CornFourRUserRate,
    CornFourROtherRate,
    CornEnhancedEfficiency,
}

impl N2oScenario {
    pub fn label(self) -> &'static str {
        match self {
            N2oScenario::NonCorn => "scenario 1: crop not Corn",
            N2oScenario::CornBusinessAsUsual => "scenario 2: Corn, N-management BAU",
            N2oScenario::CornFourRDefaultRate => {
                "scenario 3: Corn, N-management 4R, fert rate Default"
            }
            N2oScenario::CornFourRUserRate => {
                "scenario 4: Corn, N-management 4R, fert rate User-specified"
            }
            N2oScenario::CornFourROtherRate => {
                "scenario 4b: Corn, N-management 4R, other fert rate, full factor"
            }
            N2oScenario::CornEnhancedEfficiency => {
                "scenario 5, Corn, all other (usu. fert rate Enhanced Efficiency)"
            }
        }
    }
}

/// Resolved nitrogen management for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NitrogenPolicy {
    pub crop: Crop,
    pub ammonia_source: AmmoniaSource,
    pub management: NitrogenManagement,
    pub rate_type: FertilizerRateType,
    /// User reduction as a fraction in [0, 1]
    pub user_reduction: f64,
    pub management_label: String,
    pub rate_type_label: String,
}

impl NitrogenPolicy {
    pub fn from_inputs(crop: Crop, m: &ManagementInputs) -> Self {
        Self {
            crop,
            ammonia_source: AmmoniaSource::from_label(&m.ammonia_source),
            management: NitrogenManagement::from_label(&m.nitrogen_management),
            rate_type: FertilizerRateType::from_label(&m.fertilizer_rate_type),
            user_reduction: reduction_fraction(m.reduction_in_fertilizer),
            management_label: m.nitrogen_management.clone(),
            rate_type_label: m.fertilizer_rate_type.clone(),
        }
    }

    fn is_corn_4r(&self) -> bool {
        self.crop == Crop::Corn && self.management == NitrogenManagement::FourR
    }

    /// Fraction removed from nitrogen products on the crop series
    pub fn crop_reduction(&self) -> f64 {
        if !self.is_corn_4r() {
            return 0.0;
        }
        match self.rate_type {
            FertilizerRateType::Default => DEFAULT_4R_REDUCTION,
            FertilizerRateType::UserSpecified => self.user_reduction,
            FertilizerRateType::Other => 0.0,
        }
    }

    pub fn n2o_scenario(&self) -> N2oScenario {
        if self.crop != Crop::Corn {
            return N2oScenario::NonCorn;
        }
        match (self.management, self.rate_type) {
            (NitrogenManagement::BusinessAsUsual, _) => N2oScenario::CornBusinessAsUsual,
            (NitrogenManagement::FourR, FertilizerRateType::Default) => {
                N2oScenario::CornFourRDefaultRate
            }
            (NitrogenManagement::FourR, FertilizerRateType::UserSpecified) => {
                N2oScenario::CornFourRUserRate
            }
            (NitrogenManagement::FourR, FertilizerRateType::Other) => {
                N2oScenario::CornFourROtherRate
            }
            (NitrogenManagement::Other, _) => N2oScenario::CornEnhancedEfficiency,
        }
    }
}

/// Reported reduction → fraction: values above 1 are percents (14 ≡ 0.14)
pub fn reduction_fraction(reported: f64) -> f64 {
    let fraction = if reported > 1.0 { reported / 100.0 } else { reported };
    if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn policy(crop: Crop, management: &str, rate_type: &str, reduction: f64) -> NitrogenPolicy {
        NitrogenPolicy::from_inputs(
            crop,
            &ManagementInputs {
                tillage: "No till".to_string(),
                soc_tillage: "No till".to_string(),
                cover_crop_label: "No cover crop".to_string(),
                ammonia_source: "Conventional".to_string(),
                nitrogen_management: management.to_string(),
                fertilizer_rate_type: rate_type.to_string(),
                reduction_in_fertilizer: reduction,
            },
        )
    }

    #[test]
    fn test_reduction_normalized_once() {
        assert_relative_eq!(reduction_fraction(14.0), 0.14);
        assert_relative_eq!(reduction_fraction(0.14), 0.14);
        assert_relative_eq!(reduction_fraction(1.0), 1.0);
        assert_relative_eq!(reduction_fraction(250.0), 1.0);
        assert_relative_eq!(reduction_fraction(-5.0), 0.0);
    }

    #[test]
    fn test_crop_reduction_priority() {
        assert_relative_eq!(policy(Crop::Corn, "4R", "Default rate", 30.0).crop_reduction(), 0.14);
        assert_relative_eq!(policy(Crop::Corn, "4R plan", "User specified", 20.0).crop_reduction(), 0.20);
        assert_relative_eq!(policy(Crop::Corn, "4R", "Enhanced", 20.0).crop_reduction(), 0.0);
        assert_relative_eq!(policy(Crop::Corn, "Business as usual", "Default", 20.0).crop_reduction(), 0.0);
        assert_relative_eq!(policy(Crop::Soybean, "4R", "Default", 20.0).crop_reduction(), 0.0);
    }

    #[test]
    fn test_n2o_scenarios() {
        assert_eq!(policy(Crop::Rice, "4R", "Default", 0.0).n2o_scenario(), N2oScenario::NonCorn);
        assert_eq!(
            policy(Crop::Corn, "business as usual", "Default", 0.0).n2o_scenario(),
            N2oScenario::CornBusinessAsUsual
        );
        assert_eq!(
            policy(Crop::Corn, "4R", "default", 0.0).n2o_scenario(),
            N2oScenario::CornFourRDefaultRate
        );
        assert_eq!(
            policy(Crop::Corn, "4r", "User specified reduction", 10.0).n2o_scenario(),
            N2oScenario::CornFourRUserRate
        );
        assert_eq!(
            policy(Crop::Corn, "4R", "Variable", 0.0).n2o_scenario(),
            N2oScenario::CornFourROtherRate
        );
        assert_eq!(
            policy(Crop::Corn, "Enhanced Efficiency", "Default", 0.0).n2o_scenario(),
            N2oScenario::CornEnhancedEfficiency
        );
    }

    #[test]
    fn test_ammonia_source() {
        assert_eq!(AmmoniaSource::from_label("conventional"), AmmoniaSource::Conventional);
        assert_eq!(AmmoniaSource::from_label("Green ammonia"), AmmoniaSource::Green);
    }
}

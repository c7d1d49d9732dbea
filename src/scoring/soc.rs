//! SOC adjustment and composite scores
//!
//! SOC (g GHG/bu) = factor × CO2_C_to_CO2 / acre2hectare × kg2g / yield.
//! Score A adds it to the CI total, Score B converts to g GHG/MJ and Score C
//! gives tonnes GHG for the whole planting.

use super::{names, ScoreSet, Series};
use crate::crop::Crop;
use crate::error::ScoringError;
use crate::reference::{FipsCode, ReferenceConstants, ReferenceDataStore, SocScenario};

/// 2.75 gal/bu × 81.51 MJ/gal
pub const MJ_PER_BUSHEL: f64 = 224.1525;

pub const NO_SOC_RESULTS: &str = "No SOC Results";

const GRAMS_PER_TONNE: f64 = 1_000_000.0;

/// County SOC factor for one record
#[derive(Debug, Clone, PartialEq)]
pub enum SocOutcome {
    Factor(f64),
    NoResults(ScoringError),
}

pub struct SocAdjuster<'a> {
    store: &'a ReferenceDataStore,
}

impl<'a> SocAdjuster<'a> {
    pub fn new(store: &'a ReferenceDataStore) -> Self {
        Self { store }
    }

    /// Look up the factor; every miss becomes `NoResults` and is logged
    pub fn resolve(&self, crop: Crop, fips: Option<FipsCode>, scenario: SocScenario) -> SocOutcome {
        let outcome = self.lookup(crop, fips, scenario);
        if let SocOutcome::NoResults(err) = &outcome {
            tracing::warn!(crop = %crop, fips = ?fips, scenario = %scenario.code(), "{}", err);
        }
        outcome
    }

    fn lookup(&self, crop: Crop, fips: Option<FipsCode>, scenario: SocScenario) -> SocOutcome {
        if !crop.has_soc_table() {
            return no_results(format!("no SOC table for {}", crop));
        }
        let Some(fips) = fips else {
            return no_results("county FIPS code unknown".to_string());
        };
        match self.store.soc_factor(fips, crop, scenario) {
            Some(factor) if factor.is_finite() => SocOutcome::Factor(factor),
            Some(factor) => no_results(format!("non-finite SOC factor {} for FIPS {}", factor, fips)),
            None => no_results(format!(
                "no {} factor for FIPS {} scenario {}",
                crop,
                fips,
                scenario.code()
            )),
        }
    }

    /// Append SOC_Factor, SOC, ScoreA, ScoreB and (with `bushels`) ScoreC
    pub fn apply(&self, scores: &mut ScoreSet, outcome: &SocOutcome, yield_bu: f64, bushels: Option<f64>) {
        let s = scores.series;
        let factor_cell = match s {
            Series::Crop => "F80".to_string(),
            Series::Default => "G80".to_string(),
        };
        let total = scores.number(names::TOTAL).unwrap_or(0.0);

        let soc = match outcome {
            SocOutcome::Factor(factor) => {
                scores.push_number(names::SOC_FACTOR, factor_cell, *factor);
                soc_per_bushel(*factor, yield_bu, self.store.constants())
            }
            SocOutcome::NoResults(_) => {
                scores.push_text(names::SOC_FACTOR, factor_cell, NO_SOC_RESULTS);
                None
            }
        };

        let score_a = match soc {
            Some(soc) => {
                scores.push_number(names::SOC, s.summary_cell(33), soc);
                total + soc
            }
            None => {
                scores.push_text(names::SOC, s.summary_cell(33), NO_SOC_RESULTS);
                total
            }
        };
        scores.push_number(names::SCORE_A, s.summary_cell(34), score_a);
        scores.push_number(names::SCORE_B, s.summary_cell(35), score_a / MJ_PER_BUSHEL);
        if let Some(bushels) = bushels {
            scores.push_number(names::SCORE_C, "computed".to_string(), score_a * bushels / GRAMS_PER_TONNE);
        }
    }
}

/// `None` when the result is not finite (zero yield)
fn soc_per_bushel(factor: f64, yield_bu: f64, c: &ReferenceConstants) -> Option<f64> {
    let soc = factor * c.co2_c_to_co2 / c.acre_to_hectare * c.g_per_kg / yield_bu;
    soc.is_finite().then_some(soc)
}

fn no_results(reason: String) -> SocOutcome {
    SocOutcome::NoResults(ScoringError::SocLookup { reason })
}

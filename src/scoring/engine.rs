//! Category contributions and bucket totals
//!
//! contribution = per-bushel intermediate × emission factor. The six buckets
//! (energy, nitrogen fertilizer, N2O, CO2, CH4, other chemicals) sum to the
//! CI total for the series.

use super::names;
use super::nitrogen::{AmmoniaSource, N2oScenario, NitrogenPolicy, DEFAULT_4R_REDUCTION, ENHANCED_EFFICIENCY_DIRECT_SHARE};
use super::{ScoreSet, ScoreValue, Series};
use crate::crop::{Crop, CropEmissionFactors};
use crate::error::{ensure_finite, ScoringError};
use crate::intermediates::IntermediateMetrics;
use crate::reference::{FertilizerIntensities, ReferenceConstants};
use serde::Serialize;

/// g GHG per bushel, one field per workbook category row
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryContributions {
    pub diesel: f64,
    pub gasoline: f64,
    pub natural_gas: f64,
    pub lpg: f64,
    pub electricity: f64,

    pub ammonia: f64,
    pub urea: f64,
    pub ammonium_nitrate: f64,
    pub ammonium_sulfate: f64,
    pub uan: f64,
    pub map: f64,
    pub dap: f64,

    pub map_p2o5: f64,
    pub dap_p2o5: f64,
    pub potash: f64,
    pub limestone: f64,
    pub herbicide: f64,
    pub insecticide: f64,

    pub n2o_emission: f64,
    pub co2_urea: f64,
    pub co2_caco3: f64,
    pub soybean_fixation: f64,
    pub ch4: f64,
}

impl CategoryContributions {
    pub fn energy(&self) -> f64 {
        self.diesel + self.gasoline + self.natural_gas + self.lpg + self.electricity
    }

    pub fn nitrogen_fertilizer(&self) -> f64 {
        self.ammonia
            + self.urea
            + self.ammonium_nitrate
            + self.ammonium_sulfate
            + self.uan
            + self.map
            + self.dap
    }

    pub fn n2o(&self) -> f64 {
        self.n2o_emission + self.soybean_fixation
    }

    pub fn co2(&self) -> f64 {
        self.co2_urea + self.co2_caco3
    }

    pub fn other_chemicals(&self) -> f64 {
        self.map_p2o5 + self.dap_p2o5 + self.potash + self.limestone + self.herbicide + self.insecticide
    }

    pub fn total(&self) -> f64 {
        self.energy() + self.nitrogen_fertilizer() + self.n2o() + self.co2() + self.ch4 + self.other_chemicals()
    }

    /// Category rows, bucket rows and the total, in workbook order
    fn write_to(&self, set: &mut ScoreSet) {
        let s = set.series;
        let rows: [(&str, u16, f64); 23] = [
            (names::DIESEL, 5, self.diesel),
            (names::GASOLINE, 6, self.gasoline),
            (names::NATURAL_GAS, 7, self.natural_gas),
            (names::LPG, 8, self.lpg),
            (names::ELECTRICITY, 9, self.electricity),
            (names::AMMONIA, 12, self.ammonia),
            (names::UREA, 13, self.urea),
            (names::AMMONIUM_NITRATE, 14, self.ammonium_nitrate),
            (names::AMMONIUM_SULFATE, 15, self.ammonium_sulfate),
            (names::UAN, 16, self.uan),
            (names::MAP, 17, self.map),
            (names::DAP, 18, self.dap),
            (names::MAP_P2O5, 21, self.map_p2o5),
            (names::DAP_P2O5, 22, self.dap_p2o5),
            (names::POTASH, 25, self.potash),
            (names::LIMESTONE, 28, self.limestone),
            (names::HERBICIDE, 31, self.herbicide),
            (names::INSECTICIDE, 34, self.insecticide),
            (names::N2O_EMISSION, 37, self.n2o_emission),
            (names::CO2_UREA, 38, self.co2_urea),
            (names::CO2_CACO3, 39, self.co2_caco3),
            (names::SOYBEAN_FIXATION, 40, self.soybean_fixation),
            (names::CH4, 41, self.ch4),
        ];
        for (name, row, value) in rows {
            set.push_number(name, s.score_cell(row), value);
        }

        set.push_number(names::ENERGY, s.score_cell(55), self.energy());
        set.push_number(names::NITROGEN_FERTILIZER, s.score_cell(56), self.nitrogen_fertilizer());
        set.push_number(names::N2O, s.score_cell(57), self.n2o());
        set.push_number(names::CO2, s.score_cell(58), self.co2());
        set.push_number(names::OTHER_CHEMICALS, s.score_cell(60), self.other_chemicals());
        set.push_number(names::TOTAL, s.summary_cell(32), self.total());
    }
}

/// Crop-series inputs that the default series does not need
#[derive(Debug, Clone, Copy)]
pub struct CropSideContext<'p> {
    pub policy: &'p NitrogenPolicy,
    /// Total N per bushel of the default series, the 4R N2O baseline
    pub baseline_total_n: f64,
    pub crop_area: f64,
    pub average_crop_price: f64,
}

/// N2O (cell C37) outcome plus the alternatives it is compared against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N2oComparators {
    pub scenario: N2oScenario,
    pub nitrogen_management: String,
    pub fertilizer_rate_type: String,
    pub total_n: f64,
    pub chosen: f64,
    pub business_as_usual: f64,
    pub enhanced_efficiency: f64,
}

/// One series worth of scores
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSeries {
    pub scores: ScoreSet,
    pub contributions: CategoryContributions,
}

/// Additive N2O pieces shared by every scenario
#[derive(Debug, Clone, Copy)]
struct N2oTerms {
    /// g GHG per g of applied N at the crop's full factor
    feedstock_gwp: f64,
    /// biomass residue, the only additive term on the crop side
    biomass: f64,
}

pub struct CiScoringEngine<'a> {
    constants: &'a ReferenceConstants,
}

impl<'a> CiScoringEngine<'a> {
    pub fn new(constants: &'a ReferenceConstants) -> Self {
        Self { constants }
    }

    /// GREET default series: no reduction, full N2O factor.
    ///
    /// `farm_manure_tons` is the farm's total manure (tons/acre); its N2O term
    /// and the corn cover crop term are carried by this series only.
    pub fn score_default(
        &self,
        crop: Crop,
        m: &IntermediateMetrics,
        source: AmmoniaSource,
        farm_manure_tons: f64,
    ) -> Result<ScoredSeries, ScoringError> {
        let c = self.constants;
        let terms = self.n2o_terms(crop);
        let cover_crop = if crop == Crop::Corn && m.cover_crop_present {
            m.cover_crop_n * c.cover_crop_n2o_factor * c.gwp_n2o_n()
        } else {
            0.0
        };
        let manure = if m.manure_present {
            farm_manure_tons * c.manure_n2o_factor * c.n2o_gwp
        } else {
            0.0
        };
        let n2o = m.nitrogen.total() * terms.feedstock_gwp + terms.biomass + cover_crop + manure;
        let contributions = self.contributions(crop, m, &source.intensities(self.constants), 0.0, n2o);

        let mut scores = ScoreSet::new(Series::Default);
        contributions.write_to(&mut scores);
        check_finite(&scores)?;

        Ok(ScoredSeries { scores, contributions })
    }

    /// Farm series: 4R reduction, N2O scenario and bushel/value figures
    pub fn score_crop(
        &self,
        crop: Crop,
        m: &IntermediateMetrics,
        ctx: &CropSideContext<'_>,
    ) -> Result<(ScoredSeries, N2oComparators), ScoringError> {
        let policy = ctx.policy;
        let comparators = self.n2o_comparators(crop, m, ctx);
        let intensities = policy.ammonia_source.intensities(self.constants);
        let contributions =
            self.contributions(crop, m, &intensities, policy.crop_reduction(), comparators.chosen);

        let bushels = ctx.crop_area * m.yield_bu_per_acre;
        let mut scores = ScoreSet::new(Series::Crop);
        scores.push_number(names::BUSHELS, "computed".to_string(), bushels);
        scores.push_number(names::CROP_VALUE, "computed".to_string(), bushels * ctx.average_crop_price);
        contributions.write_to(&mut scores);

        let c37 = || Series::Crop.score_cell(37);
        scores.push_number(names::TOTAL_N, c37(), comparators.total_n);
        scores.push_text(names::N2O_SCENARIO, c37(), comparators.scenario.label());
        scores.push_text(names::NITROGEN_MANAGEMENT, c37(), comparators.nitrogen_management.as_str());
        scores.push_text(names::RATE_TYPE, c37(), comparators.fertilizer_rate_type.as_str());
        scores.push_number(names::N2O_BAU, c37(), comparators.business_as_usual);
        scores.push_number(names::N2O_EE, c37(), comparators.enhanced_efficiency);
        check_finite(&scores)?;

        tracing::debug!(
            crop = %crop,
            scenario = comparators.scenario.label(),
            total = contributions.total(),
            "Scored crop series"
        );

        Ok((ScoredSeries { scores, contributions }, comparators))
    }

    fn n2o_terms(&self, crop: Crop) -> N2oTerms {
        let gwp = self.constants.gwp_n2o_n();
        let factors = CropEmissionFactors::for_crop(crop, self.constants);

        N2oTerms {
            feedstock_gwp: factors.n2o_factor * gwp,
            biomass: factors.residue_n_factor * factors.biomass_n2o_factor * gwp,
        }
    }

    fn n2o_comparators(&self, crop: Crop, m: &IntermediateMetrics, ctx: &CropSideContext<'_>) -> N2oComparators {
        let c = self.constants;
        let policy = ctx.policy;
        let terms = self.n2o_terms(crop);
        let total_n = m.nitrogen.total();

        let business_as_usual = total_n * terms.feedstock_gwp + terms.biomass;
        let enhanced_efficiency = total_n
            * (ENHANCED_EFFICIENCY_DIRECT_SHARE * c.n2o_factor_corn_direct + c.n2o_factor_corn_indirect)
            * c.gwp_n2o_n()
            + terms.biomass;

        let scenario = policy.n2o_scenario();
        let chosen = match scenario {
            N2oScenario::NonCorn | N2oScenario::CornBusinessAsUsual | N2oScenario::CornFourROtherRate => {
                business_as_usual
            }
            N2oScenario::CornFourRDefaultRate => {
                ctx.baseline_total_n * (1.0 - DEFAULT_4R_REDUCTION) * terms.feedstock_gwp + terms.biomass
            }
            N2oScenario::CornFourRUserRate => {
                ctx.baseline_total_n * (1.0 - policy.user_reduction) * terms.feedstock_gwp + terms.biomass
            }
            N2oScenario::CornEnhancedEfficiency => enhanced_efficiency,
        };

        N2oComparators {
            scenario,
            nitrogen_management: policy.management_label.clone(),
            fertilizer_rate_type: policy.rate_type_label.clone(),
            total_n,
            chosen,
            business_as_usual,
            enhanced_efficiency,
        }
    }

    fn contributions(
        &self,
        crop: Crop,
        m: &IntermediateMetrics,
        fert: &FertilizerIntensities,
        reduction: f64,
        n2o_emission: f64,
    ) -> CategoryContributions {
        let c = self.constants;
        let kept = 1.0 - reduction;
        // g GHG per g of N delivered by a product
        let per_n = |ci: f64, n_content: f64| ci / c.g_per_ton / n_content * kept;

        let mut diesel_btu = m.energy.diesel;
        if m.cover_crop_present {
            diesel_btu += m.cover_crop_energy;
        }
        if m.manure_present {
            diesel_btu += m.manure_application_energy + m.manure_transport_energy;
        }

        let cover_crop_herbicide = if crop == Crop::Corn && m.cover_crop_present {
            m.cover_crop_herbicide * c.corn_herbicide_production_ghg
        } else {
            0.0
        };

        let n = &m.nitrogen;
        CategoryContributions {
            diesel: diesel_btu * c.diesel_ci,
            gasoline: m.energy.gasoline * c.gasoline_ci,
            natural_gas: m.energy.natural_gas * c.natural_gas_ci,
            lpg: m.energy.lpg * c.lpg_ci,
            electricity: m.energy.electricity * c.electricity_ci,

            ammonia: n.ammonia * per_n(fert.ammonia, c.ammonia_n_content),
            urea: n.urea * per_n(fert.urea, c.urea_n_content),
            ammonium_nitrate: n.ammonium_nitrate * per_n(fert.ammonium_nitrate, c.ammonium_nitrate_n_content),
            ammonium_sulfate: n.ammonium_sulfate * per_n(fert.ammonium_sulfate, c.ammonium_sulfate_n_content),
            uan: n.uan * per_n(fert.uan, c.uan_n_content),
            map: n.map * per_n(fert.map, c.map_n_content) * c.map_share_as_n_fertilizer,
            dap: n.dap * per_n(fert.dap, c.dap_n_content) * c.dap_share_as_n_fertilizer,

            map_p2o5: m.map_p2o5 / c.map_p2o5_content * fert.map / c.g_per_ton
                * (1.0 - c.map_share_as_n_fertilizer),
            dap_p2o5: m.dap_p2o5 / c.dap_p2o5_content * fert.dap / c.g_per_ton
                * (1.0 - c.dap_share_as_n_fertilizer),
            potash: m.k2o * c.potash_ci / c.g_per_ton,
            limestone: m.caco3 * c.limestone_ci / c.g_per_ton,
            herbicide: m.herbicide * c.herbicide_ci + cover_crop_herbicide,
            insecticide: m.insecticide * c.insecticide_ci,

            n2o_emission,
            co2_urea: n.urea * c.urea_n_to_co2
                + n.uan * c.urea_share_in_uan * c.urea_n * c.urea_n_to_co2 * kept,
            co2_caco3: m.caco3 * c.caco3_co2_content * c.caco3_acidification_share,
            soybean_fixation: 0.0,
            ch4: 0.0,
        }
    }
}

fn check_finite(scores: &ScoreSet) -> Result<(), ScoringError> {
    for entry in scores.entries() {
        if let ScoreValue::Number(v) = entry.value {
            ensure_finite(v, &entry.name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ManagementInputs;
    use crate::inputs::{ChemicalInputs, CoverCropInputs, EnergyInputs, FertilizerInputs};
    use crate::intermediates::SeriesInputs;
    use crate::reference::ReferenceDataStore;
    use crate::test_support::fixture_store;
    use approx::assert_relative_eq;

    fn metrics(store: &ReferenceDataStore, series: Series, cover: Option<CoverCropInputs>) -> IntermediateMetrics {
        let inputs = SeriesInputs {
            series,
            yield_bu_per_acre: 180.0,
            energy: EnergyInputs { diesel_gal: 5.0, electricity_kwh: 30.0, ..Default::default() },
            fertilizer: FertilizerInputs {
                ammonia_lbs: 80.0,
                urea_lbs: 20.0,
                uan_lbs: 40.0,
                map_lbs: 10.0,
                map_p2o5_lbs: 30.0,
                k2o_lbs: 50.0,
                caco3_lbs: 300.0,
                ..Default::default()
            },
            chemicals: ChemicalInputs { herbicide_g: 1_000.0, insecticide_g: 20.0 },
            cover_crop: cover,
            manure: None,
        };
        IntermediateMetrics::derive(&inputs, store.constants()).unwrap()
    }

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

    fn context(policy: &NitrogenPolicy, baseline_total_n: f64) -> CropSideContext<'_> {
        CropSideContext {
            policy,
            baseline_total_n,
            crop_area: 100.0,
            average_crop_price: 4.5,
        }
    }

    #[test]
    fn test_total_is_sum_of_buckets() {
        let store = fixture_store();
        let engine = CiScoringEngine::new(store.constants());
        let m = metrics(&store, Series::Default, None);
        let scored = engine.score_default(Crop::Corn, &m, AmmoniaSource::Conventional, 0.0).unwrap();
        let s = &scored.scores;

        let buckets = [names::ENERGY, names::NITROGEN_FERTILIZER, names::N2O, names::CO2, names::OTHER_CHEMICALS]
            .iter()
            .map(|n| s.number(n).unwrap())
            .sum::<f64>()
            + scored.contributions.ch4;
        assert_relative_eq!(s.number(names::TOTAL).unwrap(), buckets, epsilon = 1e-9);
        assert_eq!(s.entries().last().unwrap().cell, "K32");
        assert_relative_eq!(scored.contributions.ch4, 0.0);
        assert_relative_eq!(scored.contributions.soybean_fixation, 0.0);
    }

    #[test]
    fn test_green_ammonia_uses_green_table() {
        let store = fixture_store();
        let c = store.constants();
        let engine = CiScoringEngine::new(c);
        let m = metrics(&store, Series::Default, None);

        let conventional = engine.score_default(Crop::Corn, &m, AmmoniaSource::Conventional, 0.0).unwrap();
        let green = engine.score_default(Crop::Corn, &m, AmmoniaSource::Green, 0.0).unwrap();

        assert_relative_eq!(
            conventional.contributions.ammonia / green.contributions.ammonia,
            c.conventional_ammonia_ci / c.green_ammonia_ci,
            epsilon = 1e-9
        );
        assert_relative_eq!(conventional.contributions.potash, green.contributions.potash);
    }

    #[test]
    fn test_four_r_default_reduces_fertilizer_and_n2o() {
        let store = fixture_store();
        let c = store.constants();
        let engine = CiScoringEngine::new(c);
        let m = metrics(&store, Series::Crop, None);
        let baseline_n = 100.0;

        let bau_policy = policy(Crop::Corn, "Business as usual", "Default", 0.0);
        let four_r_policy = policy(Crop::Corn, "4R", "Default", 0.0);
        let (bau, _) = engine.score_crop(Crop::Corn, &m, &context(&bau_policy, baseline_n)).unwrap();
        let (four_r, comparators) = engine.score_crop(Crop::Corn, &m, &context(&four_r_policy, baseline_n)).unwrap();

        assert_relative_eq!(four_r.contributions.ammonia, bau.contributions.ammonia * 0.86, epsilon = 1e-9);
        assert_relative_eq!(four_r.contributions.potash, bau.contributions.potash);

        assert_eq!(comparators.scenario, N2oScenario::CornFourRDefaultRate);
        let factors = CropEmissionFactors::for_crop(Crop::Corn, c);
        let biomass = factors.residue_n_factor * factors.biomass_n2o_factor * c.gwp_n2o_n();
        assert_relative_eq!(
            comparators.chosen,
            baseline_n * 0.86 * factors.n2o_factor * c.gwp_n2o_n() + biomass,
            epsilon = 1e-9
        );
        assert_relative_eq!(comparators.business_as_usual, bau.contributions.n2o_emission, epsilon = 1e-9);
        assert_eq!(
            four_r.scores.lookup(names::N2O_SCENARIO),
            Some(&ScoreValue::Text("scenario 3: Corn, N-management 4R, fert rate Default".to_string()))
        );
    }

    #[test]
    fn test_enhanced_efficiency_branch() {
        let store = fixture_store();
        let c = store.constants();
        let engine = CiScoringEngine::new(c);
        let m = metrics(&store, Series::Crop, None);
        let ee_policy = policy(Crop::Corn, "Enhanced Efficiency Fertilizer", "Default", 0.0);
        let (scored, comparators) = engine.score_crop(Crop::Corn, &m, &context(&ee_policy, 0.0)).unwrap();

        assert_eq!(comparators.scenario, N2oScenario::CornEnhancedEfficiency);
        assert_relative_eq!(comparators.chosen, comparators.enhanced_efficiency);
        assert_relative_eq!(scored.contributions.n2o_emission, comparators.enhanced_efficiency);
        // no reduction outside 4R
        let bau_policy = policy(Crop::Corn, "Business as usual", "Default", 0.0);
        let (bau, _) = engine.score_crop(Crop::Corn, &m, &context(&bau_policy, 0.0)).unwrap();
        assert_relative_eq!(scored.contributions.nitrogen_fertilizer(), bau.contributions.nitrogen_fertilizer());
    }

    #[test]
    fn test_soybean_ignores_four_r() {
        let store = fixture_store();
        let engine = CiScoringEngine::new(store.constants());
        let m = metrics(&store, Series::Crop, None);
        let p = policy(Crop::Soybean, "4R", "Default", 0.0);
        let (scored, comparators) = engine.score_crop(Crop::Soybean, &m, &context(&p, 500.0)).unwrap();

        assert_eq!(comparators.scenario, N2oScenario::NonCorn);
        assert_relative_eq!(comparators.chosen, comparators.business_as_usual);
        assert_relative_eq!(scored.scores.number(names::BUSHELS).unwrap(), 18_000.0);
        assert_relative_eq!(scored.scores.number(names::CROP_VALUE).unwrap(), 81_000.0);
    }

    #[test]
    fn test_cover_crop_adds_diesel_and_corn_herbicide() {
        let store = fixture_store();
        let c = store.constants();
        let engine = CiScoringEngine::new(c);
        let cover = CoverCropInputs { energy_btu: 36_000.0, herbicide_g: 360.0, yield_tons: 1.0 };
        let bare = metrics(&store, Series::Default, None);
        let covered = metrics(&store, Series::Default, Some(cover));

        let corn_bare = engine.score_default(Crop::Corn, &bare, AmmoniaSource::Conventional, 0.0).unwrap();
        let corn_cover = engine.score_default(Crop::Corn, &covered, AmmoniaSource::Conventional, 0.0).unwrap();
        let sorghum_cover = engine.score_default(Crop::Sorghum, &covered, AmmoniaSource::Conventional, 0.0).unwrap();
        let sorghum_bare = engine.score_default(Crop::Sorghum, &bare, AmmoniaSource::Conventional, 0.0).unwrap();

        assert_relative_eq!(
            corn_cover.contributions.diesel - corn_bare.contributions.diesel,
            200.0 * c.diesel_ci,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            corn_cover.contributions.herbicide - corn_bare.contributions.herbicide,
            2.0 * c.corn_herbicide_production_ghg,
            epsilon = 1e-9
        );
        assert_relative_eq!(sorghum_cover.contributions.herbicide, sorghum_bare.contributions.herbicide);
        assert!(corn_cover.contributions.n2o_emission > corn_bare.contributions.n2o_emission);
        assert_relative_eq!(sorghum_cover.contributions.n2o_emission, sorghum_bare.contributions.n2o_emission);
    }

    #[test]
    fn test_manure_n2o_on_default_series_only() {
        let store = fixture_store();
        let c = store.constants();
        let engine = CiScoringEngine::new(c);
        let bare = metrics(&store, Series::Default, None);
        let mut manured = bare.clone();
        manured.manure_present = true;

        let without = engine.score_default(Crop::Soybean, &bare, AmmoniaSource::Conventional, 0.0).unwrap();
        let with = engine.score_default(Crop::Soybean, &manured, AmmoniaSource::Conventional, 3.0).unwrap();
        // 3 tons/acre × 0.01 × 298
        assert_relative_eq!(
            with.contributions.n2o_emission - without.contributions.n2o_emission,
            8.94,
            epsilon = 1e-9
        );

        let crop_bare = metrics(&store, Series::Crop, None);
        let mut crop_manured = crop_bare.clone();
        crop_manured.manure_present = true;
        crop_manured.cover_crop_present = true;
        crop_manured.cover_crop_n = 500.0;
        let p = policy(Crop::Corn, "Business as usual", "Default", 0.0);
        let (a, bau_a) = engine.score_crop(Crop::Corn, &crop_bare, &context(&p, 0.0)).unwrap();
        let (b, bau_b) = engine.score_crop(Crop::Corn, &crop_manured, &context(&p, 0.0)).unwrap();
        assert_relative_eq!(a.contributions.n2o_emission, b.contributions.n2o_emission);
        assert_relative_eq!(bau_a.enhanced_efficiency, bau_b.enhanced_efficiency);
    }
}

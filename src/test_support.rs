//! Small in-memory reference tables and sample batches for tests and benches

use crate::reference::{FipsCode, ReferenceDataStore, ReferenceSources};
use serde_json::{json, Value};

pub const STORY_COUNTY_FIPS: FipsCode = 19169;
/// Corn, no cover crop, no manure, no-till
pub const STORY_COUNTY_CORN_NNN_SOC: f64 = -0.0853;

pub fn reference_constants_csv() -> String {
    let rows: &[(&str, f64, &str)] = &[
        ("Diesel_BTU2gal", 128_450.0, "BTU per gallon diesel"),
        ("Gasoline_BTU2gal", 116_090.0, "BTU per gallon gasoline"),
        ("Natural_gas_BTU2ft3", 983.0, "BTU per cubic foot natural gas"),
        ("LPG_BTU2gal", 84_950.0, "BTU per gallon LPG"),
        ("Electricity_BTU2kWh", 3_412.0, "BTU per kWh"),
        ("g_to_lb", 453.59237, "grams per pound"),
        ("ton2g", 907_184.74, "grams per short ton"),
        ("kg2g", 1_000.0, "grams per kilogram"),
        ("acre2hectare", 2.47105, "acres per hectare"),
        ("CO2_C_to_CO2", 3.6667, "CO2 per unit carbon"),
        ("N2O_N_To_N2O", 1.5714, "N2O per unit N2O-N"),
        ("N2O_GWP", 298.0, "100-year GWP of N2O"),
        ("Diesel_CI", 0.0946, "g GHG per BTU"),
        ("Gasoline_CI", 0.0922, "g GHG per BTU"),
        ("NaturalGas_CI", 0.0652, "g GHG per BTU"),
        ("LPG_CI", 0.0716, "g GHG per BTU"),
        ("Electricity_CI", 0.1340, "g GHG per BTU"),
        ("ConventionalAmmonia_CI", 2_420_000.0, "g GHG per ton"),
        ("ConventionalUrea_CI", 1_730_000.0, "g GHG per ton"),
        ("ConventionalAmmoniumNitrate_CI", 2_900_000.0, "g GHG per ton"),
        ("ConventionalAmmoniumSulfate_CI", 1_000_000.0, "g GHG per ton"),
        ("ConventionalUAN_CI", 1_800_000.0, "g GHG per ton"),
        ("ConventionalMAP_CI", 1_200_000.0, "g GHG per ton"),
        ("ConventionalDAP_CI", 1_300_000.0, "g GHG per ton"),
        ("GreenAmmonia_CI", 480_000.0, "g GHG per ton"),
        ("GreenUrea_CI", 700_000.0, "g GHG per ton"),
        ("GreenAmmoniumNitrate_CI", 900_000.0, "g GHG per ton"),
        ("GreenAmmoniumSulfate_CI", 300_000.0, "g GHG per ton"),
        ("GreenUAN_CI", 500_000.0, "g GHG per ton"),
        ("GreenMAP_CI", 400_000.0, "g GHG per ton"),
        ("GreenDAP_CI", 450_000.0, "g GHG per ton"),
        ("Ammonia_N_Content", 0.82, "N share"),
        ("Urea_N_Content", 0.46, "N share"),
        ("AmmoniumNitrate_N_Content", 0.35, "N share"),
        ("AmmoniumSulfate_N_Content", 0.21, "N share"),
        ("UAN_N_Content", 0.30, "N share"),
        ("MAP_N_Content", 0.11, "N share"),
        ("DAP_N_Content", 0.18, "N share"),
        ("MAP_share_as_Nfert", 0.2, "MAP burden allocated to N"),
        ("DAP_share_as_Nfert", 0.3, "DAP burden allocated to N"),
        ("MAP_P2O5_Content", 0.52, "P2O5 share"),
        ("DAP_P2O5_Content", 0.46, "P2O5 share"),
        ("ConventionalPotash_CI", 640_000.0, "g GHG per ton"),
        ("ConventionalLimestone_CI", 10_000.0, "g GHG per ton"),
        ("Herbicide_CI", 25.29087007, "g GHG per g"),
        ("Insecticide_CI", 29.0, "g GHG per g"),
        ("ProductionEmissions_CornHerbicide_GHG", 22.0, "g GHG per g"),
        ("N2O_Factor_US_Corn", 0.01525, "N2O-N per N"),
        ("N2O_Factor_US_Soybean", 0.0122, "N2O-N per N"),
        ("N2O_Factor_US_Sorghum", 0.0131, "N2O-N per N"),
        ("N2O_Factor_US_Rice", 0.0094, "N2O-N per N"),
        ("N2O_Factor_US_Corn_Direct", 0.01, "direct N2O-N per N"),
        ("N2O_Factor_US_Corn_Indirect", 0.00525, "indirect N2O-N per N"),
        ("Corn_Ninbiomass_ResidueFactor", 0.35, "g N per bushel"),
        ("Soybean_Ninbiomass_ResidueFactor", 0.45, "g N per bushel"),
        ("Sorghum_Ninbiomass_ResidueFactor", 0.25, "g N per bushel"),
        ("Rice_Ninbiomass_ResidueFactor", 0.15, "g N per bushel"),
        ("Rye_Ninbiomass_ResidueFactor", 9_000.0, "g N per ton rye"),
        ("Corn_Biomass_N2O_Factor", 0.01, "N2O-N per residue N"),
        ("Soybean_Biomass_N2O_Factor", 0.01, "N2O-N per residue N"),
        ("Sorghum_Biomass_N2O_Factor", 0.01, "N2O-N per residue N"),
        ("Rice_Biomass_N2O_Factor", 0.01, "N2O-N per residue N"),
        ("coverCrop_N2O_Emissions", 0.01, "N2O-N per cover crop N"),
        ("Manure_N2O_factor", 0.01, "N2O-N per manure N"),
        ("Urea_N_to_CO2", 1.5714, "CO2 per urea N"),
        ("UreaProductionUsage_In_UAN", 0.5, "urea share in UAN"),
        ("Urea_N", 0.46, "N share of urea"),
        ("CaCO3_CO2_Content", 0.44, "CO2 per CaCO3"),
        ("CaCO3_PercentAcidification", 0.49, "share released"),
    ];

    let mut csv = String::from("name,value,description\n");
    for (name, value, description) in rows {
        csv.push_str(&format!("{},{},{}\n", name, value, description));
    }
    csv
}

/// Corn, Soybean and Sorghum columns; no Rice column
pub fn greet_defaults_csv() -> String {
    "Var_Name,Corn,Soybean,Sorghum
default_Yield,180.3,51.5,70.0
default_Diesel_Gal,6.3,4.3,5.5
default_Gasoline_Gal,1.2,1.0,0.8
default_NaturalGas_Gal,30,10,20
default_LPG_Ft3,1.4,0.2,0.6
default_Electricity_kWh,40,15,30
default_Ammonia_Lbs,70,,40
default_Urea_Lbs,25,2,15
default_AmmoniumNitrate_Lbs,1.5,0.2,1
default_AmmoniumSulfate_Lbs,3,0.5,2
default_UAN_Lbs,45,1.5,20
default_MAP_Lbs,5,2,3
default_DAP_Lbs,6,2.5,3
default_MAP_P2O5_Lbs_N,20,12,10
default_DAP_P2O5_Lbs_N,25,14,10
default_K2O_Lbs_N,55,70,20
default_CaCO3_Lbs_N,420,400,300
default_Herbicide_g_Acre,1100,1200,900
default_Insecticide_g_Acre,20,5,10
"
    .to_string()
}

pub fn corn_soc_csv() -> String {
    "FIPS,NNC,NNR,NNN,CNC,CNR,CNN,NMC,NMR,NMN,CMC,CMR,CMN
19169,0.0412,-0.0211,-0.0853,-0.1020,-0.1433,-0.2011,-0.0650,-0.1012,-0.1544,,-0.2210,-0.2870
1001.0,0.0310,-0.0150,-0.0702,-0.0911,-0.1210,-0.1802,-0.0555,-0.0890,-0.1320,-0.1501,-0.1950,-0.2533
"
    .to_string()
}

pub fn soybean_soc_csv() -> String {
    "FIPS,NNC,NNR,NNN,CNC,CNR,CNN,NMC,NMR,NMN,CMC,CMR,CMN
19169,0.0520,0.0103,-0.0311,-0.0702,-0.0944,-0.1305,-0.0301,-0.0655,-0.0980,-0.1102,-0.1421,-0.1788
"
    .to_string()
}

pub fn national_county_txt() -> String {
    "AL,01,001,Autauga County,H1
AL,01,003,Baldwin County,H1
IA,19,153,Polk County,H1
IA,19,169,Story County,H1
IL,17,113,McLean County,H1
"
    .to_string()
}

pub fn fixture_sources() -> ReferenceSources {
    ReferenceSources {
        constants_csv: reference_constants_csv().into_bytes(),
        greet_defaults_csv: greet_defaults_csv().into_bytes(),
        corn_soc_csv: corn_soc_csv().into_bytes(),
        soybean_soc_csv: soybean_soc_csv().into_bytes(),
        national_county_txt: national_county_txt().into_bytes(),
    }
}

pub fn fixture_store() -> ReferenceDataStore {
    ReferenceDataStore::from_sources(fixture_sources()).expect("fixture reference data loads")
}

/// A Story County, Iowa planting with typical inputs
pub fn sample_feature(planting_id: &str, crop: &str) -> Value {
    json!({
        "type": "Feature",
        "bbox": [42.01, -93.62, 42.03, -93.60],
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[-93.62, 42.01], [-93.60, 42.01], [-93.60, 42.03], [-93.62, 42.03], [-93.62, 42.01]]]
        },
        "properties": {
            "BusinessId": "B-100",
            "Farm Name": "Prairie Acres",
            "FarmId": "F-1",
            "FieldId": "FLD-7",
            "PlantingId": planting_id,
            "Crop": crop,
            "State": "Iowa",
            "County": "Story",
            "Farm Size": 640,
            "Crop Area": 120,
            "Yield": 195,
            "Average Crop Price": 4.35,
            "Diesel": 5.8,
            "Gasoline": 0.9,
            "Electricity": 32,
            "Ammonia": 110,
            "Urea": 20,
            "Urea-ammonium Nitrate Solution": 30,
            "Monoammonium Phosphate P2O5": 25,
            "Potash K2O": 60,
            "Limestone CaCO3": 350,
            "Herbicide": 1050,
            "Insecticide": 15,
            "Tillage": "No till",
            "Cover Crop Used": "No cover crop",
            "Ammonia Source": "Conventional",
            "Nitrogen Management": "Business as usual",
            "Fertilizer Rate Type": "Default",
            "Reduction In Fertilizer": 0
        }
    })
}

pub fn sample_batch(features: Vec<Value>, generate_certificates: bool, certificate_type: &str) -> Value {
    json!({
        "Season": "2024",
        "Certificate Type": certificate_type,
        "Data Provider": "agCommander",
        "CollectionId": "COL-2024-001",
        "Generate Certificates": if generate_certificates { "Yes" } else { "No" },
        "Attested By 1": "Field Agronomist",
        "Signature 1": "sig-1",
        "Attested DateTime 1": "2024-11-02 10:00:00",
        "GeoJSON": {"type": "FeatureCollection", "features": features}
    })
}

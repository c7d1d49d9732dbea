//! County FIPS index and state abbreviations
//!
//! `national_county.txt` (Census Bureau) has no header:
//! `ST,SSFIPS,CCCFIPS,County Name,Class`. The FIPS code is state + county
//! digits held as an integer, so leading zeros are dropped (`01001` → 1001).

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

pub type FipsCode = u32;

pub const UNKNOWN_STATE: &str = "Unknown State";

const STATES: [(&str, &str); 50] = [
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

/// Two-letter abbreviation for a state name, or `"Unknown State"`.
///
/// Names match case-insensitively; an input that already is an abbreviation
/// is returned as is.
pub fn state_abbreviation(name: &str) -> &'static str {
    let name = name.trim();
    STATES
        .iter()
        .find(|(full, abbr)| full.eq_ignore_ascii_case(name) || abbr.eq_ignore_ascii_case(name))
        .map(|(_, abbr)| *abbr)
        .unwrap_or(UNKNOWN_STATE)
}

#[derive(Debug, Default)]
pub struct LocationIndex {
    /// (state abbr, lowercase county name) → FIPS
    by_county: FxHashMap<(String, String), FipsCode>,
    /// FIPS → (state abbr, county name as published)
    by_fips: FxHashMap<FipsCode, (String, String)>,
}

impl LocationIndex {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns = df.get_columns();
        if columns.len() < 4 {
            anyhow::bail!("Expected at least 4 columns, found {}", columns.len());
        }
        let text = move |i: usize| {
            columns[i]
                .str()
                .with_context(|| format!("County column {} is not string type", i + 1))
        };
        let states = text(0)?;
        let state_fips = text(1)?;
        let county_fips = text(2)?;
        let names = text(3)?;

        let mut index = LocationIndex::default();
        for idx in 0..df.height() {
            let (Some(st), Some(sf), Some(cf), Some(name)) = (
                states.get(idx),
                state_fips.get(idx),
                county_fips.get(idx),
                names.get(idx),
            ) else {
                continue;
            };
            let full = format!("{}{}", sf.trim(), cf.trim());
            let Ok(fips) = full.parse::<FipsCode>() else {
                tracing::debug!("Skipping county row with FIPS '{}'", full);
                continue;
            };
            index.insert(st.trim(), name.trim(), fips);
        }
        Ok(index)
    }

    fn insert(&mut self, state: &str, county: &str, fips: FipsCode) {
        self.by_county
            .insert((state.to_uppercase(), county.to_lowercase()), fips);
        self.by_fips
            .insert(fips, (state.to_string(), county.to_string()));
    }

    /// Exact county lookup, case-insensitive. `county` includes the "County" suffix.
    pub fn fips(&self, state_abbr: &str, county: &str) -> Option<FipsCode> {
        self.by_county
            .get(&(state_abbr.trim().to_uppercase(), county.trim().to_lowercase()))
            .copied()
    }

    pub fn location(&self, fips: FipsCode) -> Option<(&str, &str)> {
        self.by_fips
            .get(&fips)
            .map(|(state, county)| (state.as_str(), county.as_str()))
    }

    /// County names in a state, sorted
    pub fn counties_in(&self, state_abbr: &str) -> Vec<&str> {
        let state = state_abbr.trim().to_uppercase();
        let mut counties: Vec<&str> = self
            .by_fips
            .values()
            .filter(|(st, _)| st.eq_ignore_ascii_case(&state))
            .map(|(_, county)| county.as_str())
            .collect();
        counties.sort_unstable();
        counties
    }

    pub fn len(&self) -> usize {
        self.by_fips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::read_csv_bytes;

    #[test]
    fn test_state_abbreviation() {
        assert_eq!(state_abbreviation("Iowa"), "IA");
        assert_eq!(state_abbreviation("new york"), "NY");
        assert_eq!(state_abbreviation("IL"), "IL");
        assert_eq!(state_abbreviation("Atlantis"), UNKNOWN_STATE);
    }

    #[test]
    fn test_leading_zeros_dropped() {
        let txt = "AL,01,001,Autauga County,H1\nAL,01,003,Baldwin County,H1\n";
        let df = read_csv_bytes(txt.as_bytes().to_vec(), false).unwrap();
        let index = LocationIndex::from_frame(&df).unwrap();

        assert_eq!(index.fips("AL", "Autauga County"), Some(1001));
        assert_eq!(index.fips("al", "autauga county"), Some(1001));
        assert_eq!(index.fips("AL", "Autauga"), None);
        assert_eq!(index.location(1003), Some(("AL", "Baldwin County")));
        assert_eq!(index.counties_in("AL"), vec!["Autauga County", "Baldwin County"]);
    }
}

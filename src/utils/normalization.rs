//! Normalization Utilities
//!
//! Input labels arrive with inconsistent casing and suffixes; these helpers
//! bring them to the forms the reference tables and scoring branches expect.

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Case-insensitive prefix test, ignoring surrounding whitespace
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.trim().to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Ensure a county name ends with the word "County"
///
/// "Story" → "Story County"; "Story County" and "story county" are kept.
pub fn normalize_county_name(county: &str) -> String {
    let trimmed = county.trim();
    if trimmed.to_lowercase().ends_with("county") {
        trimmed.to_string()
    } else {
        format!("{} County", trimmed)
    }
}

/// "Yes" / "True" (any case) are true, anything else false
pub fn parse_flag(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "yes" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_to() {
        assert_relative_eq!(round_to(1.23456, 2), 1.23);
        assert_relative_eq!(round_to(-93.456789, 5), -93.45679);
        assert_relative_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_county_suffix() {
        assert_eq!(normalize_county_name("Story"), "Story County");
        assert_eq!(normalize_county_name(" Story County "), "Story County");
        assert_eq!(normalize_county_name("story county"), "story county");
    }

    #[test]
    fn test_flags_and_prefixes() {
        assert!(parse_flag("Yes"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("No"));
        assert!(!parse_flag(""));
        assert!(starts_with_ignore_case("  No cover crop", "no cover crop"));
        assert!(!starts_with_ignore_case("Cover crop", "no cover crop"));
    }
}

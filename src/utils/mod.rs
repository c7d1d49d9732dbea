//! Utility modules for CI scoring
//!
//! - Normalization: label matching, county names, flags, presentation rounding

pub mod normalization;

pub use normalization::{normalize_county_name, parse_flag, round_to, starts_with_ignore_case};

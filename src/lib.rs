//! Carbon Intensity Scorer Rust Implementation
//!
//! Scores agricultural plantings (GeoJSON features) against GREET reference
//! data and produces a results collection plus optional certificates.
//!
//! Module layout:
//! - `reference/`: Reference tables loaded with Polars (constants, crop defaults, SOC, FIPS)
//! - `feature`, `geometry`: Input parsing and bbox normalization
//! - `intermediates`: Per-bushel quantities for the crop and default series
//! - `scoring/`: CI category contributions, nitrogen scenarios, SOC adjustment
//! - `aggregate`, `certificate`, `collection`: Batch output assembly
//! - `calculator`: Sequential and Rayon-parallel batch entry points

pub mod aggregate;
pub mod calculator;
pub mod certificate;
pub mod collection;
pub mod config;
pub mod crop;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod inputs;
pub mod intermediates;
pub mod reference;
pub mod scoring;
pub mod utils;

#[cfg(feature = "api")]
pub mod api_server;

#[doc(hidden)]
pub mod test_support;

// Re-export commonly used types
pub use aggregate::{FeatureScore, FeatureScoreAggregator, RecordOutcome, RejectedRecord, ScoredBatch};
pub use calculator::{CalculationOutput, CiCalculator};
pub use certificate::{Certificate, CertificateAssembler};
pub use collection::{CollectionAssembler, ResultsCollection};
pub use config::AppConfig;
pub use crop::Crop;
pub use error::ScoringError;
pub use feature::{BatchRequest, FarmRecord, FileAttributes};
pub use reference::{ReferenceDataStore, ReferenceSources};
pub use scoring::{CiScoringEngine, ScoreSet, ScoreValue, Series};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};

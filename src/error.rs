//! Scoring error taxonomy
//!
//! Record-level errors reject a single feature and the batch continues.
//! `LengthMismatch` is the only batch-fatal variant.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Crop label outside Corn / Soybean / Sorghum / Rice
    #[error("unknown crop '{label}'")]
    UnknownCrop { label: String },

    /// Produced score count differs from the input feature count
    #[error("length mismatch: {scores} scored outcomes for {features} input features")]
    LengthMismatch { scores: usize, features: usize },

    #[error("missing reference data: {what}")]
    MissingReferenceData { what: String },

    /// Absorbed by the caller: the record keeps an empty centroid
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Division by a zero yield or any other non-finite intermediate
    #[error("non-finite result in {category}")]
    Arithmetic { category: String },

    /// Absorbed by the caller: the SOC component becomes "No SOC Results"
    #[error("SOC lookup failed: {reason}")]
    SocLookup { reason: String },

    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}

impl ScoringError {
    /// Short machine-readable tag used in rejected-record listings
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::UnknownCrop { .. } => "UnknownCrop",
            ScoringError::LengthMismatch { .. } => "LengthMismatch",
            ScoringError::MissingReferenceData { .. } => "MissingReferenceData",
            ScoringError::InvalidGeometry { .. } => "InvalidGeometry",
            ScoringError::Arithmetic { .. } => "Arithmetic",
            ScoringError::SocLookup { .. } => "SocLookup",
            ScoringError::InvalidRecord { .. } => "InvalidRecord",
        }
    }

    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, ScoringError::LengthMismatch { .. })
    }

    pub(crate) fn arithmetic(category: impl Into<String>) -> Self {
        ScoringError::Arithmetic { category: category.into() }
    }
}

/// Fail with `Arithmetic` when `value` is NaN or infinite
pub(crate) fn ensure_finite(value: f64, category: &str) -> Result<f64, ScoringError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoringError::arithmetic(category))
    }
}

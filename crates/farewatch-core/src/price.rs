//! Price extraction from fare-calendar labels.
//!
//! Labels look like `"Standard seat - Fri, Aug 2, 2024 - priceC$810.67"`.
//! The third `" - "` segment either carries a price or a "no seats" message.

use farewatch_types::Price;

/// Separator between label segments.
const SEGMENT_SEPARATOR: &str = " - ";

/// Marker that distinguishes a priced segment from an availability message.
const PRICE_MARKER: &str = "price";

/// Currency token the fare calendar puts in front of the amount.
pub const DEFAULT_CURRENCY_PREFIX: &str = "C$";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("label has {found} segment(s), expected at least 3: {label:?}")]
    TooFewSegments { label: String, found: usize },

    #[error("priced segment {segment:?} does not carry the {prefix:?} currency prefix")]
    MissingCurrencyPrefix { segment: String, prefix: String },

    #[error("priced segment {segment:?} has an invalid amount")]
    InvalidAmount { segment: String },
}

/// Turns raw labels into normalized prices for one currency prefix.
#[derive(Debug, Clone)]
pub struct PriceExtractor {
    currency_prefix: String,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_PREFIX)
    }
}

impl PriceExtractor {
    pub fn new(currency_prefix: impl Into<String>) -> Self {
        Self {
            currency_prefix: currency_prefix.into(),
        }
    }

    /// Returns `Ok(Some(price))` for a priced label, `Ok(None)` when the label
    /// reports no availability, and an error when the label is malformed.
    pub fn extract(&self, label: &str) -> Result<Option<Price>, ExtractError> {
        let segments: Vec<&str> = label.split(SEGMENT_SEPARATOR).collect();
        if segments.len() < 3 {
            return Err(ExtractError::TooFewSegments {
                label: label.to_string(),
                found: segments.len(),
            });
        }

        let segment = segments[2];
        let Some(marker_at) = segment.find(PRICE_MARKER) else {
            return Ok(None);
        };

        let after_marker = segment[marker_at + PRICE_MARKER.len()..].trim_start();
        let amount = after_marker
            .strip_prefix(self.currency_prefix.as_str())
            .ok_or_else(|| ExtractError::MissingCurrencyPrefix {
                segment: segment.to_string(),
                prefix: self.currency_prefix.clone(),
            })?;

        let normalized: String = amount.trim().chars().filter(|c| *c != ',').collect();
        normalized
            .parse::<Price>()
            .map(Some)
            .map_err(|_| ExtractError::InvalidAmount {
                segment: segment.to_string(),
            })
    }
}

/// Extracts with the default `C$` prefix.
pub fn extract_price(label: &str) -> Result<Option<Price>, ExtractError> {
    PriceExtractor::default().extract(label)
}

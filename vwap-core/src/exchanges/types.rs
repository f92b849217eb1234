//! Market data types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset symbol, always stored lower-cased
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    pub const USD: &'static str = "usd";

    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_lowercase())
    }

    pub fn usd() -> Self {
        Self(Self::USD.to_string())
    }

    pub fn is_usd(&self) -> bool {
        self.0 == Self::USD
    }

    pub fn validate(&self) -> bool {
        !self.0.is_empty() && self.0.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reference catalog entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub base_asset: String,
    pub quote_asset: String,
}

impl Instrument {
    pub fn new(base_asset: impl Into<String>, quote_asset: impl Into<String>) -> Self {
        Self {
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
        }
    }

    /// Case-insensitive match on the base asset
    pub fn is_base(&self, base: &Asset) -> bool {
        Asset::new(&self.base_asset) == *base
    }
}

/// Most recent spot trade for one base/quote pair.
///
/// `quote_asset` is the provenance tag the normalizer keys on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeObservation {
    pub base_asset: Asset,
    pub quote_asset: Asset,
    pub price: Decimal,
    pub volume: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TradeObservation {
    pub fn new(base_asset: Asset, quote_asset: Asset, price: Decimal, volume: Decimal) -> Self {
        Self {
            base_asset,
            quote_asset,
            price,
            volume,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Per-call options for an outbound lookup.
///
/// Built fresh for every call from the read-only configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
    pub api_key: String,
    pub interval: String,
    pub limit: u32,
}

impl RequestOptions {
    pub const API_KEY_HEADER: &'static str = "X-Api-Key";

    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [("interval", self.interval.clone()), ("limit", self.limit.to_string())]
    }
}

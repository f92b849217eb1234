//! Market discovery from the instrument catalog

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::exchanges::{Asset, Instrument, MarketDataSource, RequestOptions, VwapResult};

/// Unique quote assets a base asset trades against, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MarketSet {
    markets: Vec<Asset>,
}

impl MarketSet {
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.markets.iter()
    }

    /// Markets that need a USD conversion
    pub fn non_usd(&self) -> impl Iterator<Item = &Asset> {
        self.markets.iter().filter(|m| !m.is_usd())
    }

    pub fn contains(&self, market: &Asset) -> bool {
        self.markets.contains(market)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl FromIterator<Asset> for MarketSet {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let markets = iter.into_iter().filter(|m| seen.insert(m.clone())).collect();
        Self { markets }
    }
}

/// Filter a catalog down to the markets of `base`. Every quote asset is
/// kept as listed; symbols are percent-encoded when they reach a URL.
pub fn markets_for(base: &Asset, instruments: &[Instrument]) -> MarketSet {
    instruments
        .iter()
        .filter(|instrument| instrument.is_base(base))
        .map(|instrument| Asset::new(&instrument.quote_asset))
        .collect()
}

pub struct MarketResolver {
    source: Arc<dyn MarketDataSource>,
}

impl MarketResolver {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// Resolve the market set for `base`. An unknown asset yields an empty set.
    pub async fn resolve(&self, base: &Asset, options: RequestOptions) -> VwapResult<MarketSet> {
        let instruments = self.source.fetch_instruments(&options).await?;
        let markets = markets_for(base, &instruments);
        debug!(
            "Resolved {} markets for {} from {} instruments via {}",
            markets.len(),
            base,
            instruments.len(),
            self.source.name()
        );
        Ok(markets)
    }
}

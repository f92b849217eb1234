//! Sequential spot rate and USD conversion lookups

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::MarketSet;
use crate::config::VwapConfig;
use crate::exchanges::{Asset, MarketDataSource, TradeObservation, VwapResult};

/// Quote asset -> that asset's spot rate against USD
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversionTable {
    rates: BTreeMap<Asset, TradeObservation>,
}

impl ConversionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: Asset, rate: TradeObservation) {
        self.rates.insert(asset, rate);
    }

    pub fn get(&self, asset: &Asset) -> Option<&TradeObservation> {
        self.rates.get(asset)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Fetches the most recent base/quote trade for every market
pub struct RateFetcher {
    source: Arc<dyn MarketDataSource>,
    config: Arc<VwapConfig>,
}

impl RateFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, config: Arc<VwapConfig>) -> Self {
        Self { source, config }
    }

    /// One lookup per market, in market order. Any failure aborts.
    pub async fn fetch(&self, base: &Asset, markets: &MarketSet) -> VwapResult<Vec<TradeObservation>> {
        let mut observations = Vec::with_capacity(markets.len());

        for quote in markets.iter() {
            let options = self.config.request_options();
            let observation = self
                .source
                .fetch_spot_rate(base, quote, &options)
                .await
                .map_err(|e| {
                    warn!("Spot rate lookup for {}/{} failed: {}", base, quote, e);
                    e
                })?;
            debug!("{}/{}: price={} volume={}", base, quote, observation.price, observation.volume);
            observations.push(observation);
        }

        Ok(observations)
    }
}

/// Fetches quote -> USD rates for every non-USD market
pub struct ConversionFetcher {
    source: Arc<dyn MarketDataSource>,
    config: Arc<VwapConfig>,
}

impl ConversionFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, config: Arc<VwapConfig>) -> Self {
        Self { source, config }
    }

    pub async fn fetch(&self, markets: &MarketSet) -> VwapResult<ConversionTable> {
        let usd = Asset::usd();
        let mut table = ConversionTable::new();

        for quote in markets.non_usd() {
            let options = self.config.request_options();
            let rate = self
                .source
                .fetch_spot_rate(quote, &usd, &options)
                .await
                .map_err(|e| {
                    warn!("USD conversion lookup for {} failed: {}", quote, e);
                    e
                })?;
            debug!("{}/usd: price={} volume={}", quote, rate.price, rate.volume);
            table.insert(quote.clone(), rate);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::connector::mock::{Call, ScriptedSource};
    use rust_decimal_macros::dec;

    fn markets(symbols: &[&str]) -> MarketSet {
        symbols.iter().map(|s| Asset::new(s)).collect()
    }

    fn config() -> Arc<VwapConfig> {
        Arc::new(VwapConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        })
    }

    fn source() -> ScriptedSource {
        ScriptedSource::new()
            .rate("btc", "usd", dec!(30000), dec!(2))
            .rate("btc", "eur", dec!(100), dec!(5))
            .rate("btc", "jpy", dec!(4000000), dec!(1))
            .rate("eur", "usd", dec!(1.1), dec!(1.2))
            .rate("jpy", "usd", dec!(0.0067), dec!(3))
    }

    #[tokio::test]
    async fn test_rates_follow_market_order() {
        let source = Arc::new(source());
        let fetcher = RateFetcher::new(source.clone(), config());

        let observations = fetcher
            .fetch(&Asset::new("BTC"), &markets(&["eur", "usd", "jpy"]))
            .await
            .unwrap();

        let tags: Vec<&str> = observations.iter().map(|o| o.quote_asset.as_str()).collect();
        assert_eq!(tags, vec!["eur", "usd", "jpy"]);
        assert_eq!(observations[0].price, dec!(100));
        assert_eq!(
            source.calls(),
            vec![
                Call::SpotRate("btc".into(), "eur".into()),
                Call::SpotRate("btc".into(), "usd".into()),
                Call::SpotRate("btc".into(), "jpy".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_call_gets_the_credential() {
        let source = Arc::new(source());
        let fetcher = RateFetcher::new(source.clone(), config());
        fetcher.fetch(&Asset::new("btc"), &markets(&["usd", "eur"])).await.unwrap();

        let seen = source.seen_options();
        assert_eq!(seen.len(), 2);
        for options in seen {
            assert_eq!(options, config().request_options());
        }
    }

    #[tokio::test]
    async fn test_rate_failure_aborts() {
        let source = Arc::new(source().failing("btc", "eur"));
        let fetcher = RateFetcher::new(source.clone(), config());

        let err = fetcher
            .fetch(&Asset::new("btc"), &markets(&["eur", "usd"]))
            .await
            .unwrap_err();

        assert_eq!(err.name(), "UpstreamFetchError");
        // usd is never requested once eur fails
        assert_eq!(source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_conversions_skip_usd() {
        let source = Arc::new(source());
        let fetcher = ConversionFetcher::new(source.clone(), config());

        let table = fetcher.fetch(&markets(&["usd", "eur", "jpy"])).await.unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.get(&Asset::usd()).is_none());
        assert_eq!(table.get(&Asset::new("eur")).unwrap().price, dec!(1.1));
        assert_eq!(
            source.calls(),
            vec![
                Call::SpotRate("eur".into(), "usd".into()),
                Call::SpotRate("jpy".into(), "usd".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_usd_only_needs_no_conversions() {
        let source = Arc::new(source());
        let fetcher = ConversionFetcher::new(source.clone(), config());

        let table = fetcher.fetch(&markets(&["USD"])).await.unwrap();

        assert!(table.is_empty());
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_conversion_failure_aborts() {
        let source = Arc::new(source().failing("eur", "usd"));
        let fetcher = ConversionFetcher::new(source, config());
        let err = fetcher.fetch(&markets(&["eur", "jpy"])).await.unwrap_err();
        assert_eq!(err.name(), "UpstreamFetchError");
    }
}

//! Market data source trait

use async_trait::async_trait;

use super::errors::VwapResult;
use super::types::{Asset, Instrument, RequestOptions, TradeObservation};

/// Read-only access to the instrument catalog and spot-rate services
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the full instrument catalog
    async fn fetch_instruments(&self, options: &RequestOptions) -> VwapResult<Vec<Instrument>>;

    /// Fetch the most recent spot trade for `base`/`quote`.
    ///
    /// The returned observation is tagged with the requested `quote`.
    async fn fetch_spot_rate(
        &self,
        base: &Asset,
        quote: &Asset,
        options: &RequestOptions,
    ) -> VwapResult<TradeObservation>;

    fn name(&self) -> &str;
}

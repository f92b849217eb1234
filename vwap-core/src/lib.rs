//! USD Volume-Weighted Average Price
//!
//! Discovers every market a crypto asset trades in, fetches the most recent
//! spot trade for each, converts non-USD markets through their USD rate and
//! reduces everything to a single volume-weighted price.

pub mod api;
pub mod config;
pub mod exchanges;
pub mod market_data;
pub mod orchestrator;

// Re-export main types for easy access
pub use api::{VwapApiServer, EventHandler, HostEnvelope, HttpFunction, ProxyEvent};
pub use config::VwapConfig;
pub use exchanges::{
    Asset, ErrorKind, Instrument, KaikoClient, MarketDataSource, TradeObservation, VwapError,
    VwapResult,
};
pub use market_data::{ConversionTable, MarketSet};
pub use orchestrator::{VwapRequest, VwapResponse, VwapService};

use std::sync::Arc;

/// Build a service wired to the Kaiko REST APIs
pub fn kaiko_service(config: VwapConfig) -> VwapResult<VwapService> {
    let client = KaikoClient::new(&config)?;
    Ok(VwapService::new(Arc::new(client), Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kaiko_service_creation() {
        let config = VwapConfig {
            api_key: "key".to_string(),
            ..Default::default()
        };
        let service = kaiko_service(config).unwrap();
        assert_eq!(service.config().default_coin, "eth");
    }

    #[test]
    fn test_bad_market_url_rejected() {
        let config = VwapConfig {
            market_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(kaiko_service(config), Err(VwapError::Configuration(_))));
    }
}

//! Service configuration

use std::env;
use std::time::Duration;
use tracing::info;

use crate::exchanges::{RequestOptions, VwapError, VwapResult};

pub const API_KEY_ENV_VAR: &str = "API_KEY";

/// Process-wide configuration, read-only once loaded
#[derive(Debug, Clone)]
pub struct VwapConfig {
    pub api_key: String,
    pub reference_url: String,
    pub market_url: String,
    /// Observation window for spot rate lookups
    pub interval: String,
    pub limit: u32,
    pub default_coin: String,
    pub request_timeout: Duration,
    pub port: u16,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            reference_url: "https://reference-data-api.kaiko.io/v1/instruments".to_string(),
            market_url: "https://us.market-api.kaiko.io".to_string(),
            interval: "1d".to_string(),
            limit: 1,
            default_coin: "eth".to_string(),
            request_timeout: Duration::from_secs(10),
            port: 8080,
        }
    }
}

impl VwapConfig {
    /// Load from the environment. `API_KEY` is required.
    pub fn from_env() -> VwapResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> VwapResult<Self> {
        let defaults = Self::default();

        let api_key = lookup(API_KEY_ENV_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| VwapError::Configuration(format!("`{}` is not set", API_KEY_ENV_VAR)))?;

        let request_timeout = match lookup("VWAP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                VwapError::Configuration(format!("VWAP_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            None => defaults.request_timeout,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| VwapError::Configuration(format!("PORT is not a valid port: {}", raw)))?,
            None => defaults.port,
        };

        let config = Self {
            api_key,
            reference_url: lookup("KAIKO_REFERENCE_URL").unwrap_or(defaults.reference_url),
            market_url: lookup("KAIKO_MARKET_URL").unwrap_or(defaults.market_url),
            interval: lookup("VWAP_INTERVAL").unwrap_or(defaults.interval),
            limit: defaults.limit,
            default_coin: defaults.default_coin,
            request_timeout,
            port,
        };

        info!(
            "Loaded configuration: catalog={}, market={}, interval={}, timeout={:?}",
            config.reference_url, config.market_url, config.interval, config.request_timeout
        );
        Ok(config)
    }

    /// Fresh options for one outbound call
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            api_key: self.api_key.clone(),
            interval: self.interval.clone(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_api_key_required() {
        let err = VwapConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, VwapError::Configuration(_)));

        let err = VwapConfig::from_lookup(lookup(&[("API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, VwapError::Configuration(_)));
    }

    #[test]
    fn test_defaults_with_key() {
        let config = VwapConfig::from_lookup(lookup(&[("API_KEY", "abc")])).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.interval, "1d");
        assert_eq!(config.limit, 1);
        assert_eq!(config.default_coin, "eth");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = VwapConfig::from_lookup(lookup(&[
            ("API_KEY", "abc"),
            ("KAIKO_MARKET_URL", "http://localhost:9000"),
            ("VWAP_TIMEOUT_SECS", "3"),
            ("PORT", "9999"),
        ]))
        .unwrap();
        assert_eq!(config.market_url, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.port, 9999);

        let err = VwapConfig::from_lookup(lookup(&[("API_KEY", "abc"), ("PORT", "http")])).unwrap_err();
        assert!(matches!(err, VwapError::Configuration(_)));
    }

    #[test]
    fn test_request_options_are_independent() {
        let config = VwapConfig {
            api_key: "abc".to_string(),
            ..Default::default()
        };
        let mut first = config.request_options();
        first.limit = 50;
        let second = config.request_options();
        assert_eq!(second.limit, 1);
        assert_eq!(second.api_key, "abc");
    }
}

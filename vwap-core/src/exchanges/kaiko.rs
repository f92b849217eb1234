//! Kaiko reference-data and market-data REST connector

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;

use super::{
    Asset, Instrument, MarketDataSource, RequestOptions, TradeObservation, VwapError, VwapResult,
};
use crate::config::VwapConfig;

const SPOT_RATE_PATH: [&str; 4] = ["v1", "data", "trades.v1", "spot_direct_exchange_rate"];

/// Instrument catalog payload
#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    data: Vec<Instrument>,
}

/// Spot exchange rate payload
#[derive(Debug, Deserialize)]
struct SpotRateResponse {
    data: Vec<SpotRatePoint>,
    #[serde(default)]
    query: Option<SpotRateQuery>,
}

#[derive(Debug, Deserialize)]
struct SpotRatePoint {
    #[serde(default)]
    price: Value,
    #[serde(default)]
    volume: Value,
    /// Informational only; anything but integer milliseconds is ignored
    #[serde(default)]
    timestamp: Value,
}

#[derive(Debug, Deserialize)]
struct SpotRateQuery {
    #[serde(default)]
    quote_asset: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KaikoClient {
    client: Client,
    reference_url: Url,
    market_url: Url,
}

impl KaikoClient {
    pub fn new(config: &VwapConfig) -> VwapResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| VwapError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            reference_url: Url::parse(&config.reference_url)?,
            market_url: Url::parse(&config.market_url)?,
        })
    }

    fn spot_rate_url(&self, base: &Asset, quote: &Asset, options: &RequestOptions) -> VwapResult<Url> {
        let mut url = self.market_url.clone();
        url.path_segments_mut()
            .map_err(|_| VwapError::Configuration(format!("cannot extend market URL {}", self.market_url)))?
            .pop_if_empty()
            .extend(SPOT_RATE_PATH)
            .extend([base.as_str(), quote.as_str(), "recent"]);
        url.query_pairs_mut().extend_pairs(options.query_pairs());
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, options: &RequestOptions) -> VwapResult<T> {
        debug!(%url, "Upstream request");

        let body = self
            .client
            .get(url)
            .header(RequestOptions::API_KEY_HEADER, &options.api_key)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl MarketDataSource for KaikoClient {
    async fn fetch_instruments(&self, options: &RequestOptions) -> VwapResult<Vec<Instrument>> {
        let response: InstrumentsResponse = self.get_json(self.reference_url.clone(), options).await?;
        debug!("Catalog returned {} instruments", response.data.len());
        Ok(response.data)
    }

    async fn fetch_spot_rate(
        &self,
        base: &Asset,
        quote: &Asset,
        options: &RequestOptions,
    ) -> VwapResult<TradeObservation> {
        let url = self.spot_rate_url(base, quote, options)?;
        let response: SpotRateResponse = self.get_json(url, options).await?;
        observation_from_response(base, quote, response)
    }

    fn name(&self) -> &str {
        "Kaiko"
    }
}

fn observation_from_response(
    base: &Asset,
    quote: &Asset,
    response: SpotRateResponse,
) -> VwapResult<TradeObservation> {
    if let Some(echoed) = response.query.and_then(|q| q.quote_asset) {
        if Asset::new(&echoed) != *quote {
            warn!("Spot rate for {}/{} echoed quote asset {}", base, quote, echoed);
        }
    }

    let point = response.data.into_iter().next().ok_or_else(|| {
        VwapError::MalformedResponse(format!("no spot rate observation for {}/{}", base, quote))
    })?;

    let observation = TradeObservation::new(
        base.clone(),
        quote.clone(),
        coerce_decimal("price", &point.price)?,
        coerce_decimal("volume", &point.volume)?,
    );

    Ok(match point.timestamp.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis) {
        Some(ts) => observation.with_timestamp(ts),
        None => observation,
    })
}

/// Coerce an upstream string or number into a decimal
pub fn coerce_decimal(field: &str, value: &Value) -> VwapResult<Decimal> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => return Err(VwapError::MalformedResponse(format!("missing field `{}`", field))),
        other => {
            return Err(VwapError::MalformedResponse(format!(
                "field `{}` is not numeric: {}",
                field, other
            )))
        }
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| {
            VwapError::MalformedResponse(format!("field `{}` is not numeric: {:?}", field, raw))
        })
}

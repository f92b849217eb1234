//! Request orchestration: resolve, fetch, convert, aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::VwapConfig;
use crate::exchanges::{Asset, MarketDataSource, TradeObservation, VwapError, VwapResult};
use crate::market_data::{calculate_vwap, ConversionFetcher, ConversionTable, MarketResolver, RateFetcher};

/// Inbound job payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VwapRequest {
    /// Opaque job identifier, echoed back as `jobRunID`
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub data: RequestData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    #[serde(default)]
    pub coin: Option<String>,
}

impl VwapRequest {
    pub fn new(id: impl Into<Value>, coin: Option<&str>) -> Self {
        Self {
            id: id.into(),
            data: RequestData { coin: coin.map(str::to_string) },
        }
    }

    pub fn from_json(payload: Value) -> VwapResult<Self> {
        serde_json::from_value(payload).map_err(|e| VwapError::InvalidRequest { details: e.to_string() })
    }

    /// Requested coin, falling back to `default_coin` when absent or blank
    pub fn coin(&self, default_coin: &str) -> Asset {
        match self.data.coin.as_deref().map(str::trim) {
            Some(coin) if !coin.is_empty() => Asset::new(coin),
            _ => Asset::new(default_coin),
        }
    }
}

/// Traceability bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseData {
    pub results: Vec<TradeObservation>,
    pub conversions: ConversionTable,
    #[serde(with = "rust_decimal::serde::float")]
    pub result: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VwapResponse {
    #[serde(rename = "jobRunID")]
    pub job_run_id: Value,
    pub data: ResponseData,
    #[serde(with = "rust_decimal::serde::float")]
    pub result: Decimal,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub name: String,
    pub message: String,
}

/// Failure envelope, identical across host adapters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "jobRunID")]
    pub job_run_id: Value,
    pub status: String,
    pub error: ErrorDetail,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(job_run_id: Value, error: &VwapError) -> Self {
        Self {
            job_run_id,
            status: "errored".to_string(),
            error: ErrorDetail {
                name: error.name().to_string(),
                message: error.to_string(),
            },
            status_code: error.status_code(),
        }
    }
}

/// Runs the pipeline for one request at a time; holds no per-request state
#[derive(Clone)]
pub struct VwapService {
    source: Arc<dyn MarketDataSource>,
    config: Arc<VwapConfig>,
}

impl VwapService {
    pub fn new(source: Arc<dyn MarketDataSource>, config: Arc<VwapConfig>) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Arc<VwapConfig> {
        &self.config
    }

    /// Resolve -> rates -> conversions -> aggregate, strictly in order
    pub async fn create_request(&self, request: &VwapRequest) -> VwapResult<VwapResponse> {
        let started = Instant::now();
        let coin = request.coin(&self.config.default_coin);
        if !coin.validate() {
            return Err(VwapError::InvalidRequest { details: format!("invalid coin symbol: {:?}", coin.as_str()) });
        }
        info!("Job {}: computing VWAP for {} via {}", request.id, coin, self.source.name());

        let markets = MarketResolver::new(self.source.clone())
            .resolve(&coin, self.config.request_options())
            .await?;
        let results = RateFetcher::new(self.source.clone(), self.config.clone())
            .fetch(&coin, &markets)
            .await?;
        let conversions = ConversionFetcher::new(self.source.clone(), self.config.clone())
            .fetch(&markets)
            .await?;
        let vwap = calculate_vwap(&results, &conversions)?;

        info!(
            "Job {}: {} VWAP = {} USD over {} markets ({} conversions) in {:?}",
            request.id,
            coin,
            vwap,
            markets.len(),
            conversions.len(),
            started.elapsed()
        );

        Ok(VwapResponse {
            job_run_id: request.id.clone(),
            data: ResponseData {
                results,
                conversions,
                result: vwap,
            },
            result: vwap,
            status_code: 200,
        })
    }

    /// Run a request and render the success or error envelope with its status
    pub async fn respond(&self, request: &VwapRequest) -> (u16, Value) {
        match self.create_request(request).await {
            Ok(response) => match serde_json::to_value(&response) {
                Ok(body) => (response.status_code, body),
                Err(e) => Self::render_error(request.id.clone(), &VwapError::Internal { message: e.to_string() }),
            },
            Err(e) => {
                warn!("Job {} failed: {}", request.id, e);
                Self::render_error(request.id.clone(), &e)
            }
        }
    }

    /// Render a failure that happened before or during the pipeline
    pub fn render_error(job_run_id: Value, error: &VwapError) -> (u16, Value) {
        let response = ErrorResponse::new(job_run_id, error);
        let body = serde_json::to_value(&response).unwrap_or(Value::Null);
        (response.status_code, body)
    }
}

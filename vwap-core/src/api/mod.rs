//! HTTP entry points
//!
//! Mounts each host convention on its own route so any of them can be
//! served from one process.

pub mod adapters;

pub use adapters::{handle, EventHandler, HostEnvelope, HttpFunction, HttpReply, ProxyEvent, ProxyReply};

use serde_json::{json, Value};
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::exchanges::VwapError;
use crate::orchestrator::VwapService;

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// API server exposing the VWAP job endpoints
pub struct VwapApiServer {
    service: VwapService,
    port: u16,
}

impl VwapApiServer {
    pub fn new(service: VwapService, port: u16) -> Self {
        Self { service, port }
    }

    /// Start the API server
    pub async fn start(&self) {
        tracing::info!("Starting VWAP API server on port {}", self.port);
        warp::serve(routes(self.service.clone()))
            .run(([0, 0, 0, 0], self.port))
            .await;
    }
}

pub fn routes(service: VwapService) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path("health")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&json!({
                "status": "ok",
                "service": "vwap",
                "timestamp": chrono::Utc::now()
            }))
        });

    // HTTP function: status and body straight through
    let http_function = warp::path::end()
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and_then(run_http_function);

    // Event handler: always 200, outcome lives in the body. Unlike the other
    // routes, a failed job does not change the HTTP status; callers must read
    // `statusCode` from the envelope.
    let event_handler = warp::path("lambda")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with_service(service.clone()))
        .and_then(run_event_handler);

    // Proxy event: body arrives and leaves as a JSON string
    let proxy_event = warp::path!("lambda" / "v2")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<ProxyEvent>())
        .and(with_service(service))
        .and_then(run_proxy_event);

    health
        .or(http_function)
        .or(event_handler)
        .or(proxy_event)
        .recover(handle_rejection)
}

fn json_body() -> impl Filter<Extract = (Value,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

// Helper function to inject the service
fn with_service(
    service: VwapService,
) -> impl Filter<Extract = (VwapService,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

async fn run_http_function(payload: Value, service: VwapService) -> Result<impl Reply, Rejection> {
    let reply = handle(&service, HttpFunction(payload)).await;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(warp::reply::with_status(warp::reply::json(&reply.body), status))
}

/// Event-handler hosts take the bare envelope as their reply, so the HTTP
/// status is 200 even for errored jobs and `statusCode` carries the outcome.
async fn run_event_handler(payload: Value, service: VwapService) -> Result<impl Reply, Rejection> {
    let body = handle(&service, EventHandler(payload)).await;
    Ok(warp::reply::json(&body))
}

async fn run_proxy_event(event: ProxyEvent, service: VwapService) -> Result<impl Reply, Rejection> {
    let reply = handle(&service, event).await;
    Ok(warp::reply::json(&reply))
}

/// Handle API errors with the same envelope the pipeline uses
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, error) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, VwapError::InvalidRequest { details: "endpoint not found".to_string() })
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, VwapError::InvalidRequest { details: e.to_string() })
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, VwapError::InvalidRequest { details: "payload too large".to_string() })
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, VwapError::InvalidRequest { details: "method not allowed".to_string() })
    } else {
        tracing::error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, VwapError::Internal { message: "internal server error".to_string() })
    };

    let (_, mut body) = VwapService::render_error(Value::Null, &error);
    body["statusCode"] = json!(status.as_u16());

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

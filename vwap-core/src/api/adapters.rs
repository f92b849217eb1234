//! Host invocation conventions
//!
//! Each host hands the job over in its own envelope. Adapters only unwrap
//! the payload and wrap the reply; all of them run the same
//! [`VwapService::respond`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::exchanges::VwapError;
use crate::orchestrator::{VwapRequest, VwapService};

/// Translation between a host envelope and the core request/response
pub trait HostEnvelope: Sized {
    type Reply;

    /// Unwrap the job payload. On failure, return the job id if one was readable.
    fn into_request(self) -> Result<VwapRequest, (Value, VwapError)>;

    fn reply(status: u16, body: Value) -> Self::Reply;
}

/// Run one job through the pipeline for any host convention
pub async fn handle<E: HostEnvelope>(service: &VwapService, envelope: E) -> E::Reply {
    let (status, body) = match envelope.into_request() {
        Ok(request) => service.respond(&request).await,
        Err((job_run_id, error)) => {
            warn!("Rejected job payload: {}", error);
            VwapService::render_error(job_run_id, &error)
        }
    };
    E::reply(status, body)
}

fn request_from_payload(payload: Value) -> Result<VwapRequest, (Value, VwapError)> {
    let job_run_id = payload.get("id").cloned().unwrap_or(Value::Null);
    VwapRequest::from_json(payload).map_err(|e| (job_run_id, e))
}

/// HTTP function: the request body is the payload
#[derive(Debug, Clone)]
pub struct HttpFunction(pub Value);

#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

impl HostEnvelope for HttpFunction {
    type Reply = HttpReply;

    fn into_request(self) -> Result<VwapRequest, (Value, VwapError)> {
        request_from_payload(self.0)
    }

    fn reply(status: u16, body: Value) -> HttpReply {
        HttpReply { status, body }
    }
}

/// Event handler: the event is the payload and the reply is the bare body
#[derive(Debug, Clone)]
pub struct EventHandler(pub Value);

impl HostEnvelope for EventHandler {
    type Reply = Value;

    fn into_request(self) -> Result<VwapRequest, (Value, VwapError)> {
        request_from_payload(self.0)
    }

    fn reply(_status: u16, body: Value) -> Value {
        body
    }
}

/// Proxy event: the payload arrives as a JSON string in `body`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyEvent {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyReply {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
}

impl HostEnvelope for ProxyEvent {
    type Reply = ProxyReply;

    fn into_request(self) -> Result<VwapRequest, (Value, VwapError)> {
        let raw = self.body.ok_or_else(|| {
            (Value::Null, VwapError::InvalidRequest { details: "proxy event has no body".to_string() })
        })?;
        let payload: Value = serde_json::from_str(&raw).map_err(|e| {
            (Value::Null, VwapError::InvalidRequest { details: format!("body is not JSON: {}", e) })
        })?;
        request_from_payload(payload)
    }

    fn reply(status: u16, body: Value) -> ProxyReply {
        ProxyReply {
            status_code: status,
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }
}

//! Pipeline error types

use thiserror::Error;

/// Custom result type for pipeline operations
pub type VwapResult<T> = Result<T, VwapError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VwapError {
    #[error("Upstream fetch failed: {message}")]
    UpstreamFetch { message: String },

    #[error("Missing USD conversion for market: {asset}")]
    MissingConversion { asset: String },

    #[error("No data: {reason}")]
    NoData { reason: String },

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Arithmetic overflow while {context}")]
    Arithmetic { context: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Upstream,
    Data,
    Client,
    Internal,
}

impl VwapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UpstreamFetch { .. } | Self::MalformedResponse(_) => ErrorKind::Upstream,
            Self::MissingConversion { .. } | Self::NoData { .. } => ErrorKind::Data,
            Self::InvalidRequest { .. } => ErrorKind::Client,
            Self::Configuration(_) | Self::Arithmetic { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Client => 400,
            ErrorKind::Upstream => 502,
            ErrorKind::Data | ErrorKind::Internal => 500,
        }
    }

    /// Stable name reported in the error envelope
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpstreamFetch { .. } => "UpstreamFetchError",
            Self::MissingConversion { .. } => "MissingConversionError",
            Self::NoData { .. } => "NoDataError",
            Self::MalformedResponse(_) => "MalformedResponseError",
            Self::InvalidRequest { .. } => "InvalidRequestError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Arithmetic { .. } => "ArithmeticError",
            Self::Internal { .. } => "InternalError",
        }
    }

    pub fn no_data(reason: impl Into<String>) -> Self {
        Self::NoData { reason: reason.into() }
    }

    pub fn arithmetic(context: impl Into<String>) -> Self {
        Self::Arithmetic { context: context.into() }
    }
}

impl From<serde_json::Error> for VwapError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

impl From<reqwest::Error> for VwapError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else if let Some(status) = err.status() {
            format!("HTTP {}: {}", status.as_u16(), err)
        } else {
            err.to_string()
        };
        Self::UpstreamFetch { message }
    }
}

impl From<url::ParseError> for VwapError {
    fn from(err: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {}", err))
    }
}

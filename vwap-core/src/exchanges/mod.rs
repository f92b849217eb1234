//! Upstream market data connectivity

pub mod connector;
pub mod errors;
pub mod kaiko;
pub mod types;

pub use connector::MarketDataSource;
pub use errors::{ErrorKind, VwapError, VwapResult};
pub use kaiko::KaikoClient;
pub use types::{Asset, Instrument, RequestOptions, TradeObservation};

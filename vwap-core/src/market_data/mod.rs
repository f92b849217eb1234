//! Market discovery, rate collection and USD aggregation

pub mod fetchers;
pub mod normalizers;
pub mod resolver;

pub use fetchers::{ConversionFetcher, ConversionTable, RateFetcher};
pub use normalizers::{calculate_vwap, normalize, volume_weighted_mean, NormalizedObservation};
pub use resolver::{MarketResolver, MarketSet};

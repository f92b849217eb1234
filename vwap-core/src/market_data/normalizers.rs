//! USD normalization and volume-weighted aggregation

use rust_decimal::Decimal;
use serde::Serialize;

use super::ConversionTable;
use crate::exchanges::{Asset, TradeObservation, VwapError, VwapResult};

/// A trade observation restated in USD
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedObservation {
    pub quote_asset: Asset,
    pub price: Decimal,
    pub volume: Decimal,
}

/// Restate one observation in USD.
///
/// Non-USD volume is scaled by the conversion rate's *volume*, not its
/// price. The units do not line up; confirm the intended semantics with
/// downstream consumers before changing it.
pub fn normalize(
    observation: &TradeObservation,
    conversions: &ConversionTable,
) -> VwapResult<NormalizedObservation> {
    let quote = &observation.quote_asset;

    if quote.is_usd() {
        return Ok(NormalizedObservation {
            quote_asset: quote.clone(),
            price: observation.price,
            volume: observation.volume,
        });
    }

    let rate = conversions
        .get(quote)
        .ok_or_else(|| VwapError::MissingConversion { asset: quote.to_string() })?;

    Ok(NormalizedObservation {
        quote_asset: quote.clone(),
        price: observation
            .price
            .checked_mul(rate.price)
            .ok_or_else(|| VwapError::arithmetic(format!("converting {} price", quote)))?,
        volume: observation
            .volume
            .checked_mul(rate.volume)
            .ok_or_else(|| VwapError::arithmetic(format!("converting {} volume", quote)))?,
    })
}

pub fn normalize_all(
    observations: &[TradeObservation],
    conversions: &ConversionTable,
) -> VwapResult<Vec<NormalizedObservation>> {
    observations
        .iter()
        .map(|observation| normalize(observation, conversions))
        .collect()
}

/// Σ(price × volume) / Σ(volume)
pub fn volume_weighted_mean(observations: &[NormalizedObservation]) -> VwapResult<Decimal> {
    if observations.is_empty() {
        return Err(VwapError::no_data("no markets to aggregate"));
    }

    let mut notional = Decimal::ZERO;
    let mut total_volume = Decimal::ZERO;

    for observation in observations {
        let weighted = observation
            .price
            .checked_mul(observation.volume)
            .ok_or_else(|| VwapError::arithmetic("weighting prices"))?;
        notional = notional
            .checked_add(weighted)
            .ok_or_else(|| VwapError::arithmetic("summing notional"))?;
        total_volume = total_volume
            .checked_add(observation.volume)
            .ok_or_else(|| VwapError::arithmetic("summing volume"))?;
    }

    if total_volume.is_zero() {
        return Err(VwapError::no_data("total volume is zero"));
    }

    notional
        .checked_div(total_volume)
        .map(|vwap| vwap.normalize())
        .ok_or_else(|| VwapError::arithmetic("dividing by total volume"))
}

/// Normalize every observation then aggregate
pub fn calculate_vwap(
    observations: &[TradeObservation],
    conversions: &ConversionTable,
) -> VwapResult<Decimal> {
    let normalized = normalize_all(observations, conversions)?;
    volume_weighted_mean(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn observation(base: &str, quote: &str, price: Decimal, volume: Decimal) -> TradeObservation {
        TradeObservation::new(Asset::new(base), Asset::new(quote), price, volume)
    }

    fn eur_table() -> ConversionTable {
        let mut table = ConversionTable::new();
        table.insert(Asset::new("eur"), observation("eur", "usd", dec!(1.1), dec!(1.2)));
        table
    }

    #[test]
    fn test_usd_passes_through() {
        let normalized = normalize(
            &observation("btc", "usd", dec!(30000), dec!(2)),
            &ConversionTable::new(),
        )
        .unwrap();
        assert_eq!(normalized.price, dec!(30000));
        assert_eq!(normalized.volume, dec!(2));
    }

    #[test]
    fn test_eur_conversion_uses_rate_volume() {
        let normalized = normalize(&observation("btc", "eur", dec!(100), dec!(5)), &eur_table()).unwrap();
        assert_eq!(normalized.price, dec!(110));
        assert_eq!(normalized.volume, dec!(6));
    }

    #[test]
    fn test_mixed_market_vwap() {
        let observations = vec![
            observation("btc", "usd", dec!(30000), dec!(2)),
            observation("btc", "eur", dec!(100), dec!(5)),
        ];
        // (30000 * 2 + 110 * 6) / (2 + 6)
        let vwap = calculate_vwap(&observations, &eur_table()).unwrap();
        assert_eq!(vwap, dec!(7582.5));
    }

    #[test]
    fn test_single_usd_market_is_exact() {
        let observations = vec![observation("eth", "usd", dec!(1843.217), dec!(0.0031))];
        let vwap = calculate_vwap(&observations, &ConversionTable::new()).unwrap();
        assert_eq!(vwap, dec!(1843.217));
    }

    #[test]
    fn test_vwap_within_price_range() {
        let cases = vec![
            vec![(dec!(10), dec!(1)), (dec!(20), dec!(3)), (dec!(15), dec!(0.5))],
            vec![(dec!(0.0001), dec!(1000000)), (dec!(99999), dec!(0.0001))],
            vec![(dec!(3), dec!(7)), (dec!(3), dec!(2))],
            vec![(dec!(1.333), dec!(2.7)), (dec!(1.334), dec!(9.1)), (dec!(1.2), dec!(0.01))],
        ];

        for case in cases {
            let observations: Vec<NormalizedObservation> = case
                .iter()
                .map(|(price, volume)| NormalizedObservation {
                    quote_asset: Asset::usd(),
                    price: *price,
                    volume: *volume,
                })
                .collect();
            let min = observations.iter().map(|o| o.price).min().unwrap();
            let max = observations.iter().map(|o| o.price).max().unwrap();

            let vwap = volume_weighted_mean(&observations).unwrap();
            assert!(vwap >= min && vwap <= max, "{} outside [{}, {}]", vwap, min, max);
        }
    }

    #[test]
    fn test_missing_conversion_is_fatal() {
        let observations = vec![
            observation("btc", "usd", dec!(30000), dec!(2)),
            observation("btc", "gbp", dec!(90), dec!(1)),
        ];
        let err = calculate_vwap(&observations, &eur_table()).unwrap_err();
        assert_eq!(err, VwapError::MissingConversion { asset: "gbp".to_string() });
    }

    #[test]
    fn test_empty_is_no_data() {
        let err = calculate_vwap(&[], &ConversionTable::new()).unwrap_err();
        assert!(matches!(err, VwapError::NoData { .. }));
    }

    #[test]
    fn test_zero_volume_is_no_data() {
        let observations = vec![
            observation("btc", "usd", dec!(30000), dec!(0)),
            observation("btc", "eur", dec!(100), dec!(0)),
        ];
        let err = calculate_vwap(&observations, &eur_table()).unwrap_err();
        assert!(matches!(err, VwapError::NoData { .. }));
    }

    #[test]
    fn test_overflow_is_reported() {
        let observations = vec![NormalizedObservation {
            quote_asset: Asset::usd(),
            price: Decimal::MAX,
            volume: dec!(10),
        }];
        let err = volume_weighted_mean(&observations).unwrap_err();
        assert_eq!(err.name(), "ArithmeticError");
    }
}

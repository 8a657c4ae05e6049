// Price Feed Boundary
//
// Fetching and committing prices belongs to the oracle collaborator. What
// arrives here is a quote: an 18 decimal price, its publish time and whether
// the underlying market is open. The engine decides freshness and turns the
// quote into a 6 decimal market price through the market's payoff.

use crate::fixed::{ArithmeticError, Fixed18, Fixed6};
use crate::payoff::Payoff;
use crate::status::PriceUpdate;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Code reported through `PriceUpdate::Failed` when the price is too old to act on.
pub const STALE_PRICE_CODE: &str = "StalePriceError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleQuote {
    pub price: Fixed18,
    pub publish_time: Timestamp,
    /// Whether the underlying market trades right now, e.g. equities after hours.
    pub market_open: bool,
}

impl OracleQuote {
    /// Builds a quote from an integer answer carrying `decimals` implied places.
    pub fn from_answer(
        answer: i128,
        decimals: u32,
        publish_time: Timestamp,
        market_open: bool,
    ) -> Result<Self, ArithmeticError> {
        Ok(Self {
            price: Fixed18::from_decimals(answer, decimals)?,
            publish_time,
            market_open,
        })
    }

    pub fn age(&self, now: Timestamp) -> i64 {
        self.publish_time.elapsed_until(now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFreshness {
    Fresh,
    /// Old, but nothing is trading, so there is nothing newer to commit.
    StaleMarketClosed,
    Stale,
}

impl PriceFreshness {
    /// `closed_is_error` promotes closed-market staleness to a failure.
    pub fn is_error(&self, closed_is_error: bool) -> bool {
        match self {
            PriceFreshness::Fresh => false,
            PriceFreshness::StaleMarketClosed => closed_is_error,
            PriceFreshness::Stale => true,
        }
    }

    pub fn price_update(&self, closed_is_error: bool) -> PriceUpdate {
        if self.is_error(closed_is_error) {
            PriceUpdate::Failed(STALE_PRICE_CODE.to_string())
        } else {
            PriceUpdate::Committed
        }
    }
}

pub fn classify_price(quote: &OracleQuote, now: Timestamp, stale_after: i64) -> PriceFreshness {
    let age = quote.age(now);
    if age <= stale_after {
        return PriceFreshness::Fresh;
    }
    if !quote.market_open {
        return PriceFreshness::StaleMarketClosed;
    }

    warn!(age = age, stale_after = stale_after, "oracle price is stale on an open market");
    PriceFreshness::Stale
}

/// Oracle price through the payoff, narrowed to 6 decimals.
pub fn market_price(quote: &OracleQuote, payoff: Payoff) -> Result<Fixed6, ArithmeticError> {
    Ok(payoff.transform(quote.price)?.to_fixed6())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(publish_time: i64, market_open: bool) -> OracleQuote {
        OracleQuote::from_answer(200_012_345_678, 8, Timestamp(publish_time), market_open).unwrap()
    }

    #[test]
    fn test_answer_normalization() {
        let q = quote(0, true);
        assert_eq!(q.price, Fixed18::from_float_string("2000.12345678").unwrap());
        assert_eq!(market_price(&q, Payoff::Linear).unwrap(), Fixed6::from_float_string("2000.123456").unwrap());
    }

    #[test]
    fn test_market_price_through_payoff() {
        let q = OracleQuote::from_answer(4, 0, Timestamp(0), true).unwrap();
        assert_eq!(market_price(&q, Payoff::Inverse).unwrap(), Fixed6::from_float_string("0.25").unwrap());
        assert_eq!(market_price(&q, Payoff::PowerTwo).unwrap(), Fixed6::from_units(16));
        assert_eq!(market_price(&q, Payoff::PowerHalf).unwrap(), Fixed6::from_units(2));
    }

    #[test]
    fn test_freshness() {
        assert_eq!(classify_price(&quote(1_000, true), Timestamp(1_010), 30), PriceFreshness::Fresh);
        assert_eq!(classify_price(&quote(1_000, true), Timestamp(1_030), 30), PriceFreshness::Fresh);
        assert_eq!(classify_price(&quote(1_000, true), Timestamp(1_031), 30), PriceFreshness::Stale);
        assert_eq!(
            classify_price(&quote(1_000, false), Timestamp(1_031), 30),
            PriceFreshness::StaleMarketClosed
        );
    }

    #[test]
    fn test_stale_price_maps_to_failed_update() {
        assert_eq!(PriceFreshness::Fresh.price_update(true), PriceUpdate::Committed);
        assert_eq!(PriceFreshness::StaleMarketClosed.price_update(false), PriceUpdate::Committed);
        assert_eq!(
            PriceFreshness::StaleMarketClosed.price_update(true),
            PriceUpdate::Failed(STALE_PRICE_CODE.to_string())
        );
        assert_eq!(
            PriceFreshness::Stale.price_update(false),
            PriceUpdate::Failed(STALE_PRICE_CODE.to_string())
        );
    }
}

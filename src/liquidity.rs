// 6.2: how much more taker size the book can absorb, and what makers are exposed to.
// taker size on one side is bounded by the opposite side plus makers, and by how far
// maker capital stretches under the efficiency limit.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::market::AggregatePosition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakerLiquidity {
    pub available_long: Fixed6,
    pub available_short: Fixed6,
    pub total_long: Fixed6,
    pub total_short: Fixed6,
}

pub fn calc_taker_liquidity(
    position: &AggregatePosition,
    efficiency_limit: Fixed6,
) -> Result<TakerLiquidity, ArithmeticError> {
    // zero limit leaves only the book bound
    let maker_limit = if efficiency_limit.is_zero() {
        None
    } else {
        Some(position.maker.div(efficiency_limit)?)
    };

    let bounded = |value: Fixed6, headroom: Option<Fixed6>| match headroom {
        Some(h) => value.min(h),
        None => value,
    };

    let available = |same: Fixed6, opposite: Fixed6| -> Result<Fixed6, ArithmeticError> {
        let by_book = opposite.checked_add(position.maker)?.checked_sub(same)?;
        let headroom = maker_limit.map(|limit| limit.checked_sub(same)).transpose()?;
        Ok(bounded(by_book, headroom).max(Fixed6::ZERO))
    };

    Ok(TakerLiquidity {
        available_long: available(position.long, position.short)?,
        available_short: available(position.short, position.long)?,
        total_long: bounded(position.short.checked_add(position.maker)?, maker_limit),
        total_short: bounded(position.long.checked_add(position.maker)?, maker_limit),
    })
}

/// Signed share of the taker imbalance a maker carries. negative means net short.
pub fn calc_maker_exposure(user_maker: Fixed6, position: &AggregatePosition) -> Result<Fixed6, ArithmeticError> {
    if position.maker.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    user_maker.mul(position.short.checked_sub(position.long)?)?.div(position.maker)
}

/// Exposure per unit of maker position.
pub fn calc_maker_exposure_ratio(position: &AggregatePosition) -> Result<Fixed6, ArithmeticError> {
    calc_maker_exposure(Fixed6::ONE, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn f6(s: &str) -> Fixed6 {
        Fixed6::from_float_string(s).unwrap()
    }

    fn u(n: i64) -> Fixed6 {
        Fixed6::from_units(n)
    }

    fn book() -> AggregatePosition {
        AggregatePosition::new(Timestamp(0), u(1000), u(600), u(400))
    }

    #[test]
    fn liquidity_bounded_by_book() {
        // maker limit 1000 / 0.5 = 2000 is loose
        let liquidity = calc_taker_liquidity(&book(), f6("0.5")).unwrap();
        assert_eq!(liquidity.available_long, u(800));
        assert_eq!(liquidity.available_short, u(1200));
        assert_eq!(liquidity.total_long, u(1400));
        assert_eq!(liquidity.total_short, u(1600));
    }

    #[test]
    fn liquidity_bounded_by_efficiency() {
        // maker limit 1000 / 2 = 500
        let liquidity = calc_taker_liquidity(&book(), u(2)).unwrap();
        assert_eq!(liquidity.available_long, Fixed6::ZERO);
        assert_eq!(liquidity.available_short, u(100));
        assert_eq!(liquidity.total_long, u(500));
        assert_eq!(liquidity.total_short, u(500));
    }

    #[test]
    fn zero_efficiency_limit_uses_book_only() {
        let liquidity = calc_taker_liquidity(&book(), Fixed6::ZERO).unwrap();
        assert_eq!(liquidity.available_long, u(800));
        assert_eq!(liquidity.total_short, u(1600));
    }

    #[test]
    fn oversized_book_reports_overflow() {
        let pos = AggregatePosition::new(Timestamp(0), Fixed6::from_raw(i128::MAX), u(600), u(400));
        assert_eq!(calc_taker_liquidity(&pos, Fixed6::ZERO), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn maker_exposure_is_counterparty_to_skew() {
        // longs dominate, so makers are net short
        assert_eq!(calc_maker_exposure(u(100), &book()).unwrap(), u(-20));
        assert_eq!(calc_maker_exposure_ratio(&book()).unwrap(), f6("-0.2"));
    }

    #[test]
    fn maker_exposure_without_makers() {
        let pos = AggregatePosition::new(Timestamp(0), Fixed6::ZERO, u(600), u(400));
        assert_eq!(calc_maker_exposure(u(100), &pos).unwrap(), Fixed6::ZERO);
    }
}

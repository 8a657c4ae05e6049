//! Margin, maintenance and leverage.
//!
//! Margin is what a position needs to open, maintenance what it needs to stay
//! open. Both scale with notional and are floored by an absolute minimum so a
//! tiny position still carries a meaningful requirement.
//!
//! Max leverage is the smaller of the margin-ratio bound, the bound implied by
//! posting only the minimum margin, and a hard cap, then quantized for display.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::market::RiskParameter;

pub const MAX_LEVERAGE: Fixed6 = Fixed6::from_units(100);
const LEVERAGE_STEP: Fixed6 = Fixed6::from_units(5);

/// |position * price|
pub fn calc_notional(position: Fixed6, price: Fixed6) -> Result<Fixed6, ArithmeticError> {
    Ok(position.mul(price)?.abs())
}

fn requirement(
    ratio: Fixed6,
    minimum: Fixed6,
    position: Fixed6,
    price: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    if position.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    let scaled = calc_notional(position, price)?.mul(ratio)?;
    Ok(minimum.max(scaled))
}

pub fn calc_margin(risk: &RiskParameter, position: Fixed6, price: Fixed6) -> Result<Fixed6, ArithmeticError> {
    requirement(risk.margin, risk.min_margin, position, price)
}

pub fn calc_maintenance(
    risk: &RiskParameter,
    position: Fixed6,
    price: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    requirement(risk.maintenance, risk.min_maintenance, position, price)
}

/// notional / collateral, zero without positive collateral.
pub fn calc_leverage(price: Fixed6, position: Fixed6, collateral: Fixed6) -> Result<Fixed6, ArithmeticError> {
    if !collateral.is_positive() {
        return Ok(Fixed6::ZERO);
    }
    calc_notional(position, price)?.div(collateral)
}

/// Collateral needed to hold `position` at `leverage`.
pub fn calc_collateral_for_leverage(
    position: Fixed6,
    price: Fixed6,
    leverage: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    if leverage.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    calc_notional(position, price)?.div(leverage)
}

/// Position size that `collateral` supports at `leverage`.
pub fn calc_position_from_leverage(
    collateral: Fixed6,
    leverage: Fixed6,
    price: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    if price.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    collateral.mul(leverage)?.div(price)
}

/// Leverage ceiling for `collateral`. without positive collateral only the margin bound applies.
pub fn calc_max_leverage(
    margin: Fixed6,
    min_margin: Fixed6,
    collateral: Fixed6,
    cap: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    let margin_max = if margin.is_zero() {
        cap
    } else {
        Fixed6::ONE.div(margin)?
    };

    let min_collateral_for_full_range = min_margin.mul(margin_max)?;
    let collateral_max = if !collateral.is_positive() || min_collateral_for_full_range.is_zero() {
        margin_max
    } else {
        collateral.mul(margin_max)?.div(min_collateral_for_full_range)?
    };

    Ok(quantize_leverage(margin_max.min(collateral_max).min(cap)))
}

/// Floors to a multiple of 5x. below 5x the value is returned as is.
pub fn quantize_leverage(leverage: Fixed6) -> Fixed6 {
    if leverage < LEVERAGE_STEP {
        return leverage;
    }
    let step = LEVERAGE_STEP.raw();
    Fixed6::from_raw(leverage.raw() / step * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f6(s: &str) -> Fixed6 {
        Fixed6::from_float_string(s).unwrap()
    }

    fn u(n: i64) -> Fixed6 {
        Fixed6::from_units(n)
    }

    fn risk() -> RiskParameter {
        let mut risk = RiskParameter::default();
        risk.margin = f6("0.1");
        risk.maintenance = f6("0.05");
        risk.min_margin = u(50);
        risk.min_maintenance = u(25);
        risk
    }

    #[test]
    fn notional_is_absolute() {
        assert_eq!(calc_notional(u(-10), u(2000)).unwrap(), u(20000));
        assert_eq!(calc_notional(u(10), u(2000)).unwrap(), u(20000));
    }

    #[test]
    fn margin_scales_with_notional() {
        // 20000 * 0.1 beats the 50 floor
        assert_eq!(calc_margin(&risk(), u(10), u(2000)).unwrap(), u(2000));
        assert_eq!(calc_maintenance(&risk(), u(10), u(2000)).unwrap(), u(1000));
    }

    #[test]
    fn margin_floors_at_minimum() {
        // 20 * 0.1 = 2, below the 50 floor
        assert_eq!(calc_margin(&risk(), f6("0.01"), u(2000)).unwrap(), u(50));
        assert_eq!(calc_maintenance(&risk(), f6("0.01"), u(2000)).unwrap(), u(25));
    }

    #[test]
    fn empty_position_needs_nothing() {
        assert_eq!(calc_margin(&risk(), Fixed6::ZERO, u(2000)).unwrap(), Fixed6::ZERO);
        assert_eq!(calc_maintenance(&risk(), Fixed6::ZERO, u(2000)).unwrap(), Fixed6::ZERO);
    }

    #[test]
    fn leverage_guarded_against_zero_collateral() {
        assert_eq!(calc_leverage(u(2000), u(10), u(2000)).unwrap(), u(10));
        assert_eq!(calc_leverage(u(2000), u(10), Fixed6::ZERO).unwrap(), Fixed6::ZERO);
        assert_eq!(calc_leverage(u(2000), u(10), u(-400)).unwrap(), Fixed6::ZERO);
    }

    #[test]
    fn collateral_and_position_for_leverage() {
        assert_eq!(calc_collateral_for_leverage(u(10), u(2000), u(5)).unwrap(), u(4000));
        assert_eq!(calc_collateral_for_leverage(u(10), u(2000), Fixed6::ZERO).unwrap(), Fixed6::ZERO);
        assert_eq!(calc_position_from_leverage(u(4000), u(5), u(2000)).unwrap(), u(10));
        assert_eq!(calc_position_from_leverage(u(4000), u(5), Fixed6::ZERO).unwrap(), Fixed6::ZERO);
    }

    #[test]
    fn max_leverage_capped_at_100x() {
        // 1 / 0.005 = 200x, capped
        assert_eq!(calc_max_leverage(f6("0.005"), u(10), u(10_000), MAX_LEVERAGE).unwrap(), u(100));
        assert_eq!(calc_max_leverage(Fixed6::ZERO, u(10), u(10_000), MAX_LEVERAGE).unwrap(), u(100));
    }

    #[test]
    fn max_leverage_rounds_down_to_multiple_of_five() {
        // 1 / 0.03 = 33.333333
        assert_eq!(calc_max_leverage(f6("0.03"), u(10), u(10_000), MAX_LEVERAGE).unwrap(), u(30));
        // collateral bound 73 / 10 = 7.3
        assert_eq!(calc_max_leverage(f6("0.01"), u(10), u(73), MAX_LEVERAGE).unwrap(), u(5));
    }

    #[test]
    fn max_leverage_below_five_is_not_rounded() {
        // collateral bound 35 / 10 = 3.5
        assert_eq!(calc_max_leverage(f6("0.01"), u(10), u(35), MAX_LEVERAGE).unwrap(), f6("3.5"));
        assert_eq!(quantize_leverage(f6("4.999999")), f6("4.999999"));
        assert_eq!(quantize_leverage(u(5)), u(5));
        assert_eq!(quantize_leverage(f6("9.99")), u(5));
    }

    #[test]
    fn max_leverage_without_collateral_uses_margin_bound() {
        assert_eq!(calc_max_leverage(f6("0.02"), u(10), Fixed6::ZERO, MAX_LEVERAGE).unwrap(), u(50));
    }

    #[test]
    fn max_leverage_with_negative_collateral_uses_margin_bound() {
        // a withdrawal past the balance must not flip the ceiling negative
        assert_eq!(calc_max_leverage(f6("0.1"), u(10), u(-50), MAX_LEVERAGE).unwrap(), u(10));
    }
}

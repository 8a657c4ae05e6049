// 5.0: trade fees for a hypothetical position change.
// makers pay linear + utilization impact. takers pay linear + skew + impact + adiabatic.
// each component is a rate on notional and the total is floored at zero.
// 5.1 splits a total fee into the flat part and the part that moves the fill price.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::margin::calc_notional;
use crate::market::{AggregatePosition, FeeCoefficients, RiskParameter};
use crate::types::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFee {
    /// Fee amount in collateral units, never negative.
    pub total: Fixed6,
    pub linear_fee: Fixed6,
    /// Taker only.
    pub skew_fee: Option<Fixed6>,
    pub impact_fee: Fixed6,
    /// Taker only. negative when the trade shrinks the skew.
    pub adiabatic_fee: Option<Fixed6>,
    /// `total / notional`, or the linear rate when nothing was charged.
    pub fee_basis_points: Fixed6,
}

impl TradeFee {
    fn flat(linear: Fixed6) -> Self {
        Self {
            total: Fixed6::ZERO,
            linear_fee: linear,
            skew_fee: None,
            impact_fee: Fixed6::ZERO,
            adiabatic_fee: None,
            fee_basis_points: linear,
        }
    }
}

/// Maker utilization: major / (maker + minor). zero when the book is empty.
pub fn calc_utilization(position: &AggregatePosition) -> Result<Fixed6, ArithmeticError> {
    let denominator = position.maker.checked_add(position.minor())?;
    if denominator.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    position.major().div(denominator)
}

/// (long - short) / (major + virtualTaker). zero when both are zero.
pub fn calc_skew(position: &AggregatePosition, virtual_taker: Fixed6) -> Result<Fixed6, ArithmeticError> {
    let denominator = position.major().checked_add(virtual_taker)?;
    if denominator.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    position.net()?.div(denominator)
}

fn fee_basis_points(total: Fixed6, notional: Fixed6, linear: Fixed6) -> Result<Fixed6, ArithmeticError> {
    if total.is_zero() {
        return Ok(linear);
    }
    total.div(notional)
}

fn maker_fee(
    position_delta: Fixed6,
    position: &AggregatePosition,
    coefficients: &FeeCoefficients,
    notional: Fixed6,
) -> Result<TradeFee, ArithmeticError> {
    let before = calc_utilization(position)?;
    let after = calc_utilization(&position.with_delta(Side::Maker, position_delta)?)?;
    let impact_fee = coefficients.impact.mul(after.checked_sub(before)?)?;

    let total = notional
        .mul(impact_fee.checked_add(coefficients.linear)?)?
        .max(Fixed6::ZERO);

    Ok(TradeFee {
        total,
        linear_fee: coefficients.linear,
        skew_fee: None,
        impact_fee,
        adiabatic_fee: None,
        fee_basis_points: fee_basis_points(total, notional, coefficients.linear)?,
    })
}

fn taker_fee(
    position_delta: Fixed6,
    position: &AggregatePosition,
    side: Side,
    coefficients: &FeeCoefficients,
    virtual_taker: Fixed6,
    notional: Fixed6,
) -> Result<TradeFee, ArithmeticError> {
    let before = calc_skew(position, virtual_taker)?;
    let after = calc_skew(&position.with_delta(side, position_delta)?, virtual_taker)?;
    let (after_abs, before_abs) = (after.checked_abs()?, before.checked_abs()?);
    let exposure_change = after_abs.checked_sub(before_abs)?;

    let skew_fee = coefficients.skew.mul(after.checked_sub(before)?.checked_abs()?)?;
    let impact_fee = coefficients.impact.mul(exposure_change)?;
    // area under |skew| between before and after: (|a|^2 - |b|^2) / 2
    let exposure_area = after_abs
        .checked_add(before_abs)?
        .mul(exposure_change)?
        .div_int(2)?;
    let adiabatic_fee = coefficients.adiabatic.mul(exposure_area)?;

    let rate = Fixed6::checked_sum([coefficients.linear, skew_fee, impact_fee, adiabatic_fee])?;
    let total = notional.mul(rate)?.max(Fixed6::ZERO);

    Ok(TradeFee {
        total,
        linear_fee: coefficients.linear,
        skew_fee: Some(skew_fee),
        impact_fee,
        adiabatic_fee: Some(adiabatic_fee),
        fee_basis_points: fee_basis_points(total, notional, coefficients.linear)?,
    })
}

/// Fee for changing `side` by `position_delta` against the given aggregate.
pub fn calc_trade_fee(
    position_delta: Fixed6,
    position: &AggregatePosition,
    risk: &RiskParameter,
    side: Side,
    price: Fixed6,
) -> Result<TradeFee, ArithmeticError> {
    let coefficients = risk.fee_coefficients(side);
    if position_delta.is_zero() {
        return Ok(TradeFee::flat(coefficients.linear));
    }

    let notional = calc_notional(position_delta, price)?;

    match side {
        Side::Maker => maker_fee(position_delta, position, &coefficients, notional),
        Side::Long | Side::Short => taker_fee(
            position_delta,
            position,
            side,
            &coefficients,
            risk.virtual_taker,
            notional,
        ),
        Side::None => Ok(TradeFee::flat(coefficients.linear)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceImpact {
    /// Part of the fee charged at the flat rate.
    pub flat_fee: Fixed6,
    /// Remainder, which is what skews the effective fill.
    pub impact_fee: Fixed6,
    pub impact_per_unit: Fixed6,
    pub estimated_fill_price: Fixed6,
}

// 5.1: buying fills above the price, selling below. makers have no fill price.
pub fn calc_price_impact_from_trade_fee(
    total_fee: Fixed6,
    flat_rate: Fixed6,
    position_delta: Fixed6,
    price: Fixed6,
    side: Side,
) -> Result<PriceImpact, ArithmeticError> {
    let notional = calc_notional(position_delta, price)?;
    let flat_fee = notional.mul(flat_rate)?.min(total_fee);
    let impact_fee = total_fee.checked_sub(flat_fee)?;

    let impact_per_unit = if position_delta.is_zero() {
        Fixed6::ZERO
    } else {
        impact_fee.div(position_delta.checked_abs()?)?
    };

    let estimated_fill_price = match side {
        Side::Long if position_delta.is_positive() => price.checked_add(impact_per_unit)?,
        Side::Short if position_delta.is_negative() => price.checked_add(impact_per_unit)?,
        Side::Long | Side::Short => price.checked_sub(impact_per_unit)?,
        Side::Maker | Side::None => price,
    };

    Ok(PriceImpact {
        flat_fee,
        impact_fee,
        impact_per_unit,
        estimated_fill_price,
    })
}

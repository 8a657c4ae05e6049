// 4.0: funding and interest. takers pay a P-controller funding rate plus utilization
// interest, makers receive the counterpart net of the protocol's cut.
// 4.1 extrapolates funding, 4.2 prices the jump-rate curve, 4.3 combines per side.
// every rate here is annualized.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::market::{AggregatePosition, MarketParameter, MarketSnapshot, PAccumulator, PController, UtilizationCurve};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

pub const HOURS_PER_YEAR: i64 = 8_760;

/// Annualized rate per side. Positive means the side pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideRates {
    pub maker: Fixed6,
    pub long: Fixed6,
    pub short: Fixed6,
}

impl SideRates {
    pub fn hourly(&self) -> Result<SideRates, ArithmeticError> {
        Ok(SideRates {
            maker: self.maker.div_int(HOURS_PER_YEAR)?,
            long: self.long.div_int(HOURS_PER_YEAR)?,
            short: self.short.div_int(HOURS_PER_YEAR)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingAndInterest {
    /// Clamped P-controller funding, before fees.
    pub funding: Fixed6,
    pub utilization: Fixed6,
    /// Curve rate at `utilization`.
    pub interest_rate: Fixed6,
    /// Curve rate scaled by how much of taker open interest makers cover.
    pub taker_interest: Fixed6,
    pub total_funding_fee: Fixed6,
    pub rates: SideRates,
}

// 4.1: linear extrapolation of the controller between settlements, then clamp to ±max
pub fn extrapolate_funding(
    accumulator: &PAccumulator,
    controller: &PController,
    elapsed_secs: i64,
) -> Result<Fixed6, ArithmeticError> {
    let drift = accumulator.skew.mul_int(elapsed_secs)?.div(controller.k)?;
    let funding = accumulator.value.checked_add(drift)?;
    Ok(funding.clamp_to(controller.max.checked_neg()?, controller.max))
}

/// max(net, efficiency) utilization clamped to [0, 100%].
pub fn compute_utilization(
    position: &AggregatePosition,
    efficiency_limit: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    let major = position.major();
    let denominator = position.maker.checked_add(position.minor())?;

    let net = if denominator.is_zero() {
        Fixed6::ZERO
    } else {
        major.div(denominator)?
    };

    // no maker means nothing to be efficiency-bound against
    let efficiency = if position.maker.is_zero() {
        Fixed6::ZERO
    } else {
        major.mul(efficiency_limit)?.div(position.maker)?
    };

    Ok(net.max(efficiency).clamp_to(Fixed6::ZERO, Fixed6::ONE))
}

// 4.2: jump-rate curve
pub fn compute_interest_rate(
    curve: &UtilizationCurve,
    utilization: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    if utilization < Fixed6::ZERO {
        return Ok(curve.min_rate);
    }

    if utilization < curve.target_utilization {
        return linear_interpolation(
            Fixed6::ZERO,
            curve.min_rate,
            curve.target_utilization,
            curve.target_rate,
            utilization,
        );
    }

    if utilization < Fixed6::ONE {
        return linear_interpolation(
            curve.target_utilization,
            curve.target_rate,
            Fixed6::ONE,
            curve.max_rate,
            utilization,
        );
    }

    Ok(curve.max_rate)
}

pub fn linear_interpolation(
    start_x: Fixed6,
    start_y: Fixed6,
    end_x: Fixed6,
    end_y: Fixed6,
    target_x: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    if target_x < start_x || target_x > end_x {
        return Err(ArithmeticError::InterpolationOutOfBounds {
            x: target_x.raw(),
            start: start_x.raw(),
            end: end_x.raw(),
        });
    }

    let x_range = end_x.checked_sub(start_x)?;
    if x_range.is_zero() {
        return Ok(start_y);
    }

    let y_range = end_y.checked_sub(start_y)?;
    let x_ratio = target_x.checked_sub(start_x)?.div(x_range)?;
    y_range.mul(x_ratio)?.checked_add(start_y)
}

/// Interest is charged on the taker notional makers actually cover.
pub fn taker_interest_rate(
    interest_rate: Fixed6,
    position: &AggregatePosition,
) -> Result<Fixed6, ArithmeticError> {
    let takers = position.takers()?;
    if takers.is_zero() {
        return Ok(Fixed6::ZERO);
    }
    let covered = takers.min(position.maker);
    interest_rate.mul(covered)?.div(takers)
}

// maker receives the skew share of funding and all taker interest, less protocol fees
fn maker_rate(
    funding: Fixed6,
    taker_interest: Fixed6,
    position: &AggregatePosition,
    parameter: &MarketParameter,
    maker_receive_only: bool,
) -> Result<Fixed6, ArithmeticError> {
    if position.maker.is_zero() {
        return Ok(Fixed6::ZERO);
    }

    let mut funding_share = funding
        .mul(position.net()?)?
        .div(position.maker)?
        .mul(Fixed6::ONE.checked_sub(parameter.funding_fee)?)?;
    if maker_receive_only && funding_share.is_negative() {
        funding_share = Fixed6::ZERO;
    }

    let interest_share = taker_interest
        .mul(position.takers()?)?
        .div(position.maker)?
        .mul(Fixed6::ONE.checked_sub(parameter.interest_fee)?)?;

    funding_share.checked_add(interest_share)?.checked_neg()
}

// 4.3: per-side annualized rates from the pending aggregate
pub fn funding_and_interest_for_sides(
    market: &MarketSnapshot,
    now: Timestamp,
) -> Result<FundingAndInterest, ArithmeticError> {
    let risk = &market.risk;
    let position = &market.next_position;

    let elapsed = market.global.latest_version.elapsed_until(now);
    let funding = extrapolate_funding(&market.global.p_accumulator, &risk.p_controller, elapsed)?;

    let utilization = compute_utilization(position, risk.efficiency_limit)?;
    let interest_rate = compute_interest_rate(&risk.utilization_curve, utilization)?;
    let taker_interest = taker_interest_rate(interest_rate, position)?;

    let total_funding_fee = funding.checked_abs()?.mul(market.parameter.funding_fee)?.div_int(2)?;
    let taker_cost = total_funding_fee.checked_add(taker_interest)?;

    let rates = SideRates {
        long: funding.checked_add(taker_cost)?,
        short: funding.checked_neg()?.checked_add(taker_cost)?,
        maker: maker_rate(
            funding,
            taker_interest,
            position,
            &market.parameter,
            risk.maker_receive_only,
        )?,
    };

    Ok(FundingAndInterest {
        funding,
        utilization,
        interest_rate,
        taker_interest,
        total_funding_fee,
        rates,
    })
}

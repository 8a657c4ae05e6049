//! Liquidation price.
//!
//! The liquidation price is the mark at which collateral plus price PnL falls
//! to the maintenance requirement. While `notional * maintenance` sits below
//! `minMaintenance` the requirement is flat and the solution is linear in
//! price; above it the requirement scales with price and the general form
//! applies. Both branches are exact settlement behavior, not approximations.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::margin::calc_notional;
use crate::market::RiskParameter;
use crate::types::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationPrices {
    pub long: Fixed6,
    pub short: Fixed6,
}

impl LiquidationPrices {
    /// Makers have no single liquidation price.
    pub fn for_side(&self, side: Side) -> Fixed6 {
        match side {
            Side::Long => self.long,
            Side::Short => self.short,
            Side::Maker | Side::None => Fixed6::ZERO,
        }
    }
}

/// Flat requirement: `|(minMaintenance - collateral) / position ± price|`.
pub fn liquidation_price_below_floor(
    min_maintenance: Fixed6,
    collateral: Fixed6,
    position: Fixed6,
    price: Fixed6,
) -> Result<LiquidationPrices, ArithmeticError> {
    let shortfall = min_maintenance.checked_sub(collateral)?.div(position)?;
    let long = shortfall.checked_add(price)?.checked_abs()?;
    let short = shortfall.checked_neg()?.checked_add(price)?.checked_abs()?;
    Ok(LiquidationPrices { long, short })
}

/// Scaled requirement: long `|(p*P - c) / (p*(m - 1))|`, short `|(c + p*P) / (p*(m + 1))|`.
pub fn liquidation_price_above_floor(
    maintenance: Fixed6,
    collateral: Fixed6,
    position: Fixed6,
    price: Fixed6,
) -> Result<LiquidationPrices, ArithmeticError> {
    let position_value = position.mul(price)?;

    let long = position_value
        .checked_sub(collateral)?
        .div(position.mul(maintenance.checked_sub(Fixed6::ONE)?)?)?
        .checked_abs()?;
    let short = collateral
        .checked_add(position_value)?
        .div(position.mul(maintenance.checked_add(Fixed6::ONE)?)?)?
        .checked_abs()?;

    Ok(LiquidationPrices { long, short })
}

/// `price` is the latest price or a caller override such as a limit price.
/// no collateral (or a withdrawal past the balance) has no liquidation price.
pub fn calc_liquidation_price(
    risk: &RiskParameter,
    collateral: Fixed6,
    position: Fixed6,
    price: Fixed6,
) -> Result<LiquidationPrices, ArithmeticError> {
    if !collateral.is_positive() || position.is_zero() {
        return Ok(LiquidationPrices::default());
    }

    let maintenance = calc_notional(position, price)?.mul(risk.maintenance)?;
    if maintenance < risk.min_maintenance {
        liquidation_price_below_floor(risk.min_maintenance, collateral, position, price)
    } else {
        liquidation_price_above_floor(risk.maintenance, collateral, position, price)
    }
}

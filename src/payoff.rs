// 9.1: payoff transforms. a market may settle on a function of the oracle price
// rather than the price itself. transforms run at 18 decimals before narrowing.

use crate::fixed::{ArithmeticError, Fixed18};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payoff {
    #[default]
    Linear,
    /// 1 / p
    Inverse,
    /// p^2
    PowerTwo,
    /// sqrt(p)
    PowerHalf,
}

impl Payoff {
    /// Oracle price to market price.
    pub fn transform(&self, price: Fixed18) -> Result<Fixed18, ArithmeticError> {
        match self {
            Payoff::Linear => Ok(price),
            Payoff::Inverse => invert(price),
            Payoff::PowerTwo => price.mul(price),
            Payoff::PowerHalf => price.sqrt(),
        }
    }

    /// Market price back to oracle price. exact up to truncation.
    pub fn untransform(&self, price: Fixed18) -> Result<Fixed18, ArithmeticError> {
        match self {
            Payoff::Linear => Ok(price),
            Payoff::Inverse => invert(price),
            Payoff::PowerTwo => price.sqrt(),
            Payoff::PowerHalf => price.mul(price),
        }
    }
}

fn invert(price: Fixed18) -> Result<Fixed18, ArithmeticError> {
    if price.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }
    Fixed18::ONE.div(price)
}

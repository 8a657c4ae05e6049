//! Market inputs supplied fresh on every call.
//!
//! Everything here is read off chain or indexer state by the caller and treated
//! as immutable for the duration of one computation. The engine never advances
//! an accumulator or mutates a parameter; a new value is produced per version.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::payoff::Payoff;
use crate::pnl::VersionAccumulators;
use crate::types::{MarketId, OrderId, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Open interest by side at one settlement version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatePosition {
    pub timestamp: Timestamp,
    pub maker: Fixed6,
    pub long: Fixed6,
    pub short: Fixed6,
}

impl AggregatePosition {
    pub fn new(timestamp: Timestamp, maker: Fixed6, long: Fixed6, short: Fixed6) -> Self {
        Self { timestamp, maker, long, short }
    }

    pub fn major(&self) -> Fixed6 {
        self.long.max(self.short)
    }

    pub fn minor(&self) -> Fixed6 {
        self.long.min(self.short)
    }

    /// Signed imbalance, positive when longs dominate.
    pub fn net(&self) -> Result<Fixed6, ArithmeticError> {
        self.long.checked_sub(self.short)
    }

    pub fn takers(&self) -> Result<Fixed6, ArithmeticError> {
        self.long.checked_add(self.short)
    }

    pub fn get(&self, side: Side) -> Fixed6 {
        match side {
            Side::Maker => self.maker,
            Side::Long => self.long,
            Side::Short => self.short,
            Side::None => Fixed6::ZERO,
        }
    }

    /// Copy with `delta` applied to one side. `Side::None` returns the position unchanged.
    pub fn with_delta(&self, side: Side, delta: Fixed6) -> Result<Self, ArithmeticError> {
        let mut next = *self;
        match side {
            Side::Maker => next.maker = next.maker.checked_add(delta)?,
            Side::Long => next.long = next.long.checked_add(delta)?,
            Side::Short => next.short = next.short.checked_add(delta)?,
            Side::None => {}
        }
        Ok(next)
    }
}

/// Fee coefficients for one side of the book. Makers use `linear` and `impact`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCoefficients {
    pub linear: Fixed6,
    pub skew: Fixed6,
    pub impact: Fixed6,
    pub adiabatic: Fixed6,
}

/// Jump-rate curve: piecewise linear through (0, min), (target, targetRate), (100%, max).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilizationCurve {
    pub min_rate: Fixed6,
    pub max_rate: Fixed6,
    pub target_rate: Fixed6,
    pub target_utilization: Fixed6,
}

/// Funding P-controller. `k` is the seconds-to-saturation gain; funding is clamped to ±max.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PController {
    pub k: Fixed6,
    pub min: Fixed6,
    pub max: Fixed6,
}

/// Per-market risk configuration. Owned by the market, read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskParameter {
    pub margin: Fixed6,
    pub maintenance: Fixed6,
    pub min_margin: Fixed6,
    pub min_maintenance: Fixed6,
    pub efficiency_limit: Fixed6,
    pub taker_fee: FeeCoefficients,
    pub maker_fee: FeeCoefficients,
    pub utilization_curve: UtilizationCurve,
    pub p_controller: PController,
    pub virtual_taker: Fixed6,
    /// Seconds after publish before an oracle price is stale.
    pub stale_after: i64,
    /// Makers only ever receive funding, never pay it.
    pub maker_receive_only: bool,
}

impl RiskParameter {
    pub fn fee_coefficients(&self, side: Side) -> FeeCoefficients {
        match side {
            Side::Maker => self.maker_fee,
            Side::Long | Side::Short => self.taker_fee,
            Side::None => FeeCoefficients::default(),
        }
    }
}

/// Fee split and operational flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParameter {
    pub funding_fee: Fixed6,
    pub interest_fee: Fixed6,
    pub maker_fee: Fixed6,
    pub taker_fee: Fixed6,
    pub risk_fee: Fixed6,
    /// Flat keeper cost charged per order that changes position.
    pub settlement_fee: Fixed6,
    pub closed: bool,
    pub settle_only: bool,
}

impl MarketParameter {
    /// Flat protocol fee rate for a side.
    pub fn flat_fee(&self, side: Side) -> Fixed6 {
        match side {
            Side::Maker => self.maker_fee,
            Side::Long | Side::Short => self.taker_fee,
            Side::None => Fixed6::ZERO,
        }
    }

    /// Whether new exposure may be added.
    pub fn accepts_increase(&self) -> bool {
        !self.closed && !self.settle_only
    }
}

/// Funding-rate integral state, advanced only by settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PAccumulator {
    pub value: Fixed6,
    pub skew: Fixed6,
}

/// Market-wide running state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Global {
    pub p_accumulator: PAccumulator,
    pub latest_price: Fixed6,
    /// Version at which `p_accumulator` and `latest_price` were captured.
    pub latest_version: Timestamp,
    pub current_id: OrderId,
    pub latest_id: OrderId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleVersion {
    pub timestamp: Timestamp,
    pub price: Fixed6,
    pub valid: bool,
}

/// Everything the engine needs to know about one market for one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub id: MarketId,
    pub risk: RiskParameter,
    pub parameter: MarketParameter,
    pub global: Global,
    /// Latest settled aggregate.
    pub position: AggregatePosition,
    /// Aggregate including orders not yet settled.
    pub next_position: AggregatePosition,
    /// Latest oracle version the market has seen, committed or not.
    pub latest_oracle_version: OracleVersion,
    /// Per-unit accumulators at `global.latest_version`.
    pub accumulators: VersionAccumulators,
    pub payoff: Payoff,
}

impl MarketSnapshot {
    pub fn latest_price(&self) -> Fixed6 {
        self.global.latest_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(n: i64) -> Fixed6 {
        Fixed6::from_units(n)
    }

    #[test]
    fn major_minor() {
        let pos = AggregatePosition::new(Timestamp(0), u(1000), u(600), u(400));
        assert_eq!(pos.major(), u(600));
        assert_eq!(pos.minor(), u(400));
        assert_eq!(pos.net().unwrap(), u(200));
        assert_eq!(pos.takers().unwrap(), u(1000));
    }

    #[test]
    fn delta_applies_to_one_side() {
        let pos = AggregatePosition::new(Timestamp(0), u(1000), u(600), u(400));
        assert_eq!(pos.with_delta(Side::Maker, u(100)).unwrap().maker, u(1100));
        assert_eq!(pos.with_delta(Side::Short, u(-50)).unwrap().short, u(350));
        assert_eq!(pos.with_delta(Side::None, u(5)).unwrap(), pos);

        let full = AggregatePosition::new(Timestamp(0), Fixed6::ZERO, Fixed6::from_raw(i128::MAX), u(1));
        assert_eq!(full.with_delta(Side::Long, u(1)), Err(ArithmeticError::Overflow));
        assert_eq!(full.takers(), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn fee_coefficients_by_side() {
        let mut risk = RiskParameter::default();
        risk.taker_fee.linear = u(1);
        risk.maker_fee.linear = u(2);
        assert_eq!(risk.fee_coefficients(Side::Long).linear, u(1));
        assert_eq!(risk.fee_coefficients(Side::Short).linear, u(1));
        assert_eq!(risk.fee_coefficients(Side::Maker).linear, u(2));
        assert_eq!(risk.fee_coefficients(Side::None), FeeCoefficients::default());
    }

    #[test]
    fn operational_flags() {
        let mut parameter = MarketParameter::default();
        assert!(parameter.accepts_increase());
        parameter.settle_only = true;
        assert!(!parameter.accepts_increase());
        parameter.settle_only = false;
        parameter.closed = true;
        assert!(!parameter.accepts_increase());
    }
}

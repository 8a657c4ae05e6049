//! Profit and loss.
//!
//! Realized PnL comes from the indexer as per-version accumulation deltas,
//! each split six ways. Unrealized PnL bridges the account's last settlement
//! to the market's last settlement by multiplying the change in per-unit
//! accumulators by the size held. Live PnL marks the held size from the
//! last settled price to a fresher one.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::types::{Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Running per-unit totals for one side. only differences between two versions are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideAccumulator {
    pub pnl: Fixed6,
    pub funding: Fixed6,
    pub interest: Fixed6,
    /// Maker only.
    pub position_fee: Fixed6,
    /// Maker only.
    pub exposure: Fixed6,
}

impl SideAccumulator {
    fn since(&self, earlier: &SideAccumulator) -> Result<SideAccumulator, ArithmeticError> {
        Ok(SideAccumulator {
            pnl: self.pnl.checked_sub(earlier.pnl)?,
            funding: self.funding.checked_sub(earlier.funding)?,
            interest: self.interest.checked_sub(earlier.interest)?,
            position_fee: self.position_fee.checked_sub(earlier.position_fee)?,
            exposure: self.exposure.checked_sub(earlier.exposure)?,
        })
    }
}

/// Accumulator values for every side at one version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAccumulators {
    pub timestamp: Timestamp,
    pub maker: SideAccumulator,
    pub long: SideAccumulator,
    pub short: SideAccumulator,
}

impl VersionAccumulators {
    pub fn get(&self, side: Side) -> SideAccumulator {
        match side {
            Side::Maker => self.maker,
            Side::Long => self.long,
            Side::Short => self.short,
            Side::None => SideAccumulator::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlBreakdown {
    /// Difference between fill price and settlement price on position changes.
    pub offset: Fixed6,
    pub pnl: Fixed6,
    pub funding: Fixed6,
    pub interest: Fixed6,
    pub maker_position_fee: Fixed6,
    pub maker_exposure: Fixed6,
}

impl PnlBreakdown {
    pub fn total(&self) -> Result<Fixed6, ArithmeticError> {
        Fixed6::checked_sum([
            self.offset,
            self.pnl,
            self.funding,
            self.interest,
            self.maker_position_fee,
            self.maker_exposure,
        ])
    }

    /// Field-wise sum.
    pub fn checked_add(&self, other: &Self) -> Result<Self, ArithmeticError> {
        Ok(Self {
            offset: self.offset.checked_add(other.offset)?,
            pnl: self.pnl.checked_add(other.pnl)?,
            funding: self.funding.checked_add(other.funding)?,
            interest: self.interest.checked_add(other.interest)?,
            maker_position_fee: self.maker_position_fee.checked_add(other.maker_position_fee)?,
            maker_exposure: self.maker_exposure.checked_add(other.maker_exposure)?,
        })
    }
}

/// One indexer entry: what an account accrued at `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulationDelta {
    pub version: Timestamp,
    pub breakdown: PnlBreakdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedPnl {
    pub breakdown: PnlBreakdown,
    /// Number of versions summed.
    pub versions: usize,
}

impl RealizedPnl {
    /// Sums entries with `from < version <= to`. order of `history` does not matter.
    pub fn from_history(
        history: &[AccumulationDelta],
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Self, ArithmeticError> {
        history
            .iter()
            .filter(|entry| entry.version > from && entry.version <= to)
            .try_fold(Self::default(), |acc, entry| {
                Ok(Self {
                    breakdown: acc.breakdown.checked_add(&entry.breakdown)?,
                    versions: acc.versions + 1,
                })
            })
    }

    pub fn total(&self) -> Result<Fixed6, ArithmeticError> {
        self.breakdown.total()
    }
}

/// Accrual between the account's checkpoint and the market's latest version
/// for `magnitude` held on `side`. zero if the checkpoint is not older.
pub fn unrealized_between(
    checkpoint: &VersionAccumulators,
    latest: &VersionAccumulators,
    side: Side,
    magnitude: Fixed6,
) -> Result<PnlBreakdown, ArithmeticError> {
    if checkpoint.timestamp >= latest.timestamp || magnitude.is_zero() {
        return Ok(PnlBreakdown::default());
    }

    let delta = latest.get(side).since(&checkpoint.get(side))?;
    let (maker_position_fee, maker_exposure) = match side {
        Side::Maker => (delta.position_fee.mul(magnitude)?, delta.exposure.mul(magnitude)?),
        Side::Long | Side::Short | Side::None => (Fixed6::ZERO, Fixed6::ZERO),
    };

    Ok(PnlBreakdown {
        offset: Fixed6::ZERO,
        pnl: delta.pnl.mul(magnitude)?,
        funding: delta.funding.mul(magnitude)?,
        interest: delta.interest.mul(magnitude)?,
        maker_position_fee,
        maker_exposure,
    })
}

/// PnL from `settled_price` to `live_price`. makers carry `maker_exposure`,
/// the signed amount from `liquidity::calc_maker_exposure`.
pub fn live_price_pnl(
    side: Side,
    magnitude: Fixed6,
    maker_exposure: Fixed6,
    settled_price: Fixed6,
    live_price: Fixed6,
) -> Result<Fixed6, ArithmeticError> {
    let price_move = live_price.checked_sub(settled_price)?;
    match side {
        Side::Long => magnitude.mul(price_move),
        Side::Short => magnitude.mul(price_move)?.checked_neg(),
        Side::Maker => maker_exposure.mul(price_move),
        Side::None => Ok(Fixed6::ZERO),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPnl {
    pub realized: PnlBreakdown,
    pub unrealized: PnlBreakdown,
    pub live: Fixed6,
}

impl PositionPnl {
    pub fn total(&self) -> Result<Fixed6, ArithmeticError> {
        Fixed6::checked_sum([self.realized.total()?, self.unrealized.total()?, self.live])
    }
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

    fn accumulators(timestamp: i64, pnl: &str, funding: &str, exposure: &str) -> VersionAccumulators {
        let side = SideAccumulator {
            pnl: f6(pnl),
            funding: f6(funding),
            interest: f6("-0.01"),
            position_fee: f6("0.002"),
            exposure: f6(exposure),
        };
        VersionAccumulators { timestamp: Timestamp(timestamp), maker: side, long: side, short: side }
    }

    fn entry(version: i64, pnl: i64) -> AccumulationDelta {
        AccumulationDelta {
            version: Timestamp(version),
            breakdown: PnlBreakdown { pnl: u(pnl), funding: u(-1), ..PnlBreakdown::default() },
        }
    }

    #[test]
    fn test_breakdown_total() {
        let b = PnlBreakdown {
            offset: u(1),
            pnl: u(2),
            funding: u(-3),
            interest: u(-1),
            maker_position_fee: u(4),
            maker_exposure: u(5),
        };
        assert_eq!(b.total().unwrap(), u(8));
        assert_eq!(b.checked_add(&b).unwrap().total().unwrap(), u(16));
    }

    #[test]
    fn test_realized_window_is_half_open() {
        let history = [entry(100, 10), entry(200, 20), entry(300, 30)];
        let realized = RealizedPnl::from_history(&history, Timestamp(100), Timestamp(300)).unwrap();
        assert_eq!(realized.versions, 2);
        assert_eq!(realized.breakdown.pnl, u(50));
        assert_eq!(realized.breakdown.funding, u(-2));
        assert_eq!(realized.total().unwrap(), u(48));

        let empty = RealizedPnl::from_history(&history, Timestamp(300), Timestamp(400)).unwrap();
        assert_eq!(empty, RealizedPnl::default());
    }

    #[test]
    fn test_unrealized_scales_by_magnitude() {
        let checkpoint = accumulators(100, "1", "0.5", "0");
        let latest = accumulators(200, "3", "0.25", "0.1");

        let long = unrealized_between(&checkpoint, &latest, Side::Long, u(10)).unwrap();
        assert_eq!(long.pnl, u(20));
        assert_eq!(long.funding, f6("-2.5"));
        assert_eq!(long.interest, Fixed6::ZERO);
        assert_eq!(long.maker_exposure, Fixed6::ZERO);

        let maker = unrealized_between(&checkpoint, &latest, Side::Maker, u(10)).unwrap();
        assert_eq!(maker.maker_exposure, u(1));
        assert_eq!(maker.maker_position_fee, Fixed6::ZERO);
    }

    #[test]
    fn test_unrealized_zero_when_caught_up() {
        let a = accumulators(200, "1", "0", "0");
        let b = accumulators(200, "5", "0", "0");
        assert_eq!(unrealized_between(&a, &b, Side::Long, u(10)).unwrap(), PnlBreakdown::default());
        assert_eq!(unrealized_between(&a, &b, Side::None, u(10)).unwrap(), PnlBreakdown::default());
    }

    #[test]
    fn test_live_price_pnl_by_side() {
        assert_eq!(live_price_pnl(Side::Long, u(10), Fixed6::ZERO, u(2000), u(2010)).unwrap(), u(100));
        assert_eq!(live_price_pnl(Side::Short, u(10), Fixed6::ZERO, u(2000), u(2010)).unwrap(), u(-100));
        // maker net short 20
        assert_eq!(live_price_pnl(Side::Maker, u(100), u(-20), u(2000), u(2010)).unwrap(), u(-200));
        assert_eq!(live_price_pnl(Side::None, u(10), u(5), u(2000), u(2010)).unwrap(), Fixed6::ZERO);
    }

    #[test]
    fn test_position_pnl_total() {
        let pnl = PositionPnl {
            realized: PnlBreakdown { pnl: u(5), ..PnlBreakdown::default() },
            unrealized: PnlBreakdown { funding: u(-2), ..PnlBreakdown::default() },
            live: u(10),
        };
        assert_eq!(pnl.total().unwrap(), u(13));
    }

    #[test]
    fn test_history_past_the_raw_range_is_an_error() {
        let mut history = [entry(100, 10), entry(200, 20)];
        history[0].breakdown.pnl = Fixed6::from_raw(i128::MAX);
        assert_eq!(
            RealizedPnl::from_history(&history, Timestamp(0), Timestamp(300)),
            Err(ArithmeticError::Overflow)
        );

        let checkpoint = accumulators(100, "2", "0", "0");
        let mut latest = accumulators(200, "0", "0", "0");
        latest.long.pnl = Fixed6::from_raw(i128::MIN + 1_000_000);
        assert_eq!(
            unrealized_between(&checkpoint, &latest, Side::Long, u(1)),
            Err(ArithmeticError::Overflow)
        );
    }
}

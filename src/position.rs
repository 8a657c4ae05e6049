// 7.0: account-side position state. the settled position is authoritative,
// pending orders are signed deltas folded on top of it oldest first.
// 7.1 resolves side and magnitude, 7.2 folds pending orders into the next position.

use crate::fixed::{ArithmeticError, Fixed6};
use crate::types::{OrderId, Side, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("position has more than one nonzero side: maker {maker}, long {long}, short {short}")]
    MultipleSides { maker: Fixed6, long: Fixed6, short: Fixed6 },

    #[error("pending orders drive the {side} position below zero")]
    NegativePosition { side: Side },

    #[error("pending order at {pending} is not after the settled position at {settled}")]
    PendingNotAfterSettled { pending: Timestamp, settled: Timestamp },

    #[error("pending orders leave the representable range: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Per-account collateral and order counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Local {
    pub current_id: OrderId,
    pub latest_id: OrderId,
    pub collateral: Fixed6,
    pub claimable: Fixed6,
}

impl Local {
    /// Orders submitted but not yet settled.
    pub fn has_pending(&self) -> bool {
        self.current_id > self.latest_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPosition {
    pub timestamp: Timestamp,
    pub maker: Fixed6,
    pub long: Fixed6,
    pub short: Fixed6,
}

impl AccountPosition {
    pub fn new(timestamp: Timestamp, maker: Fixed6, long: Fixed6, short: Fixed6) -> Self {
        Self { timestamp, maker, long, short }
    }

    pub fn empty(timestamp: Timestamp) -> Self {
        Self { timestamp, ..Self::default() }
    }

    pub fn get(&self, side: Side) -> Fixed6 {
        match side {
            Side::Maker => self.maker,
            Side::Long => self.long,
            Side::Short => self.short,
            Side::None => Fixed6::ZERO,
        }
    }

    // 7.1: at most one side may be nonzero. more than one is bad input, not something to pick from.
    pub fn side(&self) -> Result<Side, IntegrityError> {
        let sides = [
            (Side::Maker, self.maker),
            (Side::Long, self.long),
            (Side::Short, self.short),
        ];
        let mut nonzero = sides.iter().filter(|(_, size)| !size.is_zero());

        match (nonzero.next(), nonzero.next()) {
            (None, _) => Ok(Side::None),
            (Some((side, _)), None) => Ok(*side),
            (Some(_), Some(_)) => Err(IntegrityError::MultipleSides {
                maker: self.maker,
                long: self.long,
                short: self.short,
            }),
        }
    }

    pub fn magnitude(&self) -> Result<Fixed6, IntegrityError> {
        Ok(self.get(self.side()?))
    }

    pub fn is_empty(&self) -> bool {
        self.maker.is_zero() && self.long.is_zero() && self.short.is_zero()
    }
}

/// An order submitted but not yet reflected in settled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    pub timestamp: Timestamp,
    pub maker_pos: Fixed6,
    pub maker_neg: Fixed6,
    pub long_pos: Fixed6,
    pub long_neg: Fixed6,
    pub short_pos: Fixed6,
    pub short_neg: Fixed6,
    pub collateral: Fixed6,
}

impl PendingOrder {
    /// Order that moves one side by a signed `delta`.
    pub fn for_side(timestamp: Timestamp, side: Side, delta: Fixed6, collateral: Fixed6) -> Self {
        let (pos, neg) = if delta.is_negative() {
            (Fixed6::ZERO, delta.abs())
        } else {
            (delta, Fixed6::ZERO)
        };

        let mut order = Self { timestamp, collateral, ..Self::default() };
        match side {
            Side::Maker => {
                order.maker_pos = pos;
                order.maker_neg = neg;
            }
            Side::Long => {
                order.long_pos = pos;
                order.long_neg = neg;
            }
            Side::Short => {
                order.short_pos = pos;
                order.short_neg = neg;
            }
            Side::None => {}
        }
        order
    }

    fn legs(&self) -> [(Fixed6, Fixed6); 3] {
        [
            (self.maker_pos, self.maker_neg),
            (self.long_pos, self.long_neg),
            (self.short_pos, self.short_neg),
        ]
    }

    pub fn maker_delta(&self) -> Result<Fixed6, ArithmeticError> {
        self.maker_pos.checked_sub(self.maker_neg)
    }

    pub fn long_delta(&self) -> Result<Fixed6, ArithmeticError> {
        self.long_pos.checked_sub(self.long_neg)
    }

    pub fn short_delta(&self) -> Result<Fixed6, ArithmeticError> {
        self.short_pos.checked_sub(self.short_neg)
    }

    pub fn delta(&self, side: Side) -> Result<Fixed6, ArithmeticError> {
        match side {
            Side::Maker => self.maker_delta(),
            Side::Long => self.long_delta(),
            Side::Short => self.short_delta(),
            Side::None => Ok(Fixed6::ZERO),
        }
    }

    pub fn changes_position(&self) -> bool {
        self.legs().iter().any(|(pos, neg)| pos != neg)
    }

    pub fn is_empty(&self) -> bool {
        !self.changes_position() && self.collateral.is_zero()
    }

    /// Adds exposure on any side.
    pub fn increases_exposure(&self) -> bool {
        self.legs().iter().any(|(pos, neg)| pos > neg)
    }
}

/// Settled when nothing is in flight, pending otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Settled,
    Pending { orders: usize },
}

impl AccountState {
    /// Orders carrying neither a position delta nor collateral do not count.
    pub fn from_pending(pending: &[PendingOrder]) -> Self {
        match pending.iter().filter(|order| !order.is_empty()).count() {
            0 => AccountState::Settled,
            orders => AccountState::Pending { orders },
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AccountState::Pending { .. })
    }
}

// 7.2: fold pending orders onto the settled position
pub fn apply_pending(
    settled: &AccountPosition,
    pending: &[PendingOrder],
) -> Result<AccountPosition, IntegrityError> {
    let mut next = *settled;

    for order in pending {
        if order.timestamp <= settled.timestamp {
            return Err(IntegrityError::PendingNotAfterSettled {
                pending: order.timestamp,
                settled: settled.timestamp,
            });
        }

        next.maker = next.maker.checked_add(order.maker_delta()?)?;
        next.long = next.long.checked_add(order.long_delta()?)?;
        next.short = next.short.checked_add(order.short_delta()?)?;
        next.timestamp = next.timestamp.max(order.timestamp);

        for side in [Side::Maker, Side::Long, Side::Short] {
            if next.get(side).is_negative() {
                return Err(IntegrityError::NegativePosition { side });
            }
        }
    }

    // single-sidedness is checked on the result, an order may close one side before another opens
    next.side()?;
    Ok(next)
}

/// Collateral after every pending deposit and withdrawal.
pub fn pending_collateral(local: &Local, pending: &[PendingOrder]) -> Result<Fixed6, ArithmeticError> {
    pending
        .iter()
        .try_fold(local.collateral, |total, order| total.checked_add(order.collateral))
}

/// Settled and next views of one account's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub side: Side,
    pub magnitude: Fixed6,
    pub next_side: Side,
    pub next_magnitude: Fixed6,
    pub state: AccountState,
}

impl ResolvedPosition {
    /// Size that can be closed without touching the pending portion.
    pub fn closeable(&self) -> Fixed6 {
        self.magnitude.min(self.next_magnitude)
    }

    pub fn is_consistent(&self) -> bool {
        self.magnitude == self.next_magnitude
    }
}

pub fn resolve(
    settled: &AccountPosition,
    pending: &[PendingOrder],
) -> Result<ResolvedPosition, IntegrityError> {
    let side = settled.side()?;
    let next = apply_pending(settled, pending)?;
    let next_side = next.side()?;

    Ok(ResolvedPosition {
        side,
        magnitude: settled.get(side),
        next_side,
        next_magnitude: next.get(next_side),
        state: AccountState::from_pending(pending),
    })
}

// 8.0.2: inputs, result types and errors for reconciler operations.

use crate::config::ConfigError;
use crate::fees::{PriceImpact, TradeFee};
use crate::fixed::{ArithmeticError, Fixed6};
use crate::funding::FundingAndInterest;
use crate::liquidation::LiquidationPrices;
use crate::liquidity::TakerLiquidity;
use crate::pnl::{AccumulationDelta, PositionPnl, VersionAccumulators};
use crate::position::{AccountPosition, AccountState, IntegrityError, Local, PendingOrder};
use crate::status::{PositionStatus, PriceUpdate};
use crate::types::{MarketId, Side, Timestamp};
use serde::{Deserialize, Serialize};

/// Everything known about one account in one market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub local: Local,
    /// Latest settled position.
    pub position: AccountPosition,
    /// Oldest first.
    pub pending: Vec<PendingOrder>,
    /// Market accumulators at the account's last settlement.
    pub checkpoint: VersionAccumulators,
    /// Indexer accumulation entries for realized PnL.
    pub history: Vec<AccumulationDelta>,
    /// Start of the realized window, exclusive.
    pub realized_since: Timestamp,
    /// Outcome of the price commitment for the latest pending order.
    pub price_update: PriceUpdate,
}

impl AccountSnapshot {
    /// Most recent pending order that carries anything.
    pub fn latest_pending(&self) -> Option<&PendingOrder> {
        self.pending.iter().rev().find(|order| !order.is_empty())
    }
}

/// Hypothetical order to preview on top of settled and pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub side: Side,
    /// Signed change to the side's size.
    pub delta: Fixed6,
    /// Deposit when positive, withdrawal when negative.
    pub collateral_delta: Fixed6,
    /// Limit or trigger price to quote against instead of the latest price.
    pub price_override: Option<Fixed6>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub side: Side,
    pub magnitude: Fixed6,
    pub next_side: Side,
    pub next_magnitude: Fixed6,
    pub maintenance: Fixed6,
    pub next_maintenance: Fixed6,
    pub margin: Fixed6,
    pub next_margin: Fixed6,
    pub leverage: Fixed6,
    pub next_leverage: Fixed6,
    pub notional: Fixed6,
    pub next_notional: Fixed6,
    pub collateral: Fixed6,
    pub next_collateral: Fixed6,
    pub closeable: Fixed6,
    pub state: AccountState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPreview {
    pub snapshot: PositionSnapshot,
    pub status: PositionStatus,
    pub has_version_error: bool,
    /// Price the preview was marked at.
    pub price: Fixed6,
    /// For the next position.
    pub liquidation: LiquidationPrices,
    pub pnl: PositionPnl,
    pub rates: FundingAndInterest,
    /// Signed maker exposure amount, zero for takers.
    pub maker_exposure: Fixed6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCost {
    pub trade_fee: TradeFee,
    pub price_impact: PriceImpact,
    /// Flat keeper cost, charged once per order that changes position.
    pub settlement_fee: Fixed6,
    pub total: Fixed6,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPreview {
    pub snapshot: PositionSnapshot,
    pub status: PositionStatus,
    pub cost: OrderCost,
    pub liquidation: LiquidationPrices,
    pub max_leverage: Fixed6,
    /// Book after the order.
    pub liquidity: TakerLiquidity,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("Data integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Market {0} is closed, exposure cannot increase")]
    MarketClosed(MarketId),

    #[error("Market {0} is settle-only, exposure cannot increase")]
    SettleOnly(MarketId),
}

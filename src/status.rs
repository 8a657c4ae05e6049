// 7.2: position status. a total function of the settled and next magnitudes,
// collateral, the version-error flag and the latest price update outcome.
// advisory conditions land here as a status, never as an error.

use crate::fixed::Fixed6;
use crate::market::OracleVersion;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Revert codes meaning the order failed margin checks at settlement.
pub const MARGIN_ERROR_CODES: [&str; 3] = [
    "MarketInsufficientMarginError",
    "MarketInsufficientMaintenanceError",
    "MarketInsufficientCollateralError",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Opening,
    Open,
    Closing,
    Pricing,
    Closed,
    Resolved,
    Failed,
    NotMargined,
    SyncError,
}

impl PositionStatus {
    pub const ALL: [PositionStatus; 9] = [
        PositionStatus::Opening,
        PositionStatus::Open,
        PositionStatus::Closing,
        PositionStatus::Pricing,
        PositionStatus::Closed,
        PositionStatus::Resolved,
        PositionStatus::Failed,
        PositionStatus::NotMargined,
        PositionStatus::SyncError,
    ];

    /// Waiting on settlement.
    pub fn is_transitional(&self) -> bool {
        matches!(self, PositionStatus::Opening | PositionStatus::Closing | PositionStatus::Pricing)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PositionStatus::Failed | PositionStatus::NotMargined | PositionStatus::SyncError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Opening => "opening",
            PositionStatus::Open => "open",
            PositionStatus::Closing => "closing",
            PositionStatus::Pricing => "pricing",
            PositionStatus::Closed => "closed",
            PositionStatus::Resolved => "resolved",
            PositionStatus::Failed => "failed",
            PositionStatus::NotMargined => "not_margined",
            PositionStatus::SyncError => "sync_error",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the latest price commitment for a pending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUpdate {
    #[default]
    Committed,
    MarginError(String),
    Failed(String),
}

impl PriceUpdate {
    /// `"0x"` and the empty string mean success.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() || code == "0x" {
            return PriceUpdate::Committed;
        }
        if MARGIN_ERROR_CODES.iter().any(|known| code.contains(known)) {
            PriceUpdate::MarginError(code.to_string())
        } else {
            PriceUpdate::Failed(code.to_string())
        }
    }
}

/// `magnitude == next_magnitude` is the only settled state. anything else is in flight or failed.
pub fn status_for_snapshot(
    magnitude: Fixed6,
    next_magnitude: Fixed6,
    collateral: Fixed6,
    has_version_error: bool,
    price_update: &PriceUpdate,
) -> PositionStatus {
    if magnitude != next_magnitude {
        return match price_update {
            PriceUpdate::MarginError(_) => PositionStatus::NotMargined,
            PriceUpdate::Failed(_) => PositionStatus::Failed,
            PriceUpdate::Committed if has_version_error => PositionStatus::SyncError,
            PriceUpdate::Committed if magnitude.is_zero() => PositionStatus::Opening,
            PriceUpdate::Committed if next_magnitude.is_zero() => PositionStatus::Closing,
            PriceUpdate::Committed => PositionStatus::Pricing,
        };
    }

    if !magnitude.is_zero() {
        PositionStatus::Open
    } else if !collateral.is_zero() {
        PositionStatus::Closed
    } else {
        PositionStatus::Resolved
    }
}

/// The pending order predates the market's latest oracle version, has sat
/// past the grace window, and the position still has not caught up.
pub fn has_version_error(
    pending_timestamp: Timestamp,
    latest_oracle_version: &OracleVersion,
    now: Timestamp,
    grace_secs: i64,
    magnitude: Fixed6,
    next_magnitude: Fixed6,
) -> bool {
    pending_timestamp < latest_oracle_version.timestamp
        && pending_timestamp.elapsed_until(now) > grace_secs
        && magnitude != next_magnitude
}

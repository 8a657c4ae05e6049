// 8.0 engine/core.rs: the reconciler. holds only its config; every call takes
// its own market and account snapshot and returns a freshly built result.

use super::config::EngineConfig;
use super::results::{EngineError, PositionSnapshot};
use crate::fixed::Fixed6;
use crate::margin::{calc_leverage, calc_maintenance, calc_margin, calc_notional};
use crate::market::RiskParameter;
use crate::position::{resolve, AccountPosition, PendingOrder};

/** 8.1: merges settled state with pending orders. safe to share across threads */
#[derive(Debug, Clone, Default)]
pub struct PositionReconciler {
    pub(super) config: EngineConfig,
}

impl PositionReconciler {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // 8.2: settled and next figures side by side, all at one price
    pub(super) fn build_snapshot(
        &self,
        risk: &RiskParameter,
        settled: &AccountPosition,
        pending: &[PendingOrder],
        collateral: Fixed6,
        next_collateral: Fixed6,
        price: Fixed6,
    ) -> Result<PositionSnapshot, EngineError> {
        let resolved = resolve(settled, pending)?;
        let magnitude = resolved.magnitude;
        let next_magnitude = resolved.next_magnitude;

        Ok(PositionSnapshot {
            side: resolved.side,
            magnitude,
            next_side: resolved.next_side,
            next_magnitude,
            maintenance: calc_maintenance(risk, magnitude, price)?,
            next_maintenance: calc_maintenance(risk, next_magnitude, price)?,
            margin: calc_margin(risk, magnitude, price)?,
            next_margin: calc_margin(risk, next_magnitude, price)?,
            leverage: calc_leverage(price, magnitude, collateral)?,
            next_leverage: calc_leverage(price, next_magnitude, next_collateral)?,
            notional: calc_notional(magnitude, price)?,
            next_notional: calc_notional(next_magnitude, price)?,
            collateral,
            next_collateral,
            closeable: resolved.closeable(),
            state: resolved.state,
        })
    }
}

//! Order previews: what a hypothetical order would cost and leave behind.

use super::core::PositionReconciler;
use super::results::{AccountSnapshot, EngineError, OrderCost, OrderPreview, OrderRequest};
use crate::fees::{calc_price_impact_from_trade_fee, calc_trade_fee};
use crate::fixed::Fixed6;
use crate::liquidation::calc_liquidation_price;
use crate::liquidity::calc_taker_liquidity;
use crate::margin::calc_max_leverage;
use crate::market::MarketSnapshot;
use crate::position::{pending_collateral, PendingOrder};
use crate::status::{status_for_snapshot, PriceUpdate};
use crate::types::Timestamp;
use tracing::{debug, warn};

impl PositionReconciler {
    /// Previews `order` layered on top of the settled position and every
    /// pending order. Fees come out of the order's collateral.
    pub fn preview_order(
        &self,
        market: &MarketSnapshot,
        account: &AccountSnapshot,
        order: &OrderRequest,
        now: Timestamp,
    ) -> Result<OrderPreview, EngineError> {
        if order.delta.is_positive() && !market.parameter.accepts_increase() {
            warn!(market = %market.id, side = %order.side, delta = %order.delta, "exposure increase on a restricted market");
            return Err(if market.parameter.closed {
                EngineError::MarketClosed(market.id)
            } else {
                EngineError::SettleOnly(market.id)
            });
        }

        let price = order.price_override.unwrap_or_else(|| market.latest_price());
        let cost = self.order_cost(market, order, price)?;

        let mut pending = account.pending.clone();
        pending.push(PendingOrder::for_side(
            next_order_timestamp(account, now),
            order.side,
            order.delta,
            order.collateral_delta.checked_sub(cost.total)?,
        ));

        let next_collateral = pending_collateral(&account.local, &pending)?;
        let snapshot = self.build_snapshot(
            &market.risk,
            &account.position,
            &pending,
            account.local.collateral,
            next_collateral,
            price,
        )?;

        let status = status_for_snapshot(
            snapshot.magnitude,
            snapshot.next_magnitude,
            snapshot.next_collateral,
            false,
            &PriceUpdate::Committed,
        );

        let liquidation = calc_liquidation_price(&market.risk, next_collateral, snapshot.next_magnitude, price)?;
        let max_leverage = calc_max_leverage(
            market.risk.margin,
            market.risk.min_margin,
            next_collateral,
            self.config.max_leverage_cap,
        )?;
        let liquidity = calc_taker_liquidity(
            &market.next_position.with_delta(order.side, order.delta)?,
            market.risk.efficiency_limit,
        )?;

        debug!(
            side = %order.side,
            delta = %order.delta,
            fee = %cost.total,
            next_magnitude = %snapshot.next_magnitude,
            status = %status,
            "previewed order"
        );

        Ok(OrderPreview {
            snapshot,
            status,
            cost,
            liquidation,
            max_leverage,
            liquidity,
        })
    }

    /// Trade fee against the pending aggregate plus the flat settlement fee.
    pub fn order_cost(
        &self,
        market: &MarketSnapshot,
        order: &OrderRequest,
        price: Fixed6,
    ) -> Result<OrderCost, EngineError> {
        let trade_fee = calc_trade_fee(order.delta, &market.next_position, &market.risk, order.side, price)?;
        let price_impact =
            calc_price_impact_from_trade_fee(trade_fee.total, trade_fee.linear_fee, order.delta, price, order.side)?;

        let settlement_fee = if order.delta.is_zero() {
            Fixed6::ZERO
        } else {
            market.parameter.settlement_fee
        };

        Ok(OrderCost {
            trade_fee,
            price_impact,
            settlement_fee,
            total: trade_fee.total.checked_add(settlement_fee)?,
        })
    }
}

// after the settled position and every pending order
fn next_order_timestamp(account: &AccountSnapshot, now: Timestamp) -> Timestamp {
    let latest_pending = account.pending.iter().map(|order| order.timestamp).max();
    let floor = account.position.timestamp.plus_secs(1);
    latest_pending.map_or(floor, |ts| ts.max(floor)).max(now)
}

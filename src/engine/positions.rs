//! Position reconciliation: settled state plus pending orders, marked to a price.

use super::core::PositionReconciler;
use super::results::{AccountSnapshot, EngineError, PositionPreview, PositionSnapshot};
use crate::fixed::Fixed6;
use crate::funding::funding_and_interest_for_sides;
use crate::liquidation::calc_liquidation_price;
use crate::liquidity::calc_maker_exposure;
use crate::market::MarketSnapshot;
use crate::pnl::{live_price_pnl, unrealized_between, PositionPnl, RealizedPnl};
use crate::position::pending_collateral;
use crate::price_feed::{classify_price, market_price, OracleQuote};
use crate::status::{has_version_error, status_for_snapshot, PriceUpdate};
use crate::types::{Side, Timestamp};
use tracing::{debug, warn};

impl PositionReconciler {
    /// Snapshot at the latest settled price, or at `price_override`.
    pub fn snapshot(
        &self,
        market: &MarketSnapshot,
        account: &AccountSnapshot,
        price_override: Option<Fixed6>,
    ) -> Result<PositionSnapshot, EngineError> {
        let price = price_override.unwrap_or_else(|| market.latest_price());
        let next_collateral = pending_collateral(&account.local, &account.pending)?;

        self.build_snapshot(
            &market.risk,
            &account.position,
            &account.pending,
            account.local.collateral,
            next_collateral,
            price,
        )
    }

    /// Full preview: snapshot, status, liquidation, PnL and rates. `quote` marks
    /// the position to a fresher price than the last settlement when given.
    pub fn reconcile(
        &self,
        market: &MarketSnapshot,
        account: &AccountSnapshot,
        quote: Option<&OracleQuote>,
        now: Timestamp,
    ) -> Result<PositionPreview, EngineError> {
        let (price, freshness) = match quote {
            Some(quote) => (
                market_price(quote, market.payoff)?,
                Some(classify_price(quote, now, market.risk.stale_after)),
            ),
            None => (market.latest_price(), None),
        };

        let snapshot = self.snapshot(market, account, Some(price))?;

        let version_error = account.latest_pending().map_or(false, |order| {
            has_version_error(
                order.timestamp,
                &market.latest_oracle_version,
                now,
                self.config.version_grace_secs,
                snapshot.magnitude,
                snapshot.next_magnitude,
            )
        });
        if version_error {
            warn!(
                magnitude = %snapshot.magnitude,
                next_magnitude = %snapshot.next_magnitude,
                oracle_version = %market.latest_oracle_version.timestamp,
                "pending order trails the latest oracle version"
            );
        }

        // a failed settlement outcome outranks a stale quote
        let price_update = match (&account.price_update, freshness) {
            (PriceUpdate::Committed, Some(freshness)) => {
                freshness.price_update(self.config.stale_price_is_error_when_closed)
            }
            (update, _) => update.clone(),
        };

        let status = status_for_snapshot(
            snapshot.magnitude,
            snapshot.next_magnitude,
            snapshot.next_collateral,
            version_error,
            &price_update,
        );

        let maker_exposure = match snapshot.side {
            Side::Maker => calc_maker_exposure(snapshot.magnitude, &market.position)?,
            Side::Long | Side::Short | Side::None => Fixed6::ZERO,
        };

        let realized =
            RealizedPnl::from_history(&account.history, account.realized_since, account.position.timestamp)?;
        let pnl = PositionPnl {
            realized: realized.breakdown,
            unrealized: unrealized_between(
                &account.checkpoint,
                &market.accumulators,
                snapshot.side,
                snapshot.magnitude,
            )?,
            live: live_price_pnl(
                snapshot.side,
                snapshot.magnitude,
                maker_exposure,
                market.latest_price(),
                price,
            )?,
        };

        let rates = funding_and_interest_for_sides(market, now)?;
        let liquidation = calc_liquidation_price(
            &market.risk,
            snapshot.next_collateral,
            snapshot.next_magnitude,
            price,
        )?;

        debug!(
            side = %snapshot.side,
            magnitude = %snapshot.magnitude,
            next_side = %snapshot.next_side,
            next_magnitude = %snapshot.next_magnitude,
            status = %status,
            "reconciled position"
        );

        Ok(PositionPreview {
            snapshot,
            status,
            has_version_error: version_error,
            price,
            liquidation,
            pnl,
            rates,
            maker_exposure,
        })
    }
}

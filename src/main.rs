//! Perpetual Market Preview Simulation.
//!
//! Walks the preview engine through presets, funding, order previews,
//! reconciliation against a live quote, liquidation prices and the status
//! machine. Set `RUST_LOG=debug` to see the engine's own events.

use perps_preview::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Perpetual Market Preview Simulation");
    println!("Single Market, Settled State Plus Pending Orders\n");

    scenario_1_presets();
    scenario_2_funding_and_interest();
    scenario_3_order_preview();
    scenario_4_reconcile_against_quote();
    scenario_5_liquidation_ladder();
    scenario_6_status_machine();

    println!("\nAll simulations completed successfully.");
}

fn d6(value: Decimal) -> Fixed6 {
    Fixed6::from_decimal(value).unwrap()
}

/// ETH-PERP market with a settled book of 1000 maker, 600 long, 400 short.
fn eth_market() -> MarketSnapshot {
    let mut market = MarketPreset::development().market_snapshot();
    market.id = MarketId(1);
    market.global.latest_price = d6(dec!(2000));
    market.global.latest_version = Timestamp::now();
    market.position = AggregatePosition::new(
        market.global.latest_version,
        d6(dec!(1000)),
        d6(dec!(600)),
        d6(dec!(400)),
    );
    market.next_position = market.position;
    market.latest_oracle_version = OracleVersion {
        timestamp: market.global.latest_version,
        price: market.global.latest_price,
        valid: true,
    };
    market
}

fn account_with(collateral: Decimal, position: AccountPosition) -> AccountSnapshot {
    AccountSnapshot {
        local: Local { collateral: d6(collateral), ..Local::default() },
        position,
        ..AccountSnapshot::default()
    }
}

/// Presets for each environment, validated and round tripped through json.
fn scenario_1_presets() {
    println!("Scenario 1: Market Presets\n");

    for env in [Environment::Development, Environment::Testnet, Environment::Mainnet] {
        let preset = env.preset();
        preset.validate().unwrap();

        let json = preset.to_json_string().unwrap();
        let loaded = MarketPreset::from_json_str(&json).unwrap();

        println!(
            "  {:<18} margin {} maintenance {} settlement fee {} json {} bytes, round trip ok: {}",
            preset.name,
            preset.risk.margin,
            preset.risk.maintenance,
            preset.market.settlement_fee,
            json.len(),
            loaded == preset
        );
    }

    let mut broken = MarketPreset::development();
    broken.risk.maintenance = d6(dec!(0.2));
    println!("  maintenance above margin: {}\n", broken.validate().unwrap_err());
}

/// Funding drifts with skew between settlements, interest follows utilization.
fn scenario_2_funding_and_interest() {
    println!("Scenario 2: Funding and Interest\n");

    let mut market = eth_market();
    market.global.p_accumulator = PAccumulator { value: d6(dec!(0.1)), skew: d6(dec!(0.2)) };

    for hours in [0, 1, 24, 24 * 7] {
        let now = market.global.latest_version.plus_secs(hours * 3_600);
        let rates = funding_and_interest_for_sides(&market, now).unwrap();
        let hourly = rates.rates.hourly().unwrap();

        println!(
            "  +{:>3}h funding {} utilization {} interest {} | long {} short {} maker {} (hourly long {})",
            hours,
            rates.funding,
            rates.utilization,
            rates.interest_rate,
            rates.rates.long,
            rates.rates.short,
            rates.rates.maker,
            hourly.long
        );
    }
    println!();
}

/// What opening and then closing a long would cost.
fn scenario_3_order_preview() {
    println!("Scenario 3: Order Preview\n");

    let market = eth_market();
    let reconciler = PositionReconciler::new(EngineConfig::default()).unwrap();
    let now = market.global.latest_version.plus_secs(5);

    let flat = account_with(dec!(5000), AccountPosition::empty(market.global.latest_version));
    let open = OrderRequest {
        side: Side::Long,
        delta: d6(dec!(10)),
        collateral_delta: Fixed6::ZERO,
        price_override: None,
    };
    let preview = reconciler.preview_order(&market, &flat, &open, now).unwrap();

    println!("  Open 10 ETH long with $5,000 collateral");
    println!(
        "  Fee: {} (trade {}, settlement {}), {} bps of notional",
        preview.cost.total,
        preview.cost.trade_fee.total,
        preview.cost.settlement_fee,
        preview.cost.trade_fee.fee_basis_points.mul_int(10_000).unwrap()
    );
    println!(
        "  Estimated fill {} ({} impact per unit)",
        preview.cost.price_impact.estimated_fill_price, preview.cost.price_impact.impact_per_unit
    );
    println!(
        "  Next: {} {} notional {} leverage {} status {}",
        preview.snapshot.next_side,
        preview.snapshot.next_magnitude,
        preview.snapshot.next_notional,
        preview.snapshot.next_leverage,
        preview.status
    );
    println!(
        "  Liquidation {}, max leverage {}, long liquidity left {}\n",
        preview.liquidation.long, preview.max_leverage, preview.liquidity.available_long
    );

    let long = account_with(
        dec!(5000),
        AccountPosition::new(market.global.latest_version, Fixed6::ZERO, d6(dec!(10)), Fixed6::ZERO),
    );
    let close = OrderRequest { delta: d6(dec!(-10)), ..open };
    let preview = reconciler.preview_order(&market, &long, &close, now).unwrap();
    println!(
        "  Close 10 ETH long: fee {} status {} closeable {}\n",
        preview.cost.total, preview.status, preview.snapshot.closeable
    );
}

/// Settled long marked to a fresher oracle quote.
fn scenario_4_reconcile_against_quote() {
    println!("Scenario 4: Reconcile Against a Live Quote\n");

    let market = eth_market();
    let reconciler = PositionReconciler::default();
    let now = market.global.latest_version.plus_secs(10);
    let account = account_with(
        dec!(4000),
        AccountPosition::new(market.global.latest_version, Fixed6::ZERO, d6(dec!(10)), Fixed6::ZERO),
    );

    for answer in [2_100_00000000i128, 1_900_00000000, 1_750_00000000] {
        let quote = OracleQuote::from_answer(answer, 8, now, true).unwrap();
        let preview = reconciler.reconcile(&market, &account, Some(&quote), now).unwrap();

        println!(
            "  ${}: status {} leverage {} live pnl {} liquidation {}",
            preview.price,
            preview.status,
            preview.snapshot.leverage,
            preview.pnl.live,
            preview.liquidation.long
        );
    }

    let maker = account_with(
        dec!(20000),
        AccountPosition::new(market.global.latest_version, d6(dec!(100)), Fixed6::ZERO, Fixed6::ZERO),
    );
    let quote = OracleQuote::from_answer(2_010_00000000, 8, now, true).unwrap();
    let preview = reconciler.reconcile(&market, &maker, Some(&quote), now).unwrap();
    println!(
        "  Maker 100: exposure {} live pnl {} at ${}\n",
        preview.maker_exposure, preview.pnl.live, preview.price
    );
}

/// Liquidation price as collateral shrinks toward the maintenance floor.
fn scenario_5_liquidation_ladder() {
    println!("Scenario 5: Liquidation Ladder\n");

    let mut risk = MarketPreset::development().risk;
    risk.maintenance = d6(dec!(0.001));
    risk.min_maintenance = d6(dec!(50));

    println!("  10 ETH at $2,000, maintenance 0.1% with a $50 floor");
    for collateral in [dec!(100), dec!(500), dec!(2000), dec!(10000)] {
        let prices = calc_liquidation_price(&risk, d6(collateral), d6(dec!(10)), d6(dec!(2000))).unwrap();
        println!("  collateral ${}: long {} short {}", collateral, prices.long, prices.short);
    }

    let mut risk = MarketPreset::development().risk;
    risk.min_maintenance = d6(dec!(5));
    println!("\n  10 ETH at $2,000, maintenance 5%");
    for collateral in [dec!(1500), dec!(4000), dec!(10000)] {
        let prices = calc_liquidation_price(&risk, d6(collateral), d6(dec!(10)), d6(dec!(2000))).unwrap();
        println!("  collateral ${}: long {} short {}", collateral, prices.long, prices.short);
    }
    println!();
}

/// Pending, stuck, stale and failed orders as the status machine sees them.
fn scenario_6_status_machine() {
    println!("Scenario 6: Status Machine\n");

    let market = eth_market();
    let reconciler = PositionReconciler::default();
    let settled = market.global.latest_version;

    let mut opening = account_with(dec!(4000), AccountPosition::empty(settled));
    opening.pending.push(PendingOrder::for_side(settled.plus_secs(5), Side::Long, d6(dec!(10)), Fixed6::ZERO));
    let preview = reconciler.reconcile(&market, &opening, None, settled.plus_secs(10)).unwrap();
    println!("  Pending open: {}", preview.status);

    let mut stuck_market = market.clone();
    stuck_market.latest_oracle_version.timestamp = settled.plus_secs(120);
    let preview = reconciler.reconcile(&stuck_market, &opening, None, settled.plus_secs(300)).unwrap();
    println!("  Pending open behind the oracle: {} (version error {})", preview.status, preview.has_version_error);

    let stale = OracleQuote::from_answer(2_000_00000000, 8, settled.plus_secs(-600), true).unwrap();
    let preview = reconciler.reconcile(&market, &opening, Some(&stale), settled.plus_secs(10)).unwrap();
    println!("  Pending open with a stale quote: {}", preview.status);

    let mut rejected = opening.clone();
    rejected.price_update = PriceUpdate::from_code(MARGIN_ERROR_CODES[0]);
    let preview = reconciler.reconcile(&market, &rejected, None, settled.plus_secs(10)).unwrap();
    println!("  Pending open rejected at settlement: {}", preview.status);

    let mut closing = account_with(
        dec!(4000),
        AccountPosition::new(settled, Fixed6::ZERO, d6(dec!(10)), Fixed6::ZERO),
    );
    closing.pending.push(PendingOrder::for_side(settled.plus_secs(5), Side::Long, d6(dec!(-10)), Fixed6::ZERO));
    let preview = reconciler.reconcile(&market, &closing, None, settled.plus_secs(10)).unwrap();
    println!("  Pending close: {}", preview.status);

    let mut broken = closing.clone();
    broken.position.short = d6(dec!(1));
    match reconciler.reconcile(&market, &broken, None, settled.plus_secs(10)) {
        Ok(preview) => println!("  Two-sided position: {}", preview.status),
        Err(err) => println!("  Two-sided position: {}", err),
    }
}

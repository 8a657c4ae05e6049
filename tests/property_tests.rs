//! Property-based tests for stress testing core math.
//!
//! These tests verify invariants hold under random inputs.

use perps_preview::*;
use proptest::prelude::*;

// Strategies for generating test data
fn raw6_strategy() -> impl Strategy<Value = Fixed6> {
    (-1_000_000_000_000_000i64..1_000_000_000_000_000i64).prop_map(|x| Fixed6::from_raw(x as i128))
}

fn size_strategy() -> impl Strategy<Value = Fixed6> {
    (0i64..1_000_000_000i64).prop_map(|x| Fixed6::from_raw(x as i128)) // 0 to 1,000
}

fn ratio_strategy() -> impl Strategy<Value = Fixed6> {
    (0i64..=1_000_000i64).prop_map(|x| Fixed6::from_raw(x as i128)) // 0% to 100%
}

fn coefficient_strategy() -> impl Strategy<Value = Fixed6> {
    (0i64..=20_000i64).prop_map(|x| Fixed6::from_raw(x as i128)) // 0 to 2%
}

fn curve_strategy() -> impl Strategy<Value = UtilizationCurve> {
    (0i64..100_000, 0i64..400_000, 0i64..2_000_000, 1i64..1_000_000).prop_map(
        |(min, target_step, max_step, target_utilization)| UtilizationCurve {
            min_rate: Fixed6::from_raw(min as i128),
            target_rate: Fixed6::from_raw((min + target_step) as i128),
            max_rate: Fixed6::from_raw((min + target_step + max_step) as i128),
            target_utilization: Fixed6::from_raw(target_utilization as i128),
        },
    )
}

fn book_strategy() -> impl Strategy<Value = AggregatePosition> {
    (size_strategy(), size_strategy(), size_strategy())
        .prop_map(|(maker, long, short)| AggregatePosition::new(Timestamp(0), maker, long, short))
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Maker), Just(Side::Long), Just(Side::Short), Just(Side::None)]
}

proptest! {
    /// Decimal strings parse back to the same raw value
    #[test]
    fn float_string_round_trip(value in raw6_strategy()) {
        let parsed = Fixed6::from_float_string(&value.to_float_string()).unwrap();
        prop_assert_eq!(parsed, value);
    }

    /// Multiplying by a whole number then dividing by it is exact
    #[test]
    fn mul_then_div_by_whole_units(value in raw6_strategy(), units in 1i64..1_000_000i64) {
        let factor = Fixed6::from_units(units);
        let back = value.mul(factor).unwrap().div(factor).unwrap();
        prop_assert_eq!(back, value);
    }

    /// Truncation never rounds away from zero
    #[test]
    fn mul_truncates_toward_zero(a in raw6_strategy(), b in raw6_strategy()) {
        let product = a.mul(b).unwrap();
        let exact = a.raw() * b.raw();
        let scaled = product.raw() * Fixed6::BASE;
        prop_assert!(scaled.abs() <= exact.abs());
        prop_assert!(exact.abs() - scaled.abs() < Fixed6::BASE);
    }

    /// Extrapolated funding never leaves [-max, max]
    #[test]
    fn funding_stays_within_controller_bounds(
        value in raw6_strategy(),
        skew in raw6_strategy(),
        k in 1i64..100_000i64,
        max in 0i64..10_000_000i64,
        elapsed in 0i64..31_536_000i64,
    ) {
        let accumulator = PAccumulator { value, skew };
        let controller = PController {
            k: Fixed6::from_units(k),
            min: -Fixed6::from_raw(max as i128),
            max: Fixed6::from_raw(max as i128),
        };

        let funding = extrapolate_funding(&accumulator, &controller, elapsed).unwrap();
        prop_assert!(funding <= controller.max);
        prop_assert!(funding >= -controller.max);
    }

    /// Utilization is always a fraction
    #[test]
    fn utilization_is_bounded(book in book_strategy(), efficiency in ratio_strategy()) {
        let utilization = compute_utilization(&book, efficiency).unwrap();
        prop_assert!(utilization >= Fixed6::ZERO);
        prop_assert!(utilization <= Fixed6::ONE);
    }

    /// Interest never falls as utilization rises
    #[test]
    fn interest_curve_is_monotonic(curve in curve_strategy(), a in ratio_strategy(), b in ratio_strategy()) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_rate = compute_interest_rate(&curve, low).unwrap();
        let high_rate = compute_interest_rate(&curve, high).unwrap();
        prop_assert!(low_rate <= high_rate);
    }

    /// The curve passes exactly through its three knots
    #[test]
    fn interest_curve_hits_its_knots(curve in curve_strategy()) {
        prop_assert_eq!(compute_interest_rate(&curve, Fixed6::ZERO).unwrap(), curve.min_rate);
        prop_assert_eq!(compute_interest_rate(&curve, curve.target_utilization).unwrap(), curve.target_rate);
        prop_assert_eq!(compute_interest_rate(&curve, Fixed6::ONE).unwrap(), curve.max_rate);
    }

    /// Nobody is paid to trade
    #[test]
    fn trade_fee_is_never_negative(
        book in book_strategy(),
        side in side_strategy(),
        delta in (-100_000_000i64..100_000_000i64).prop_map(|x| Fixed6::from_raw(x as i128)),
        linear in coefficient_strategy(),
        skew in coefficient_strategy(),
        impact in coefficient_strategy(),
        price in (1i64..10_000i64).prop_map(Fixed6::from_units),
    ) {
        let mut risk = RiskParameter::default();
        risk.taker_fee = FeeCoefficients { linear, skew, impact, adiabatic: Fixed6::ZERO };
        risk.maker_fee = FeeCoefficients { linear, skew: Fixed6::ZERO, impact, adiabatic: Fixed6::ZERO };

        let fee = calc_trade_fee(delta, &book, &risk, side, price).unwrap();
        prop_assert!(fee.total >= Fixed6::ZERO);
    }

    /// Both liquidation branches give the same price where the requirement meets the floor
    #[test]
    fn liquidation_branches_agree_on_the_floor(
        position in 1i64..100i64,
        liquidation in 100i64..5_000i64,
        gap in 1i64..1_000i64,
        maintenance in 1_000i64..100_000i64,
    ) {
        let p = Fixed6::from_units(position);
        let liq = Fixed6::from_units(liquidation);
        let price = Fixed6::from_units(liquidation + gap);
        let m = Fixed6::from_raw(maintenance as i128);

        // floor equals the scaled requirement at the liquidation price
        let floor = p.mul(liq).unwrap().mul(m).unwrap();
        let collateral = floor + p.mul(price - liq).unwrap();

        let below = liquidation_price_below_floor(floor, collateral, p, price).unwrap();
        let above = liquidation_price_above_floor(m, collateral, p, price).unwrap();
        prop_assert_eq!(below.long, liq);
        prop_assert_eq!(above.long, liq);
    }

    /// Every input combination lands on exactly one status, settled only when magnitudes match
    #[test]
    fn status_is_total(
        magnitude in prop_oneof![Just(Fixed6::ZERO), size_strategy()],
        next in prop_oneof![Just(Fixed6::ZERO), size_strategy()],
        collateral in prop_oneof![Just(Fixed6::ZERO), size_strategy()],
        version_error in any::<bool>(),
        code in prop_oneof![Just("0x"), Just("MarketInsufficientMarginError"), Just("0xdeadbeef")],
    ) {
        let status = status_for_snapshot(magnitude, next, collateral, version_error, &PriceUpdate::from_code(code));
        prop_assert!(PositionStatus::ALL.contains(&status));

        let settled = matches!(status, PositionStatus::Open | PositionStatus::Closed | PositionStatus::Resolved);
        prop_assert_eq!(settled, magnitude == next);
    }

    /// A single pending order moves only its own side and leaves the settled magnitude alone
    #[test]
    fn pending_order_adds_to_settled_side(
        settled in size_strategy(),
        delta in size_strategy(),
        side in prop_oneof![Just(Side::Maker), Just(Side::Long), Just(Side::Short)],
    ) {
        let mut position = AccountPosition::empty(Timestamp(100));
        position = match side {
            Side::Maker => AccountPosition { maker: settled, ..position },
            Side::Long => AccountPosition { long: settled, ..position },
            Side::Short | Side::None => AccountPosition { short: settled, ..position },
        };
        let order = PendingOrder::for_side(Timestamp(101), side, delta, Fixed6::ZERO);

        let resolved = resolve(&position, &[order]).unwrap();
        prop_assert_eq!(resolved.magnitude, settled);
        prop_assert_eq!(resolved.next_magnitude, settled.checked_add(delta).unwrap());
        prop_assert_eq!(resolved.is_consistent(), delta.is_zero());
    }

    /// Long and short price PnL mirror each other
    #[test]
    fn live_pnl_is_symmetric(
        magnitude in size_strategy(),
        settled in (1i64..10_000i64).prop_map(Fixed6::from_units),
        live in (1i64..10_000i64).prop_map(Fixed6::from_units),
    ) {
        let long = live_price_pnl(Side::Long, magnitude, Fixed6::ZERO, settled, live).unwrap();
        let short = live_price_pnl(Side::Short, magnitude, Fixed6::ZERO, settled, live).unwrap();
        prop_assert_eq!(long, -short);
    }
}

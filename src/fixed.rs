// 2.0: scaled-integer money. Fixed6 holds value * 10^6, Fixed18 holds value * 10^18.
// mul and div rescale by the base and truncate toward zero, the same as the settlement contract.
// products run through a 256-bit intermediate so a*b never overflows before the divide.
// storage is i128, so Fixed6 spans about ±1.7e32 units and Fixed18 about ±1.7e20. anything
// that leaves that range comes back as ArithmeticError::Overflow from the checked_* ops;
// the plain operators are for operands already bounded by a checked op.
// 2.1 has the string and Decimal conversions, 2.2 the Newton square root.

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use tracing::trace;

/// Newton's method converges in well under this for any 256-bit input.
const SQRT_MAX_ITERATIONS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("fixed-point overflow")]
    Overflow,

    #[error("value {value} does not fit the target representation")]
    Narrowing { value: i128 },

    #[error("square root of negative value {value}")]
    NegativeRoot { value: i128 },

    #[error("interpolation target {x} outside [{start}, {end}]")]
    InterpolationOutOfBounds { x: i128, start: i128, end: i128 },

    #[error("cannot parse {input:?} as a fixed-point number")]
    Parse { input: String },
}

/// `a * b / denominator`, truncated toward zero.
pub(crate) fn mul_div(a: i128, b: i128, denominator: i128) -> Result<i128, ArithmeticError> {
    if denominator == 0 {
        trace!(a = %a, b = %b, "fixed-point division by zero");
        return Err(ArithmeticError::DivisionByZero);
    }

    let negative = (a < 0) ^ (b < 0) ^ (denominator < 0);
    let product = U256::from(a.unsigned_abs()) * U256::from(b.unsigned_abs());
    let quotient = product / U256::from(denominator.unsigned_abs());

    if quotient > U256::from(i128::MAX as u128) {
        return Err(ArithmeticError::Overflow);
    }

    let magnitude = quotient.as_u128() as i128;
    Ok(if negative { -magnitude } else { magnitude })
}

fn pow10(exp: u32) -> Result<i128, ArithmeticError> {
    10i128.checked_pow(exp).ok_or(ArithmeticError::Overflow)
}

/// Moves `raw` from `from` implied decimals to `to`. widening is exact, narrowing truncates.
fn rescale(raw: i128, from: u32, to: u32) -> Result<i128, ArithmeticError> {
    if to >= from {
        raw.checked_mul(pow10(to - from)?)
            .ok_or(ArithmeticError::Overflow)
    } else {
        match 10i128.checked_pow(from - to) {
            Some(divisor) => Ok(raw / divisor),
            // anything past 10^38 truncates every i128 to zero
            None => Ok(0),
        }
    }
}

// 2.2: floor(sqrt(n)). starts above the root so the iterates fall monotonically,
// and stops once two successive iterates are within one of each other.
fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }

    let mut x = U256::one() << ((n.bits() + 1) / 2);
    for _ in 0..SQRT_MAX_ITERATIONS {
        let y = (x + n / x) >> 1;
        let step = if y > x { y - x } else { x - y };
        x = y;
        if step <= U256::one() {
            break;
        }
    }

    while x * x > n {
        x -= U256::one();
    }
    while (x + U256::one()) * (x + U256::one()) <= n {
        x += U256::one();
    }
    x
}

macro_rules! fixed_point {
    ($(#[$meta:meta])* $name:ident, $decimals:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(i128);

        impl $name {
            pub const DECIMALS: u32 = $decimals;
            pub const BASE: i128 = 10i128.pow($decimals);
            pub const ZERO: Self = Self(0);
            pub const ONE: Self = Self(Self::BASE);

            pub const fn from_raw(raw: i128) -> Self {
                Self(raw)
            }

            pub const fn raw(&self) -> i128 {
                self.0
            }

            pub const fn from_units(units: i64) -> Self {
                Self(units as i128 * Self::BASE)
            }

            /// Rescales an integer carrying `decimals` implied places.
            pub fn from_decimals(value: i128, decimals: u32) -> Result<Self, ArithmeticError> {
                rescale(value, decimals, Self::DECIMALS).map(Self)
            }

            pub fn is_zero(&self) -> bool {
                self.0 == 0
            }

            pub fn is_negative(&self) -> bool {
                self.0 < 0
            }

            pub fn is_positive(&self) -> bool {
                self.0 > 0
            }

            /// Saturates at the minimum raw value. use `checked_abs` on untrusted input.
            pub fn abs(&self) -> Self {
                Self(self.0.saturating_abs())
            }

            pub fn checked_abs(self) -> Result<Self, ArithmeticError> {
                self.0.checked_abs().map(Self).ok_or(ArithmeticError::Overflow)
            }

            pub fn checked_add(self, other: Self) -> Result<Self, ArithmeticError> {
                self.0.checked_add(other.0).map(Self).ok_or(ArithmeticError::Overflow)
            }

            pub fn checked_sub(self, other: Self) -> Result<Self, ArithmeticError> {
                self.0.checked_sub(other.0).map(Self).ok_or(ArithmeticError::Overflow)
            }

            pub fn checked_neg(self) -> Result<Self, ArithmeticError> {
                self.0.checked_neg().map(Self).ok_or(ArithmeticError::Overflow)
            }

            /// Sum that reports overflow instead of wrapping.
            pub fn checked_sum<I: IntoIterator<Item = Self>>(values: I) -> Result<Self, ArithmeticError> {
                values.into_iter().try_fold(Self::ZERO, Self::checked_add)
            }

            pub fn signum(&self) -> i128 {
                self.0.signum()
            }

            /// `self * other / BASE`, truncated toward zero.
            pub fn mul(self, other: Self) -> Result<Self, ArithmeticError> {
                mul_div(self.0, other.0, Self::BASE).map(Self)
            }

            /// `self * BASE / other`, truncated toward zero.
            pub fn div(self, other: Self) -> Result<Self, ArithmeticError> {
                mul_div(self.0, Self::BASE, other.0).map(Self)
            }

            pub fn mul_int(self, factor: i64) -> Result<Self, ArithmeticError> {
                self.0
                    .checked_mul(factor as i128)
                    .map(Self)
                    .ok_or(ArithmeticError::Overflow)
            }

            pub fn div_int(self, divisor: i64) -> Result<Self, ArithmeticError> {
                if divisor == 0 {
                    trace!(value = %self.0, "fixed-point division by zero");
                    return Err(ArithmeticError::DivisionByZero);
                }
                Ok(Self(self.0 / divisor as i128))
            }

            pub fn clamp_to(self, min: Self, max: Self) -> Self {
                self.max(min).min(max)
            }

            pub fn sqrt(self) -> Result<Self, ArithmeticError> {
                if self.0 < 0 {
                    return Err(ArithmeticError::NegativeRoot { value: self.0 });
                }
                let scaled = U256::from(self.0 as u128) * U256::from(Self::BASE as u128);
                // root of anything below 2^254 is below 2^127
                Ok(Self(isqrt(scaled).as_u128() as i128))
            }

            // 2.1: Decimal interop. excess precision truncates toward zero.
            pub fn from_decimal(value: Decimal) -> Result<Self, ArithmeticError> {
                rescale(value.mantissa(), value.scale(), Self::DECIMALS).map(Self)
            }

            pub fn to_decimal(&self) -> Result<Decimal, ArithmeticError> {
                Decimal::try_from_i128_with_scale(self.0, Self::DECIMALS)
                    .map_err(|_| ArithmeticError::Narrowing { value: self.0 })
            }

            /// Parses `"-12.345"`. digits past the supported precision are dropped.
            pub fn from_float_string(input: &str) -> Result<Self, ArithmeticError> {
                let parse_error = || ArithmeticError::Parse { input: input.to_string() };
                let trimmed = input.trim();
                let (negative, digits) = match trimmed.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
                };

                let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
                let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
                if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
                    return Err(parse_error());
                }

                let whole_value: i128 = if whole.is_empty() {
                    0
                } else {
                    whole.parse().map_err(|_| ArithmeticError::Overflow)?
                };

                let width = Self::DECIMALS as usize;
                let kept: String = fraction.chars().take(width).collect();
                let fraction_value: i128 = if kept.is_empty() {
                    0
                } else {
                    format!("{:0<width$}", kept, width = width)
                        .parse()
                        .map_err(|_| parse_error())?
                };

                let raw = whole_value
                    .checked_mul(Self::BASE)
                    .and_then(|v| v.checked_add(fraction_value))
                    .ok_or(ArithmeticError::Overflow)?;
                Ok(Self(if negative { -raw } else { raw }))
            }

            /// Shortest exact decimal rendering, e.g. `"1.5"`, `"-0.000001"`, `"3"`.
            pub fn to_float_string(&self) -> String {
                let magnitude = self.0.unsigned_abs();
                let base = Self::BASE as u128;
                let sign = if self.0 < 0 { "-" } else { "" };
                let whole = magnitude / base;
                let fraction = magnitude % base;

                if fraction == 0 {
                    return format!("{}{}", sign, whole);
                }
                let padded = format!("{:0width$}", fraction, width = Self::DECIMALS as usize);
                format!("{}{}.{}", sign, whole, padded.trim_end_matches('0'))
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, other: Self) -> Self {
                Self(self.0 + other.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, other: Self) -> Self {
                Self(self.0 - other.0)
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self(-self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_float_string())
            }
        }

        // serialized as decimal strings so presets stay human-editable
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_float_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_float_string(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_point!(
    /// 6-decimal scaled integer. collateral, positions, prices and rates all use this.
    /// i128 storage, about ±1.7e32 units.
    Fixed6,
    6
);

fixed_point!(
    /// 18-decimal scaled integer. raw oracle prices and payoff intermediates.
    /// i128 storage, about ±1.7e20 units.
    Fixed18,
    18
);

impl Fixed6 {
    /// Exact widening.
    pub fn to_fixed18(self) -> Result<Fixed18, ArithmeticError> {
        rescale(self.0, Self::DECIMALS, Fixed18::DECIMALS).map(Fixed18::from_raw)
    }
}

impl Fixed18 {
    /// Narrowing, truncates toward zero.
    pub fn to_fixed6(self) -> Fixed6 {
        Fixed6::from_raw(self.0 / 10i128.pow(Fixed18::DECIMALS - Fixed6::DECIMALS))
    }
}

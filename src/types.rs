// 1.0: primitives every formula leans on. sides, timestamps, order ids.
// each is a newtype or closed enum so the compiler catches mixups between them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub u32);

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "market-{}", self.0)
    }
}

/// Local order counter (`currentId` / `latestId` on the account and market).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

// Maker provides liquidity. Long profits when price goes up, Short when it goes down.
// None is an empty position; every formula matches on all four.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Maker,
    Long,
    Short,
    #[default]
    None,
}

impl Side {
    pub fn is_taker(&self) -> bool {
        matches!(self, Side::Long | Side::Short)
    }

    pub fn is_maker(&self) -> bool {
        matches!(self, Side::Maker)
    }

    /// Long and Short swap, Maker and None map to themselves.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
            Side::Maker => Side::Maker,
            Side::None => Side::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Maker => "maker",
            Side::Long => "long",
            Side::Short => "short",
            Side::None => "none",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 1.1: unix timestamp in seconds. oracle versions are keyed by these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Seconds from `self` until `later`, floored at zero.
    pub fn elapsed_until(&self, later: Timestamp) -> i64 {
        later.0.saturating_sub(self.0).max(0)
    }

    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

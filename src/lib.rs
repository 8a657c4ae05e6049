// perps-preview: off-chain preview of perpetual market economics.
// reads settled market and account state, layers pending orders on top and reports
// what the position looks like, what an order would cost and where it liquidates.
// every call is a pure function of its inputs with no I/O and no shared state.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MarketId, OrderId, Side, Timestamp
//   2.x  fixed.rs: Fixed6 / Fixed18 scaled integers, truncating mul/div
//   3.x  market.rs: risk + market parameters, aggregate position, globals
//   4.x  funding.rs: P-controller funding, jump-rate interest, per-side rates
//   5.x  fees.rs: maker/taker trade fees, price impact
//   6.x  margin.rs: notional, margin, maintenance, leverage
//   6.1  liquidation.rs: two-branch liquidation price
//   6.2  liquidity.rs: taker liquidity, maker exposure
//   7.x  position.rs: settled position + pending order fold
//   7.1  pnl.rs: realized, unrealized and live-price pnl
//   7.2  status.rs: position status machine, version errors
//   8.x  engine/: position reconciler: snapshots, previews, order costs
//   9.x  price_feed.rs: oracle quote freshness (boundary only)
//   9.1  payoff.rs: payoff transforms on the oracle price
//   10.x config.rs: market presets, json loading, validation

// arithmetic and inputs
pub mod fixed;
pub mod market;
pub mod types;

// economics
pub mod fees;
pub mod funding;
pub mod liquidation;
pub mod liquidity;
pub mod margin;
pub mod pnl;

// account state
pub mod engine;
pub mod position;
pub mod status;

// integration modules
pub mod config;
pub mod payoff;
pub mod price_feed;

// re exports for convenience
pub use engine::*;
pub use fees::*;
pub use fixed::*;
pub use funding::*;
pub use liquidation::*;
pub use liquidity::*;
pub use margin::*;
pub use market::*;
pub use pnl::*;
pub use position::*;
pub use status::*;
pub use types::*;
pub use config::{ConfigError, Environment, MarketPreset};
pub use payoff::Payoff;
pub use price_feed::{classify_price, market_price, OracleQuote, PriceFreshness, STALE_PRICE_CODE};

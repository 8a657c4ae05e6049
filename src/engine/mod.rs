// 8.0: position reconciler. merges authoritative settled state with pending
// orders and previews hypothetical ones: snapshot, status, fees, liquidation, pnl.
// pure over its inputs with no shared state and no I/O.

mod config;
mod core;
mod orders;
mod positions;
mod results;

pub use config::EngineConfig;
pub use core::PositionReconciler;
pub use results::{
    AccountSnapshot, EngineError, OrderCost, OrderPreview, OrderRequest, PositionPreview, PositionSnapshot,
};

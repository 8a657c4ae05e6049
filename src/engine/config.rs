//! Engine configuration options.

use crate::config::ConfigError;
use crate::fixed::Fixed6;
use crate::margin::MAX_LEVERAGE;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds a pending order may trail the latest oracle version before it is flagged.
    pub version_grace_secs: i64,
    /// Hard cap on quoted max leverage.
    pub max_leverage_cap: Fixed6,
    /// Report a stale price on a closed market as a failed price update.
    pub stale_price_is_error_when_closed: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version_grace_secs: 60,
            max_leverage_cap: MAX_LEVERAGE,
            stale_price_is_error_when_closed: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version_grace_secs < 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "version grace must not be negative".to_string(),
            });
        }
        if !self.max_leverage_cap.is_positive() {
            return Err(ConfigError::InvalidEngine {
                reason: "max leverage cap must be positive".to_string(),
            });
        }
        Ok(())
    }
}

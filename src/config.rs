// 10.0 config.rs: market presets in one place. risk, fee split, payoff.
// 10.1 presets load from json so a chain reader can hand over parameters as data.

use serde::{Deserialize, Serialize};

use crate::fixed::Fixed6;
use crate::market::{FeeCoefficients, MarketParameter, MarketSnapshot, PController, RiskParameter, UtilizationCurve};
use crate::payoff::Payoff;

// Complete parameter set for one market
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPreset {
    // Human readable market name (e.g. "ETH-PERP")
    pub name: String,
    pub risk: RiskParameter,
    pub market: MarketParameter,
    pub payoff: Payoff,
}

fn raw6(raw: i64) -> Fixed6 {
    // raw 6-decimal units
    Fixed6::from_raw(raw as i128)
}

impl MarketPreset {
    // Moderate parameters used for local development
    pub fn development() -> Self {
        Self {
            name: "ETH-PERP Dev".to_string(),
            risk: RiskParameter {
                margin: raw6(100_000), // 10%
                maintenance: raw6(50_000), // 5%
                min_margin: raw6(10_000_000), // 10
                min_maintenance: raw6(5_000_000), // 5
                efficiency_limit: raw6(500_000), // 0.5
                taker_fee: FeeCoefficients {
                    linear: raw6(500), // 5 bps
                    skew: raw6(1_000),
                    impact: raw6(2_000),
                    adiabatic: Fixed6::ZERO,
                },
                maker_fee: FeeCoefficients {
                    linear: raw6(200), // 2 bps
                    skew: Fixed6::ZERO,
                    impact: raw6(1_000),
                    adiabatic: Fixed6::ZERO,
                },
                utilization_curve: UtilizationCurve {
                    min_rate: Fixed6::ZERO,
                    max_rate: raw6(1_000_000), // 100%
                    target_rate: raw6(80_000), // 8%
                    target_utilization: raw6(800_000), // 80%
                },
                p_controller: PController {
                    k: Fixed6::from_units(40_000),
                    min: raw6(-1_200_000),
                    max: raw6(1_200_000), // 120% annualized
                },
                virtual_taker: Fixed6::ZERO,
                stale_after: 60,
                maker_receive_only: false,
            },
            market: MarketParameter {
                funding_fee: raw6(100_000), // 10%
                interest_fee: raw6(100_000),
                maker_fee: raw6(200),
                taker_fee: raw6(500),
                risk_fee: raw6(500_000),
                settlement_fee: raw6(1_000_000), // 1
                closed: false,
                settle_only: false,
            },
            payoff: Payoff::Linear,
        }
    }

    // Looser margins and no fees for test networks
    pub fn testnet() -> Self {
        let mut preset = Self::development();
        preset.name = "ETH-PERP Testnet".to_string();
        preset.risk.margin = raw6(50_000);      // 20x
        preset.risk.maintenance = raw6(25_000);
        preset.risk.taker_fee = FeeCoefficients::default();
        preset.risk.maker_fee = FeeCoefficients::default();
        preset.market.settlement_fee = Fixed6::ZERO;
        preset
    }

    // Conservative mainnet parameters. makers never pay funding
    pub fn mainnet_conservative() -> Self {
        let mut preset = Self::development();
        preset.name = "ETH-PERP".to_string();
        preset.risk.margin = raw6(100_000);
        preset.risk.maintenance = raw6(80_000);
        preset.risk.min_margin = raw6(50_000_000);
        preset.risk.min_maintenance = raw6(40_000_000);
        preset.risk.virtual_taker = Fixed6::from_units(100);
        preset.risk.taker_fee.adiabatic = raw6(500);
        preset.risk.stale_after = 30;
        preset.risk.maker_receive_only = true;
        preset
    }

    // Empty market carrying this preset's parameters. state is filled in by the caller
    pub fn market_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            risk: self.risk.clone(),
            parameter: self.market.clone(),
            payoff: self.payoff,
            ..MarketSnapshot::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let preset: Self = serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson {
            reason: e.to_string(),
        })?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidJson {
            reason: e.to_string(),
        })
    }

    // Validate the preset for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let risk = &self.risk;

        // margin checks
        if !risk.maintenance.is_positive() || risk.maintenance > risk.margin {
            return Err(ConfigError::InvalidMargin {
                reason: "maintenance must be positive and no greater than margin".to_string(),
            });
        }
        // at 100% the long liquidation price has no solution
        if risk.maintenance >= Fixed6::ONE {
            return Err(ConfigError::InvalidMargin {
                reason: "maintenance must be below 100%".to_string(),
            });
        }
        if risk.min_maintenance > risk.min_margin {
            return Err(ConfigError::InvalidMargin {
                reason: "min maintenance must not exceed min margin".to_string(),
            });
        }

        // interest curve checks
        let curve = &risk.utilization_curve;
        if curve.min_rate > curve.target_rate || curve.target_rate > curve.max_rate {
            return Err(ConfigError::InvalidCurve {
                reason: "rates must satisfy min <= target <= max".to_string(),
            });
        }
        if !curve.target_utilization.is_positive() || curve.target_utilization >= Fixed6::ONE {
            return Err(ConfigError::InvalidCurve {
                reason: "target utilization must be strictly between 0 and 1".to_string(),
            });
        }

        // funding checks
        if !risk.p_controller.k.is_positive() {
            return Err(ConfigError::InvalidFunding {
                reason: "controller k must be positive".to_string(),
            });
        }
        if risk.p_controller.max.is_negative() {
            return Err(ConfigError::InvalidFunding {
                reason: "controller max must not be negative".to_string(),
            });
        }

        // fee checks
        for (side, fee) in [("taker", &risk.taker_fee), ("maker", &risk.maker_fee)] {
            if [fee.linear, fee.skew, fee.impact, fee.adiabatic].iter().any(|c| c.is_negative()) {
                return Err(ConfigError::InvalidFees {
                    reason: format!("{} fee coefficients must not be negative", side),
                });
            }
        }

        let market = &self.market;
        let splits = [
            ("funding", market.funding_fee),
            ("interest", market.interest_fee),
            ("maker", market.maker_fee),
            ("taker", market.taker_fee),
            ("risk", market.risk_fee),
        ];
        if let Some((name, _)) = splits.iter().find(|(_, v)| v.is_negative() || *v > Fixed6::ONE) {
            return Err(ConfigError::InvalidFees {
                reason: format!("{} fee must be within [0, 1]", name),
            });
        }
        if market.settlement_fee.is_negative() {
            return Err(ConfigError::InvalidFees {
                reason: "settlement fee must not be negative".to_string(),
            });
        }

        if risk.stale_after < 0 {
            return Err(ConfigError::InvalidOracle {
                reason: "stale_after must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid margin: {reason}")]
    InvalidMargin { reason: String },

    #[error("invalid interest curve: {reason}")]
    InvalidCurve { reason: String },

    #[error("invalid funding controller: {reason}")]
    InvalidFunding { reason: String },

    #[error("invalid fees: {reason}")]
    InvalidFees { reason: String },

    #[error("invalid oracle settings: {reason}")]
    InvalidOracle { reason: String },

    #[error("invalid preset json: {reason}")]
    InvalidJson { reason: String },

    #[error("invalid engine settings: {reason}")]
    InvalidEngine { reason: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn preset(&self) -> MarketPreset {
        match self {
            Environment::Development => MarketPreset::development(),
            Environment::Testnet => MarketPreset::testnet(),
            Environment::Mainnet => MarketPreset::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_presets_valid() {
        assert!(Environment::Development.preset().validate().is_ok());
        assert!(Environment::Testnet.preset().validate().is_ok());
        assert!(Environment::Mainnet.preset().validate().is_ok());
    }

    #[test]
    fn test_mainnet_makers_receive_only() {
        let preset = MarketPreset::mainnet_conservative();
        assert!(preset.risk.maker_receive_only);
        assert_eq!(preset.risk.stale_after, 30);
    }

    #[test]
    fn test_invalid_margin() {
        let mut preset = MarketPreset::development();
        preset.risk.maintenance = preset.risk.margin + Fixed6::from_raw(1);
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidMargin { .. })));

        let mut preset = MarketPreset::development();
        preset.risk.maintenance = Fixed6::ZERO;
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidMargin { .. })));

        let mut preset = MarketPreset::development();
        preset.risk.min_maintenance = preset.risk.min_margin + Fixed6::ONE;
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidMargin { .. })));
    }

    #[test]
    fn test_full_maintenance_rejected() {
        let mut preset = MarketPreset::development();
        preset.risk.margin = Fixed6::from_units(2);
        preset.risk.maintenance = Fixed6::ONE;
        assert_eq!(
            preset.validate(),
            Err(ConfigError::InvalidMargin { reason: "maintenance must be below 100%".to_string() })
        );

        preset.risk.maintenance = Fixed6::from_float_string("0.999999").unwrap();
        assert!(preset.validate().is_ok());
    }

    #[test]
    fn test_invalid_curve() {
        let mut preset = MarketPreset::development();
        preset.risk.utilization_curve.target_rate = Fixed6::from_units(2);
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidCurve { .. })));

        let mut preset = MarketPreset::development();
        preset.risk.utilization_curve.target_utilization = Fixed6::ONE;
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidCurve { .. })));
    }

    #[test]
    fn test_invalid_funding() {
        let mut preset = MarketPreset::development();
        preset.risk.p_controller.k = Fixed6::ZERO;
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidFunding { .. })));
    }

    #[test]
    fn test_invalid_fees() {
        let mut preset = MarketPreset::development();
        preset.risk.taker_fee.skew = Fixed6::from_raw(-1);
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidFees { .. })));

        let mut preset = MarketPreset::development();
        preset.market.risk_fee = Fixed6::from_units(2);
        assert!(matches!(preset.validate(), Err(ConfigError::InvalidFees { .. })));
    }

    #[test]
    fn test_market_snapshot_carries_parameters() {
        let preset = MarketPreset::mainnet_conservative();
        let market = preset.market_snapshot();
        assert_eq!(market.risk, preset.risk);
        assert_eq!(market.parameter, preset.market);
        assert!(market.position.maker.is_zero());
    }

    #[test]
    fn test_json_round_trip() {
        let preset = MarketPreset::mainnet_conservative();
        let json = preset.to_json_string().unwrap();
        let back = MarketPreset::from_json_str(&json).unwrap();
        assert_eq!(back, preset);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(MarketPreset::from_json_str("{"), Err(ConfigError::InvalidJson { .. })));

        let mut preset = MarketPreset::development();
        preset.risk.p_controller.k = Fixed6::ZERO;
        let json = serde_json::to_string(&preset).unwrap();
        assert!(matches!(MarketPreset::from_json_str(&json), Err(ConfigError::InvalidFunding { .. })));
    }
}

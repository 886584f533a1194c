//! Engine Configuration
//!
//! Operator-tunable knobs. Everything else (house edge, burn rates,
//! window length, payout cap) is a protocol constant in the crate root.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ACTIVE_SCAN_DEPTH, DEFAULT_WITHDRAW_COOLDOWN_SECS};

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Withdrawal cooldown of zero.
    #[error("withdraw cooldown must be positive")]
    ZeroCooldown,

    /// Active-bet scan depth of zero.
    #[error("active scan depth must be positive")]
    ZeroScanDepth,

    /// Environment variable present but unparseable.
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between a withdrawal request and its earliest execution.
    pub withdraw_cooldown_secs: u64,
    /// Burn a share of every payout.
    pub claim_burn_enabled: bool,
    /// Most recent bets examined by the active-bet scan.
    pub active_scan_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            withdraw_cooldown_secs: DEFAULT_WITHDRAW_COOLDOWN_SECS,
            claim_burn_enabled: true,
            active_scan_depth: ACTIVE_SCAN_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything unset.
    ///
    /// - `WAGER_WITHDRAW_COOLDOWN_SECS`
    /// - `WAGER_CLAIM_BURN` (`true`/`1` or `false`/`0`)
    /// - `WAGER_ACTIVE_SCAN_DEPTH`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let withdraw_cooldown_secs = match lookup("WAGER_WITHDRAW_COOLDOWN_SECS") {
            Some(raw) => parse_var("WAGER_WITHDRAW_COOLDOWN_SECS", raw)?,
            None => defaults.withdraw_cooldown_secs,
        };
        let claim_burn_enabled = match lookup("WAGER_CLAIM_BURN") {
            Some(raw) => match raw.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "WAGER_CLAIM_BURN",
                        value: raw,
                    })
                }
            },
            None => defaults.claim_burn_enabled,
        };
        let active_scan_depth = match lookup("WAGER_ACTIVE_SCAN_DEPTH") {
            Some(raw) => parse_var("WAGER_ACTIVE_SCAN_DEPTH", raw)?,
            None => defaults.active_scan_depth,
        };

        let config = Self {
            withdraw_cooldown_secs,
            claim_burn_enabled,
            active_scan_depth,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.withdraw_cooldown_secs == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        if self.active_scan_depth == 0 {
            return Err(ConfigError::ZeroScanDepth);
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidVar { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.withdraw_cooldown_secs, 86_400);
        assert!(config.claim_burn_enabled);
        assert_eq!(config.active_scan_depth, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_lookup_gives_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("WAGER_WITHDRAW_COOLDOWN_SECS", "3600"),
            ("WAGER_CLAIM_BURN", "false"),
            ("WAGER_ACTIVE_SCAN_DEPTH", " 50 "),
        ]))
        .unwrap();

        assert_eq!(config.withdraw_cooldown_secs, 3_600);
        assert!(!config.claim_burn_enabled);
        assert_eq!(config.active_scan_depth, 50);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            EngineConfig::from_lookup(lookup_from(&[("WAGER_WITHDRAW_COOLDOWN_SECS", "0")])),
            Err(ConfigError::ZeroCooldown)
        );
        assert_eq!(
            EngineConfig::from_lookup(lookup_from(&[("WAGER_ACTIVE_SCAN_DEPTH", "0")])),
            Err(ConfigError::ZeroScanDepth)
        );
        assert!(matches!(
            EngineConfig::from_lookup(lookup_from(&[("WAGER_CLAIM_BURN", "maybe")])),
            Err(ConfigError::InvalidVar { name: "WAGER_CLAIM_BURN", .. })
        ));
        assert!(matches!(
            EngineConfig::from_lookup(lookup_from(&[("WAGER_WITHDRAW_COOLDOWN_SECS", "-5")])),
            Err(ConfigError::InvalidVar { .. })
        ));
    }
}

//! # Engine Configuration
//!
//! Business tunables for schedules and reconciliation.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INSTALLO_DECLINING_RATE_BPS=400                                    │
//! │     INSTALLO_AMOUNT_TOLERANCE=1                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/installo/installo.toml (Linux)                           │
//! │     ~/Library/Application Support/com.installo.installo/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     4% monthly, 8% custom floor, 2..=36 months, tolerance 1 / 0.01     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # installo.toml
//! [schedule]
//! declining_rate_bps = 400
//! flat_rate_bps = 400
//! min_custom_rate_bps = 800
//! min_term_months = 2
//! max_term_months = 36
//! payment_rounding_step = 1000
//!
//! [reconciliation]
//! amount_tolerance = 1
//! share_tolerance = 0.01
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use installo_core::{
    Rate, ScheduleSettings, DEFAULT_MONTHLY_RATE, MAX_TERM_MONTHS, MIN_CUSTOM_RATE,
    MIN_TERM_MONTHS, PAYMENT_ROUNDING_STEP,
};

use crate::error::ConfigError;

// =============================================================================
// Schedule Settings
// =============================================================================

/// `[schedule]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Monthly rate of declining-balance plans.
    #[serde(default = "default_monthly_rate_bps")]
    pub declining_rate_bps: u32,

    /// Monthly rate of flat plans.
    #[serde(default = "default_monthly_rate_bps")]
    pub flat_rate_bps: u32,

    /// Floor for custom lump-sum rates.
    #[serde(default = "default_min_custom_rate_bps")]
    pub min_custom_rate_bps: u32,

    #[serde(default = "default_min_term")]
    pub min_term_months: u32,

    #[serde(default = "default_max_term")]
    pub max_term_months: u32,

    #[serde(default = "default_rounding_step")]
    pub payment_rounding_step: i64,
}

fn default_monthly_rate_bps() -> u32 {
    DEFAULT_MONTHLY_RATE.bps()
}

fn default_min_custom_rate_bps() -> u32 {
    MIN_CUSTOM_RATE.bps()
}

fn default_min_term() -> u32 {
    MIN_TERM_MONTHS
}

fn default_max_term() -> u32 {
    MAX_TERM_MONTHS
}

fn default_rounding_step() -> i64 {
    PAYMENT_ROUNDING_STEP
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            declining_rate_bps: default_monthly_rate_bps(),
            flat_rate_bps: default_monthly_rate_bps(),
            min_custom_rate_bps: default_min_custom_rate_bps(),
            min_term_months: default_min_term(),
            max_term_months: default_max_term(),
            payment_rounding_step: default_rounding_step(),
        }
    }
}

impl ScheduleConfig {
    /// Settings handed to the amortization calculator.
    pub fn to_settings(&self) -> ScheduleSettings {
        ScheduleSettings {
            declining_rate: Rate::from_bps(self.declining_rate_bps),
            flat_rate: Rate::from_bps(self.flat_rate_bps),
            min_custom_rate: Rate::from_bps(self.min_custom_rate_bps),
            min_term_months: self.min_term_months,
            max_term_months: self.max_term_months,
            rounding_step: self.payment_rounding_step,
        }
    }
}

// =============================================================================
// Reconciliation Settings
// =============================================================================

/// `[reconciliation]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Largest difference, in money units, that is not reported as drift.
    #[serde(default = "default_amount_tolerance")]
    pub amount_tolerance: i64,

    /// Largest share difference, in percentage points, that is not drift.
    #[serde(default = "default_share_tolerance")]
    pub share_tolerance: f64,
}

fn default_amount_tolerance() -> i64 {
    1
}

fn default_share_tolerance() -> f64 {
    0.01
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        ReconciliationConfig {
            amount_tolerance: default_amount_tolerance(),
            share_tolerance: default_share_tolerance(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

impl EngineConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Priority
    /// 1. Environment variables (`INSTALLO_*`)
    /// 2. Config file (if exists)
    /// 3. Defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;

        if s.min_term_months == 0 || s.min_term_months > s.max_term_months {
            return Err(ConfigError::Invalid(format!(
                "term range {}..={} is empty",
                s.min_term_months, s.max_term_months
            )));
        }

        if s.payment_rounding_step <= 0 {
            return Err(ConfigError::Invalid(
                "payment_rounding_step must be greater than 0".into(),
            ));
        }

        if self.reconciliation.amount_tolerance < 0 || self.reconciliation.share_tolerance < 0.0 {
            return Err(ConfigError::Invalid("tolerances must not be negative".into()));
        }

        Ok(())
    }

    /// Applies `INSTALLO_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(value) => {
                    debug!(key, value = %raw, "Overriding config from environment");
                    Some(value)
                }
                Err(_) => {
                    warn!(key, value = %raw, "Ignoring unparseable config override");
                    None
                }
            }
        }

        let s = &mut self.schedule;
        if let Some(v) = parse("INSTALLO_DECLINING_RATE_BPS", lookup("INSTALLO_DECLINING_RATE_BPS")) {
            s.declining_rate_bps = v;
        }
        if let Some(v) = parse("INSTALLO_FLAT_RATE_BPS", lookup("INSTALLO_FLAT_RATE_BPS")) {
            s.flat_rate_bps = v;
        }
        if let Some(v) = parse("INSTALLO_MIN_CUSTOM_RATE_BPS", lookup("INSTALLO_MIN_CUSTOM_RATE_BPS")) {
            s.min_custom_rate_bps = v;
        }
        if let Some(v) = parse("INSTALLO_MIN_TERM_MONTHS", lookup("INSTALLO_MIN_TERM_MONTHS")) {
            s.min_term_months = v;
        }
        if let Some(v) = parse("INSTALLO_MAX_TERM_MONTHS", lookup("INSTALLO_MAX_TERM_MONTHS")) {
            s.max_term_months = v;
        }
        if let Some(v) = parse("INSTALLO_PAYMENT_ROUNDING_STEP", lookup("INSTALLO_PAYMENT_ROUNDING_STEP")) {
            s.payment_rounding_step = v;
        }

        let r = &mut self.reconciliation;
        if let Some(v) = parse("INSTALLO_AMOUNT_TOLERANCE", lookup("INSTALLO_AMOUNT_TOLERANCE")) {
            r.amount_tolerance = v;
        }
        if let Some(v) = parse("INSTALLO_SHARE_TOLERANCE", lookup("INSTALLO_SHARE_TOLERANCE")) {
            r.share_tolerance = v;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "installo", "installo")
            .map(|dirs| dirs.config_dir().join("installo.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.schedule.declining_rate_bps, 400);
        assert_eq!(config.schedule.min_custom_rate_bps, 800);
        assert_eq!(config.reconciliation.amount_tolerance, 1);
        assert_eq!(config.schedule.to_settings(), ScheduleSettings::default());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [schedule]
            declining_rate_bps = 350
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.declining_rate_bps, 350);
        assert_eq!(config.schedule.flat_rate_bps, 400);
        assert_eq!(config.reconciliation, ReconciliationConfig::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("INSTALLO_MAX_TERM_MONTHS", "24"),
            ("INSTALLO_SHARE_TOLERANCE", "0.5"),
            ("INSTALLO_FLAT_RATE_BPS", "four"),
        ]);

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.schedule.max_term_months, 24);
        assert_eq!(config.reconciliation.share_tolerance, 0.5);
        // unparseable value leaves the default
        assert_eq!(config.schedule.flat_rate_bps, 400);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.schedule.min_term_months = 40;
        assert!(config.validate().is_err());

        config.schedule.min_term_months = 2;
        config.schedule.payment_rounding_step = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[schedule]"));
        assert!(toml_str.contains("[reconciliation]"));
    }
}

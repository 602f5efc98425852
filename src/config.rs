use alloy::primitives::U256;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::contracts::addresses::*;
use crate::contracts::parse_address;
use crate::contracts::deviation::DEFAULT_DEVIATION_THRESHOLD;
use crate::error::{MonitorError, Result};
use crate::signing::WithdrawalRoute;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ethereum L1 JSON-RPC endpoint
    pub eth_rpc: String,
    /// Ink L2 JSON-RPC endpoint
    pub ink_rpc: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub prometheus: PrometheusConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub emergency: EmergencyConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    pub gateway_url: String,
    #[serde(default = "default_job_name")]
    pub job_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_retry_times")]
    pub retry_times: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_deviation_threshold")]
    pub price_deviation_threshold: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            retry_times: default_retry_times(),
            retry_delay_secs: default_retry_delay(),
            price_deviation_threshold: default_deviation_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ContractsConfig {
    #[serde(default)]
    pub l1: L1Contracts,
    #[serde(default)]
    pub l2: L2Contracts,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct L1Contracts {
    pub superchain_config: String,
    pub standard_bridge: String,
    pub ink_optimism_portal: String,
    /// Reference ETH/USD feed for the L2 oracle
    pub reference_price_feed: String,
}

impl Default for L1Contracts {
    fn default() -> Self {
        Self {
            superchain_config: L1_SUPERCHAIN_CONFIG.to_string(),
            standard_bridge: L1_STANDARD_BRIDGE.to_string(),
            ink_optimism_portal: L1_INK_OPTIMISM_PORTAL.to_string(),
            reference_price_feed: L1_CHAINLINK_ETH_USD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct L2Contracts {
    pub aave_protocol_data_provider: String,
    pub chaos_push_oracle: String,
    pub variable_debt_inkwlweth: String,
    /// Reserve asset passed to `getPaused` and `getReserveCaps`
    pub monitored_asset: String,
}

impl Default for L2Contracts {
    fn default() -> Self {
        Self {
            aave_protocol_data_provider: L2_AAVE_PROTOCOL_DATA_PROVIDER.to_string(),
            chaos_push_oracle: L2_CHAOS_PUSH_ORACLE.to_string(),
            variable_debt_inkwlweth: L2_VARIABLE_DEBT_INK_WL_WETH.to_string(),
            monitored_asset: L2_WETH.to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    pub enabled: bool,
    pub private_key: String,
    pub safe_address: String,
    pub argus_address: String,
    /// Amount in wei, as a decimal string
    pub withdraw_amount: String,
    pub gateway: String,
    pub pool: String,
    pub wrapped_token: String,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            private_key: String::new(),
            safe_address: String::new(),
            argus_address: String::new(),
            withdraw_amount: String::new(),
            gateway: L2_WETH_GATEWAY_V3.to_string(),
            pool: L2_LENDING_POOL.to_string(),
            wrapped_token: L2_A_INK_WL_WETH.to_string(),
        }
    }
}

impl std::fmt::Debug for EmergencyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmergencyConfig")
            .field("enabled", &self.enabled)
            .field("private_key", &"<redacted>")
            .field("safe_address", &self.safe_address)
            .field("argus_address", &self.argus_address)
            .field("withdraw_amount", &self.withdraw_amount)
            .field("gateway", &self.gateway)
            .field("pool", &self.pool)
            .field("wrapped_token", &self.wrapped_token)
            .finish()
    }
}

impl EmergencyConfig {
    /// Withdrawal amount in wei
    pub fn amount(&self) -> Result<U256> {
        let raw = self.withdraw_amount.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MonitorError::InvalidConfig(format!(
                "emergency.withdraw_amount must be a decimal integer, got {:?}",
                self.withdraw_amount
            )));
        }
        U256::from_str_radix(raw, 10).map_err(|e| {
            MonitorError::InvalidConfig(format!("emergency.withdraw_amount out of range: {e}"))
        })
    }

    pub fn route(&self) -> Result<WithdrawalRoute> {
        Ok(WithdrawalRoute {
            safe: parse_address("emergency.safe_address", &self.safe_address)?,
            argus: parse_address("emergency.argus_address", &self.argus_address)?,
            gateway: parse_address("emergency.gateway", &self.gateway)?,
            pool: parse_address("emergency.pool", &self.pool)?,
            wrapped_token: parse_address("emergency.wrapped_token", &self.wrapped_token)?,
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_job_name() -> String {
    "ink_eth_monitor".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_retry_times() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_deviation_threshold() -> f64 {
    DEFAULT_DEVIATION_THRESHOLD
}

impl AppConfig {
    /// Load configuration from `config/` and the environment
    pub fn load(explicit: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        Self::load_from("config", explicit)
    }

    /// Load configuration from a specific directory, optionally layering an explicit file
    pub fn load_from<P: AsRef<Path>>(
        config_dir: P,
        explicit: Option<&Path>,
    ) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("INK_MONITOR_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            );

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (INK_MONITOR_EMERGENCY__ENABLED, etc.)
        // Values stay strings so wei amounts never pass through a float
        builder = builder.add_source(
            Environment::with_prefix("INK_MONITOR")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.monitor.retry_delay_secs)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        for (field, value) in [("eth_rpc", &self.eth_rpc), ("ink_rpc", &self.ink_rpc)] {
            if value.trim().is_empty() {
                errors.push(format!("{field} must not be empty"));
            } else if let Err(e) = url::Url::parse(value) {
                errors.push(format!("{field} is not a valid URL: {e}"));
            }
        }

        if self.prometheus.gateway_url.trim().is_empty() {
            errors.push("prometheus.gateway_url must not be empty".to_string());
        }

        if self.monitor.poll_interval_secs == 0 {
            errors.push("monitor.poll_interval_secs must be positive".to_string());
        }

        let threshold = self.monitor.price_deviation_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            errors.push("monitor.price_deviation_threshold must be positive".to_string());
        }

        let l1 = &self.contracts.l1;
        let l2 = &self.contracts.l2;
        let addresses = [
            ("contracts.l1.superchain_config", &l1.superchain_config),
            ("contracts.l1.standard_bridge", &l1.standard_bridge),
            ("contracts.l1.ink_optimism_portal", &l1.ink_optimism_portal),
            ("contracts.l1.reference_price_feed", &l1.reference_price_feed),
            ("contracts.l2.aave_protocol_data_provider", &l2.aave_protocol_data_provider),
            ("contracts.l2.chaos_push_oracle", &l2.chaos_push_oracle),
            ("contracts.l2.variable_debt_inkwlweth", &l2.variable_debt_inkwlweth),
            ("contracts.l2.monitored_asset", &l2.monitored_asset),
        ];
        for (field, value) in addresses {
            if let Err(e) = parse_address(field, value) {
                errors.push(e.to_string());
            }
        }

        let emergency = &self.emergency;
        if emergency.enabled {
            if emergency.private_key.trim().is_empty() {
                errors.push("emergency.private_key must not be empty".to_string());
            }
            if emergency.safe_address.trim().is_empty() {
                errors.push("emergency.safe_address must not be empty".to_string());
            }
            if emergency.argus_address.trim().is_empty() {
                errors.push("emergency.argus_address must not be empty".to_string());
            }
            if let Err(e) = emergency.amount() {
                errors.push(e.to_string());
            }
            if errors.is_empty() {
                if let Err(e) = emergency.route() {
                    errors.push(e.to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::InvalidConfig(errors.join("; ")))
        }
    }
}

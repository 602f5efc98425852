//! Emergency withdrawal manager
//!
//! Threshold rules over exported metrics. The first qualifying alert submits
//! one withdrawal through the configured executor; every later alert is a
//! logged no-op until an operator calls `reset`.

use alloy::primitives::{B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::chain::ChainWriter;
use crate::config::EmergencyConfig;
use crate::error::Result;
use crate::metrics::{
    OPTIMISM_PORTAL_PAUSED, ORACLE_PRICE_SPREAD, REMAINING_SUPPLY, STANDARD_BRIDGE_PAUSED,
    SUPERCHAIN_PAUSED, TYDRO_POOL_PAUSED,
};
use crate::signing::{Delegate, Wallet};

pub const PRICE_SPREAD_LIMIT: f64 = 0.05;
pub const MIN_REMAINING_SUPPLY: f64 = 2500.0;

/// Rule class applied to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertRule {
    PauseFlag(&'static str),
    PriceDeviation,
    ReserveHeadroom,
}

impl AlertRule {
    pub fn for_metric(metric_name: &str) -> Option<Self> {
        match metric_name {
            SUPERCHAIN_PAUSED => Some(Self::PauseFlag("SuperChain config")),
            OPTIMISM_PORTAL_PAUSED => Some(Self::PauseFlag("Optimism portal")),
            STANDARD_BRIDGE_PAUSED => Some(Self::PauseFlag("Standard bridge")),
            TYDRO_POOL_PAUSED => Some(Self::PauseFlag("Tydro pool")),
            ORACLE_PRICE_SPREAD => Some(Self::PriceDeviation),
            REMAINING_SUPPLY => Some(Self::ReserveHeadroom),
            _ => None,
        }
    }

    /// Alert reason when `value` breaches the rule
    pub fn evaluate(&self, value: f64) -> Option<String> {
        match self {
            Self::PauseFlag(what) if value == 1.0 => Some(format!("{} is paused", what)),
            Self::PriceDeviation if value > PRICE_SPREAD_LIMIT => Some(format!(
                "oracle price deviation {:.2}% above {:.0}%",
                value * 100.0,
                PRICE_SPREAD_LIMIT * 100.0
            )),
            Self::ReserveHeadroom if value < MIN_REMAINING_SUPPLY => Some(format!(
                "remaining supply {:.2} tokens below {}",
                value, MIN_REMAINING_SUPPLY
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmergencyState {
    pub triggered: bool,
    pub last_trigger_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalIntent {
    pub amount: U256,
    pub reason: String,
}

/// Submits a withdrawal on chain and returns the transaction hash
#[async_trait]
pub trait WithdrawalExecutor: Send + Sync {
    async fn execute(&self, intent: &WithdrawalIntent) -> Result<B256>;
}

enum Mode {
    Disarmed,
    Armed {
        amount: U256,
        executor: Arc<dyn WithdrawalExecutor>,
    },
}

pub struct EmergencyManager {
    mode: Mode,
    state: Mutex<EmergencyState>,
}

impl EmergencyManager {
    /// Manager that ignores every alert
    pub fn disarmed() -> Self {
        info!("emergency withdrawal disabled");
        Self {
            mode: Mode::Disarmed,
            state: Mutex::new(EmergencyState::default()),
        }
    }

    pub fn armed(amount: U256, executor: Arc<dyn WithdrawalExecutor>) -> Self {
        info!(withdraw_amount = %amount, "emergency withdrawal armed");
        Self {
            mode: Mode::Armed { amount, executor },
            state: Mutex::new(EmergencyState::default()),
        }
    }

    /// Disarmed unless enabled; an enabled config must yield a working delegate
    pub fn from_config(cfg: &EmergencyConfig, writer: Arc<dyn ChainWriter>) -> Result<Self> {
        if !cfg.enabled {
            return Ok(Self::disarmed());
        }

        let amount = cfg.amount()?;
        let route = cfg.route()?;
        let wallet = Wallet::from_private_key(&cfg.private_key)?;
        let delegate = Delegate::new(writer, wallet, route);
        Ok(Self::armed(amount, Arc::new(delegate)))
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.mode, Mode::Armed { .. })
    }

    /// Apply the rule for `metric_name`; a breach runs the trigger path
    pub async fn check_alert(&self, metric_name: &str, value: f64) -> Result<()> {
        let Mode::Armed { amount, executor } = &self.mode else {
            return Ok(());
        };

        let Some(reason) = AlertRule::for_metric(metric_name).and_then(|r| r.evaluate(value)) else {
            return Ok(());
        };

        // Held across submission: at most one withdrawal per process
        let mut state = self.state.lock().await;
        if state.triggered {
            warn!(
                reason = %reason,
                last_trigger_time = ?state.last_trigger_time,
                "emergency withdrawal already triggered, skipping"
            );
            return Ok(());
        }

        warn!(metric = metric_name, value, reason = %reason, withdraw_amount = %amount, "triggering emergency withdrawal");
        let intent = WithdrawalIntent {
            amount: *amount,
            reason,
        };

        match executor.execute(&intent).await {
            Ok(tx_hash) => {
                let now = Utc::now();
                state.triggered = true;
                state.last_trigger_time = Some(now);
                info!(tx_hash = %tx_hash, reason = %intent.reason, trigger_time = %now, "emergency withdrawal submitted");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, reason = %intent.reason, "emergency withdrawal failed");
                Err(e)
            }
        }
    }

    pub async fn is_triggered(&self) -> bool {
        self.state.lock().await.triggered
    }

    pub async fn state(&self) -> EmergencyState {
        self.state.lock().await.clone()
    }

    /// Administrative reset; never called from the polling path
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = EmergencyState::default();
        info!("emergency state reset");
    }
}

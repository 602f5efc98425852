//! Metrics sink
//!
//! One gauge per (chain, contract). Values are rendered in Prometheus text
//! exposition format and pushed as a single batch.

pub mod gateway;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::chain::Chain;
use crate::error::Result;

pub use gateway::{HttpPushGateway, PushGateway};

pub const SUPERCHAIN_PAUSED: &str = "ink_eth_monitor_superchain_paused";
pub const OPTIMISM_PORTAL_PAUSED: &str = "ink_eth_monitor_optimism_portal_paused";
pub const STANDARD_BRIDGE_PAUSED: &str = "ink_eth_monitor_standard_bridge_paused";
pub const TYDRO_POOL_PAUSED: &str = "ink_eth_monitor_tydro_pool_paused";
pub const ORACLE_PRICE_SPREAD: &str = "ink_eth_monitor_oracle_price_spread";
pub const REMAINING_SUPPLY: &str = "ink_eth_monitor_remaining_supply";

/// `"{chain}_{contract}"` -> exported metric name
const METRIC_NAMES: &[(&str, &str)] = &[
    ("ethereum_super_chain_config", SUPERCHAIN_PAUSED),
    ("ethereum_ink_optimism_portal", OPTIMISM_PORTAL_PAUSED),
    ("ethereum_l1_standard_bridge", STANDARD_BRIDGE_PAUSED),
    ("ink_aave_protocol_data_provider", TYDRO_POOL_PAUSED),
    ("ink_chaos_push_oracle", ORACLE_PRICE_SPREAD),
    ("ink_variable_debt_InkWlWETH", REMAINING_SUPPLY),
];

pub fn metric_key(chain: Chain, contract: &str) -> String {
    format!("{}_{}", chain.label(), contract)
}

/// Exported name for a (chain, contract) pair
pub fn metric_name(chain: Chain, contract: &str) -> String {
    let key = metric_key(chain, contract);
    METRIC_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("monitor_{}", key))
}

/// One observation of one contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub chain: Chain,
    pub contract: String,
    pub metric_name: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

struct Gauge {
    name: String,
    chain: Chain,
    contract: String,
    bits: AtomicU64,
}

impl Gauge {
    fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Gauge registry plus push transport
pub struct MetricsSink {
    job_name: String,
    gateway: Arc<dyn PushGateway>,
    gauges: RwLock<BTreeMap<String, Gauge>>,
}

impl MetricsSink {
    pub fn new(job_name: &str, gateway: Arc<dyn PushGateway>) -> Self {
        Self {
            job_name: job_name.to_string(),
            gateway,
            gauges: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register the gauge for a contract; repeated registration is a no-op
    pub async fn register(&self, chain: Chain, contract: &str) {
        let key = metric_key(chain, contract);
        let mut gauges = self.gauges.write().await;
        if gauges.contains_key(&key) {
            return;
        }

        let name = metric_name(chain, contract);
        info!(chain = %chain, contract, metric_name = %name, "metric registered");
        gauges.insert(
            key,
            Gauge {
                name,
                chain,
                contract: contract.to_string(),
                bits: AtomicU64::new(0f64.to_bits()),
            },
        );
    }

    /// Set a registered gauge; unknown keys are logged and ignored
    pub async fn set(&self, chain: Chain, contract: &str, value: f64) {
        let key = metric_key(chain, contract);
        match self.gauges.read().await.get(&key) {
            Some(gauge) => {
                gauge.set(value);
                debug!(key = %key, value, "metric set");
            }
            None => warn!(key = %key, "metric not registered"),
        }
    }

    pub async fn get(&self, chain: Chain, contract: &str) -> Option<f64> {
        self.gauges
            .read()
            .await
            .get(&metric_key(chain, contract))
            .map(Gauge::get)
    }

    /// Prometheus text exposition of every registered gauge
    pub async fn render(&self) -> String {
        let gauges = self.gauges.read().await;
        let mut out = String::new();
        for gauge in gauges.values() {
            let _ = writeln!(
                out,
                "# HELP {} Monitor metric for {} contract {}",
                gauge.name, gauge.chain, gauge.contract
            );
            let _ = writeln!(out, "# TYPE {} gauge", gauge.name);
            let _ = writeln!(
                out,
                "{}{{chain=\"{}\",contract=\"{}\"}} {}",
                gauge.name,
                gauge.chain,
                gauge.contract,
                gauge.get()
            );
        }
        out
    }

    /// Push every gauge in one request; local values survive a failed push
    pub async fn push(&self) -> Result<()> {
        let body = self.render().await;
        match self.gateway.push(&self.job_name, body).await {
            Ok(()) => {
                debug!(job = %self.job_name, "metrics pushed to gateway");
                Ok(())
            }
            Err(e) => {
                error!(job = %self.job_name, error = %e, "metrics push failed");
                Err(e)
            }
        }
    }

}

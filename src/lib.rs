pub mod chain;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod coordination;
pub mod emergency;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod retry;
pub mod signing;

#[cfg(test)]
mod test_support;

pub use chain::{Chain, ChainReader, ChainReaders, ChainWriter, RpcChainClient};
pub use config::AppConfig;
pub use contracts::{Account, Category, ContractDescriptor, DeviationProbe, Probe};
pub use coordination::{GracefulShutdown, ShutdownSignal, ShutdownToken};
pub use emergency::{EmergencyManager, EmergencyState, WithdrawalExecutor, WithdrawalIntent};
pub use error::{MonitorError, Result};
pub use metrics::{HttpPushGateway, MetricSample, MetricsSink, PushGateway};
pub use monitor::{watch_list, Poller, PollerSettings, PollerState, Watched};
pub use signing::Wallet;

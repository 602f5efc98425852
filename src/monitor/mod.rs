//! Polling scheduler
//!
//! Reads every watched contract once per tick, updates the metric sink,
//! forwards each value to the emergency manager and pushes the batch.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::chain::{Chain, ChainReaders};
use crate::config::ContractsConfig;
use crate::contracts::{parse_address, Account, DeviationProbe, Probe};
use crate::coordination::ShutdownToken;
use crate::emergency::EmergencyManager;
use crate::error::{MonitorError, Result};
use crate::metrics::{metric_name, MetricSample, MetricsSink};
use crate::retry::retry_do;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Stopped,
}

/// A probe and the chain it is reported under
#[derive(Debug, Clone, PartialEq)]
pub struct Watched {
    pub chain: Chain,
    pub probe: Probe,
}

impl Watched {
    pub fn new(chain: Chain, probe: Probe) -> Self {
        Self { chain, probe }
    }

    pub fn direct(chain: Chain, account: Account) -> Self {
        Self::new(chain, Probe::Direct(account))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub retry_times: u32,
    pub retry_delay: Duration,
}

/// Contracts watched by the service, in polling order
pub fn watch_list(contracts: &ContractsConfig, deviation_threshold: f64) -> Result<Vec<Watched>> {
    let l1 = &contracts.l1;
    let l2 = &contracts.l2;

    let data_provider = parse_address("contracts.l2.aave_protocol_data_provider", &l2.aave_protocol_data_provider)?;
    let asset = parse_address("contracts.l2.monitored_asset", &l2.monitored_asset)?;

    let oracle = DeviationProbe {
        feed: Account::chaos_push_oracle(parse_address("contracts.l2.chaos_push_oracle", &l2.chaos_push_oracle)?),
        feed_chain: Chain::Secondary,
        reference: Account::price_feed(
            "chainlink_eth_usd",
            parse_address("contracts.l1.reference_price_feed", &l1.reference_price_feed)?,
        ),
        reference_chain: Chain::Primary,
        threshold: deviation_threshold,
    };

    Ok(vec![
        Watched::direct(
            Chain::Primary,
            Account::superchain_config(parse_address("contracts.l1.superchain_config", &l1.superchain_config)?),
        ),
        Watched::direct(
            Chain::Primary,
            Account::ink_optimism_portal(parse_address("contracts.l1.ink_optimism_portal", &l1.ink_optimism_portal)?),
        ),
        Watched::direct(
            Chain::Primary,
            Account::l1_standard_bridge(parse_address("contracts.l1.standard_bridge", &l1.standard_bridge)?),
        ),
        Watched::direct(Chain::Secondary, Account::aave_protocol_data_provider(data_provider, asset)),
        Watched::new(Chain::Secondary, Probe::Deviation(oracle)),
        Watched::direct(
            Chain::Secondary,
            Account::variable_debt_ink_wl_weth(
                parse_address("contracts.l2.variable_debt_inkwlweth", &l2.variable_debt_inkwlweth)?,
                data_provider,
                asset,
            ),
        ),
    ])
}

pub struct Poller {
    watched: Vec<Watched>,
    readers: ChainReaders,
    sink: Arc<MetricsSink>,
    emergency: Arc<EmergencyManager>,
    settings: PollerSettings,
    state: watch::Sender<PollerState>,
}

impl Poller {
    pub fn new(
        watched: Vec<Watched>,
        readers: ChainReaders,
        sink: Arc<MetricsSink>,
        emergency: Arc<EmergencyManager>,
        settings: PollerSettings,
    ) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            watched,
            readers,
            sink,
            emergency,
            settings,
            state,
        }
    }

    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    pub fn watched(&self) -> &[Watched] {
        &self.watched
    }

    /// Ask a running loop to exit after its current tick
    pub fn stop(&self) {
        self.state.send_replace(PollerState::Stopped);
    }

    /// One gauge per watched (chain, contract)
    pub async fn register_gauges(&self) {
        for w in &self.watched {
            self.sink.register(w.chain, w.probe.name()).await;
        }
    }

    /// Register gauges and poll until cancelled or stopped
    pub async fn run(&self, token: ShutdownToken) -> Result<()> {
        if self.state() == PollerState::Stopped {
            return Ok(());
        }

        self.register_gauges().await;

        self.state.send_if_modified(|s| {
            if *s == PollerState::Idle {
                *s = PollerState::Polling;
                true
            } else {
                false
            }
        });
        info!(
            contracts = self.watched.len(),
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            "poller started"
        );

        let mut cancel = token.clone();
        let mut state_rx = self.state.subscribe();
        let period = self.settings.poll_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.tick(&token).await;

        loop {
            if self.state() == PollerState::Stopped {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested, stopping poller");
                    break;
                }
                // The watch::Ref guard must not outlive this branch
                _ = async { let _ = state_rx.wait_for(|s| *s == PollerState::Stopped).await; } => {
                    info!("poller stop requested");
                    break;
                }
                _ = ticker.tick() => self.tick(&token).await,
            }
        }

        self.state.send_replace(PollerState::Stopped);
        if let Err(e) = self.sink.push().await {
            error!(error = %e, "final metrics push failed");
        }
        info!("poller stopped");
        Ok(())
    }

    /// One polling pass followed by exactly one push
    pub async fn tick(&self, token: &ShutdownToken) {
        let samples = self.poll_once(token).await;
        debug!(samples = samples.len(), "tick complete");

        if let Err(e) = self.sink.push().await {
            warn!(error = %e, "metrics push failed, values kept for next tick");
        }
    }

    /// Evaluate every probe once; failures are logged per contract
    pub async fn poll_once(&self, token: &ShutdownToken) -> Vec<MetricSample> {
        let mut samples = Vec::with_capacity(self.watched.len());

        for w in &self.watched {
            let contract = w.probe.name();
            let result = retry_do(
                token,
                || w.probe.evaluate(w.chain, &self.readers),
                self.settings.retry_times,
                self.settings.retry_delay,
            )
            .await;

            let value = match result {
                Ok(value) => value,
                Err(MonitorError::Cancelled) => {
                    debug!(chain = %w.chain, contract, "poll cancelled");
                    break;
                }
                Err(e) => {
                    error!(chain = %w.chain, contract, error = %e, "contract poll failed");
                    continue;
                }
            };

            let name = metric_name(w.chain, contract);
            self.sink.set(w.chain, contract, value).await;
            info!(chain = %w.chain, contract, metric = %name, value, "contract polled");

            if let Err(e) = self.emergency.check_alert(&name, value).await {
                error!(chain = %w.chain, contract, error = %e, "emergency response failed");
            }

            samples.push(MetricSample {
                chain: w.chain,
                contract: contract.to_string(),
                metric_name: name,
                value,
                timestamp: Utc::now(),
            });
        }

        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::abi::uint_word;
    use crate::contracts::addresses;
    use crate::coordination::{GracefulShutdown, ShutdownSignal};
    use crate::emergency::{WithdrawalExecutor, WithdrawalIntent};
    use crate::metrics::gateway::MockPushGateway;
    use crate::metrics::{REMAINING_SUPPLY, STANDARD_BRIDGE_PAUSED};
    use crate::test_support::FakeReader;
    use alloy::primitives::{Address, Bytes, B256, U256};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn word(v: u128) -> Bytes {
        Bytes::copy_from_slice(&uint_word(U256::from(v)))
    }

    /// Both chains healthy: nothing paused, prices equal, 4997.5 headroom
    fn healthy_readers() -> (Arc<FakeReader>, Arc<FakeReader>) {
        let l1 = Arc::new(FakeReader::new());
        l1.respond(addr(addresses::L1_SUPERCHAIN_CONFIG), "paused()", word(0));
        l1.respond(addr(addresses::L1_INK_OPTIMISM_PORTAL), "paused()", word(0));
        l1.respond(addr(addresses::L1_STANDARD_BRIDGE), "paused()", word(0));
        l1.respond(addr(addresses::L1_CHAINLINK_ETH_USD), "latestAnswer()", word(300_000_000_000));

        let l2 = Arc::new(FakeReader::new());
        let provider = addr(addresses::L2_AAVE_PROTOCOL_DATA_PROVIDER);
        l2.respond(provider, "getPaused(address)", word(0));
        l2.respond(addr(addresses::L2_CHAOS_PUSH_ORACLE), "latestAnswer()", word(301_000_000_000));
        let mut caps = uint_word(U256::from(4000u64)).to_vec();
        caps.extend_from_slice(&uint_word(U256::from(5000u64)));
        l2.respond(provider, "getReserveCaps(address)", Bytes::from(caps));
        l2.respond(
            addr(addresses::L2_VARIABLE_DEBT_INK_WL_WETH),
            "totalSupply()",
            word(2_500_000_000_000_000_000),
        );

        (l1, l2)
    }

    fn settings() -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_secs(60),
            retry_times: 1,
            retry_delay: Duration::from_secs(5),
        }
    }

    fn counting_gateway(pushes: Arc<AtomicUsize>) -> MockPushGateway {
        let mut gateway = MockPushGateway::new();
        gateway.expect_push().returning(move |_, _| {
            pushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        gateway
    }

    fn poller(l1: Arc<FakeReader>, l2: Arc<FakeReader>, gateway: MockPushGateway, emergency: EmergencyManager) -> Poller {
        let watched = watch_list(&ContractsConfig::default(), 0.05).unwrap();
        Poller::new(
            watched,
            ChainReaders::new(l1, l2),
            Arc::new(MetricsSink::new("ink_eth_monitor", Arc::new(gateway))),
            Arc::new(emergency),
            settings(),
        )
    }

    #[derive(Default)]
    struct CountingExecutor {
        calls: AtomicU32,
    }

    #[async_trait]
    impl WithdrawalExecutor for CountingExecutor {
        async fn execute(&self, _intent: &WithdrawalIntent) -> Result<B256> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(B256::ZERO)
        }
    }

    #[test]
    fn test_watch_list_order_and_names() {
        let watched = watch_list(&ContractsConfig::default(), 0.05).unwrap();
        let names: Vec<_> = watched
            .iter()
            .map(|w| metric_name(w.chain, w.probe.name()))
            .collect();
        assert_eq!(
            names,
            vec![
                "ink_eth_monitor_superchain_paused",
                "ink_eth_monitor_optimism_portal_paused",
                "ink_eth_monitor_standard_bridge_paused",
                "ink_eth_monitor_tydro_pool_paused",
                "ink_eth_monitor_oracle_price_spread",
                "ink_eth_monitor_remaining_supply",
            ]
        );
    }

    #[test]
    fn test_watch_list_rejects_bad_address() {
        let mut contracts = ContractsConfig::default();
        contracts.l1.standard_bridge = "0x1234".to_string();
        let err = watch_list(&contracts, 0.05).unwrap_err();
        assert!(matches!(err, MonitorError::AddressParsing(_)));
    }

    #[tokio::test]
    async fn test_poll_once_reads_every_contract() {
        let (l1, l2) = healthy_readers();
        let poller = poller(l1, l2, MockPushGateway::new(), EmergencyManager::disarmed());
        let shutdown = GracefulShutdown::new();

        let samples = poller.poll_once(&shutdown.token()).await;
        assert_eq!(samples.len(), 6);
        assert!(samples[..5].iter().all(|s| s.value == 0.0));
        assert_eq!(samples[5].metric_name, REMAINING_SUPPLY);
        assert_eq!(samples[5].value, 4997.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failing_contract_does_not_block_others() {
        let (l1, l2) = healthy_readers();
        l1.fail(addr(addresses::L1_STANDARD_BRIDGE), "paused()", "connection refused");
        let poller = poller(l1.clone(), l2, MockPushGateway::new(), EmergencyManager::disarmed());
        let shutdown = GracefulShutdown::new();

        let samples = poller.poll_once(&shutdown.token()).await;
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.contract != "l1_standard_bridge"));
        // 2 superchain/portal reads, 2 bridge attempts, 1 reference price read
        assert_eq!(l1.calls(), 5);
    }

    #[tokio::test]
    async fn test_pause_alert_triggers_single_withdrawal() {
        let (l1, l2) = healthy_readers();
        l1.respond(addr(addresses::L1_STANDARD_BRIDGE), "paused()", word(1));
        let executor = Arc::new(CountingExecutor::default());
        let emergency = EmergencyManager::armed(U256::from(1u64), executor.clone());
        let poller = poller(l1, l2, MockPushGateway::new(), emergency);
        let shutdown = GracefulShutdown::new();

        let first = poller.poll_once(&shutdown.token()).await;
        poller.poll_once(&shutdown.token()).await;

        let bridge = first.iter().find(|s| s.metric_name == STANDARD_BRIDGE_PAUSED).unwrap();
        assert_eq!(bridge.value, 1.0);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pushes_per_tick_and_on_stop() {
        let (l1, l2) = healthy_readers();
        let pushes = Arc::new(AtomicUsize::new(0));
        let poller = Arc::new(poller(l1, l2, counting_gateway(pushes.clone()), EmergencyManager::disarmed()));
        let shutdown = GracefulShutdown::new();

        let runner = poller.clone();
        let token = shutdown.token();
        let task = tokio::spawn(async move { runner.run(token).await });

        // Immediate tick plus two interval ticks
        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(poller.state(), PollerState::Polling);
        poller.stop();
        task.await.unwrap().unwrap();

        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(pushes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_run_with_final_push() {
        let (l1, l2) = healthy_readers();
        let pushes = Arc::new(AtomicUsize::new(0));
        let poller = Arc::new(poller(l1, l2, counting_gateway(pushes.clone()), EmergencyManager::disarmed()));
        let shutdown = GracefulShutdown::new();

        let runner = poller.clone();
        let token = shutdown.token();
        let task = tokio::spawn(async move { runner.run(token).await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        shutdown.request_shutdown(ShutdownSignal::Graceful);
        task.await.unwrap().unwrap();

        assert_eq!(poller.state(), PollerState::Stopped);
        assert_eq!(pushes.load(Ordering::SeqCst), 2);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_run_future_is_send() {
        let (l1, l2) = healthy_readers();
        let poller = poller(l1, l2, MockPushGateway::new(), EmergencyManager::disarmed());
        let shutdown = GracefulShutdown::new();
        let fut = poller.run(shutdown.token());
        assert_send(&fut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_push_carries_a_completed_tick() {
        let (l1, l2) = healthy_readers();
        let bodies = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let mut gateway = MockPushGateway::new();
        let recorded = bodies.clone();
        gateway.expect_push().returning(move |_, body| {
            recorded.lock().unwrap().push(body);
            Ok(())
        });
        let poller = Arc::new(poller(l1, l2, gateway, EmergencyManager::disarmed()));
        let shutdown = GracefulShutdown::new();

        let runner = poller.clone();
        let token = shutdown.token();
        let task = tokio::spawn(async move { runner.run(token).await });

        tokio::time::sleep(Duration::from_secs(65)).await;
        poller.stop();
        task.await.unwrap().unwrap();

        let bodies = bodies.lock().unwrap();
        assert_eq!(bodies.len(), 3);
        for body in bodies.iter() {
            assert!(
                body.contains("ink_eth_monitor_remaining_supply{chain=\"ink\",contract=\"variable_debt_InkWlWETH\"} 4997.5"),
                "partial batch pushed: {body}"
            );
        }
    }

    #[tokio::test]
    async fn test_registered_gauges_take_polled_values() {
        let (l1, l2) = healthy_readers();
        let poller = poller(l1, l2, MockPushGateway::new(), EmergencyManager::disarmed());
        let shutdown = GracefulShutdown::new();

        poller.register_gauges().await;
        poller.poll_once(&shutdown.token()).await;

        assert_eq!(
            poller.sink.get(Chain::Secondary, "variable_debt_InkWlWETH").await,
            Some(4997.5)
        );
        assert_eq!(poller.sink.get(Chain::Primary, "l1_standard_bridge").await, Some(0.0));
    }

    #[tokio::test]
    async fn test_stopped_poller_does_not_run() {
        let (l1, l2) = healthy_readers();
        let poller = poller(l1.clone(), l2, MockPushGateway::new(), EmergencyManager::disarmed());
        poller.stop();

        poller.run(GracefulShutdown::new().token()).await.unwrap();
        assert_eq!(l1.calls(), 0);
    }
}

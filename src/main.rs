use clap::Parser;
use ink_monitor::chain::{ChainReaders, ChainWriter, RpcChainClient};
use ink_monitor::cli::{self, Cli, Commands};
use ink_monitor::config::AppConfig;
use ink_monitor::coordination::{install_signal_handlers, GracefulShutdown};
use ink_monitor::emergency::EmergencyManager;
use ink_monitor::error::Result;
use ink_monitor::metrics::{HttpPushGateway, MetricsSink};
use ink_monitor::monitor::{watch_list, Poller, PollerSettings};
use std::sync::Arc;
use tracing::info;

mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = main_runtime::init_logging(&config.logging);
    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check { json } => check(config, json).await,
    }
}

struct Clients {
    eth: Arc<RpcChainClient>,
    ink: Arc<RpcChainClient>,
}

impl Clients {
    fn connect(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            eth: Arc::new(RpcChainClient::connect("ethereum", &config.eth_rpc)?),
            ink: Arc::new(RpcChainClient::connect("ink", &config.ink_rpc)?),
        })
    }

    fn readers(&self) -> ChainReaders {
        ChainReaders::new(self.eth.clone(), self.ink.clone())
    }
}

fn build_poller(config: &AppConfig, clients: &Clients, emergency: EmergencyManager) -> Result<Poller> {
    let gateway = Arc::new(HttpPushGateway::new(&config.prometheus.gateway_url)?);
    let sink = Arc::new(MetricsSink::new(&config.prometheus.job_name, gateway));
    let watched = watch_list(&config.contracts, config.monitor.price_deviation_threshold)?;
    let settings = PollerSettings {
        poll_interval: config.poll_interval(),
        retry_times: config.monitor.retry_times,
        retry_delay: config.retry_delay(),
    };

    Ok(Poller::new(watched, clients.readers(), sink, Arc::new(emergency), settings))
}

async fn run(config: AppConfig) -> Result<()> {
    info!(
        eth_rpc = %config.eth_rpc,
        ink_rpc = %config.ink_rpc,
        gateway = %config.prometheus.gateway_url,
        emergency_enabled = config.emergency.enabled,
        "starting ink-monitor"
    );

    let clients = Clients::connect(&config)?;
    let writer: Arc<dyn ChainWriter> = clients.ink.clone();
    let emergency = EmergencyManager::from_config(&config.emergency, writer)?;
    let poller = build_poller(&config, &clients, emergency)?;

    let shutdown = Arc::new(GracefulShutdown::new());
    install_signal_handlers(shutdown.clone()).await;

    poller.run(shutdown.token()).await?;
    info!("ink-monitor stopped");
    Ok(())
}

async fn check(config: AppConfig, json: bool) -> Result<()> {
    let clients = Clients::connect(&config)?;
    let poller = build_poller(&config, &clients, EmergencyManager::disarmed())?;
    let shutdown = GracefulShutdown::new();

    poller.register_gauges().await;
    let samples = poller.poll_once(&shutdown.token()).await;
    if json {
        let out = serde_json::to_string_pretty(&samples).map_err(anyhow::Error::from)?;
        println!("{}", out);
    } else {
        print!("{}", cli::format_samples(&samples));
    }

    if samples.len() < poller.watched().len() {
        eprintln!(
            "{} of {} contracts could not be read, see log for details",
            poller.watched().len() - samples.len(),
            poller.watched().len()
        );
    }
    Ok(())
}

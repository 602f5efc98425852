use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::metrics::MetricSample;

#[derive(Parser)]
#[command(name = "ink-monitor")]
#[command(version)]
#[command(about = "Ethereum L1 / Ink L2 contract safety monitor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file layered over config/default.toml
    #[arg(short, long, env = "INK_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the monitor until SIGINT/SIGTERM (default)
    Run,
    /// Poll every contract once and print the values; nothing is pushed or submitted
    Check {
        /// Print samples as JSON
        #[arg(long)]
        json: bool,
    },
}

/// One line per sample for terminal output
pub fn format_samples(samples: &[MetricSample]) -> String {
    let mut out = format!("{:<9} {:<28} {:<40} {:>14}\n", "CHAIN", "CONTRACT", "METRIC", "VALUE");
    for s in samples {
        out.push_str(&format!(
            "{:<9} {:<28} {:<40} {:>14}\n",
            s.chain.label(),
            s.contract,
            s.metric_name,
            s.value
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chain;
    use chrono::Utc;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["ink-monitor"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_check_with_config() {
        let cli = Cli::parse_from(["ink-monitor", "--config", "prod.toml", "check", "--json"]);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert_eq!(cli.command, Some(Commands::Check { json: true }));
    }

    #[test]
    fn test_format_samples() {
        let samples = vec![MetricSample {
            chain: Chain::Secondary,
            contract: "variable_debt_InkWlWETH".to_string(),
            metric_name: "ink_eth_monitor_remaining_supply".to_string(),
            value: 4997.5,
            timestamp: Utc::now(),
        }];
        let text = format_samples(&samples);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("ink_eth_monitor_remaining_supply"));
        assert!(text.contains("4997.5"));
    }
}

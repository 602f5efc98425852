//! Cross-chain price deviation
//!
//! Wraps a price-feed account and compares it with a reference feed read on
//! the other chain. The reported metric is a 0/1 flag: 1.0 once the
//! fractional deviation strictly exceeds the threshold.

use tracing::info;

use super::Account;
use crate::chain::{Chain, ChainReaders};
use crate::error::Result;

/// Default deviation threshold (5%)
pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 0.05;

/// Price feed checked against a reference feed
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationProbe {
    pub feed: Account,
    pub feed_chain: Chain,
    pub reference: Account,
    pub reference_chain: Chain,
    pub threshold: f64,
}

impl DeviationProbe {
    /// `|feed - reference| / reference`, zero when the reference reads zero
    pub fn deviation(feed_price: f64, reference_price: f64) -> f64 {
        if reference_price == 0.0 {
            return 0.0;
        }
        ((feed_price - reference_price) / reference_price).abs()
    }

    pub async fn evaluate(&self, readers: &ChainReaders) -> Result<f64> {
        let feed_price = self.feed.monitor(readers.get(self.feed_chain)).await?;
        let reference_price = self.reference.monitor(readers.get(self.reference_chain)).await?;

        let deviation = Self::deviation(feed_price, reference_price);
        let flag = if deviation > self.threshold { 1.0 } else { 0.0 };

        info!(
            contract = self.feed.name(),
            feed_price,
            reference_price,
            deviation,
            alert_value = flag,
            "price feed deviation checked"
        );

        Ok(flag)
    }
}

/// Something the scheduler can evaluate into one metric value
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    /// Plain account read on its own chain
    Direct(Account),
    /// Account compared against a reference on another chain
    Deviation(DeviationProbe),
}

impl Probe {
    /// The account whose name keys the metric
    pub fn account(&self) -> &Account {
        match self {
            Probe::Direct(account) => account,
            Probe::Deviation(probe) => &probe.feed,
        }
    }

    pub fn name(&self) -> &str {
        self.account().name()
    }

    pub async fn evaluate(&self, chain: Chain, readers: &ChainReaders) -> Result<f64> {
        match self {
            Probe::Direct(account) => account.monitor(readers.get(chain)).await,
            Probe::Deviation(probe) => probe.evaluate(readers).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::abi::uint_word;
    use crate::contracts::addresses;
    use crate::test_support::FakeReader;
    use alloy::primitives::{Address, Bytes, U256};
    use std::sync::Arc;

    fn price_word(raw: u64) -> Bytes {
        Bytes::copy_from_slice(&uint_word(U256::from(raw)))
    }

    fn probe(feed: Address, reference: Address) -> DeviationProbe {
        DeviationProbe {
            feed: Account::chaos_push_oracle(feed),
            feed_chain: Chain::Secondary,
            reference: Account::price_feed("chainlink_eth_usd", reference),
            reference_chain: Chain::Primary,
            threshold: DEFAULT_DEVIATION_THRESHOLD,
        }
    }

    #[test]
    fn test_deviation_math() {
        assert_eq!(DeviationProbe::deviation(105.0, 100.0), 0.05);
        assert_eq!(DeviationProbe::deviation(95.0, 100.0), 0.05);
        assert_eq!(DeviationProbe::deviation(100.0, 0.0), 0.0);
    }

    #[tokio::test]
    async fn test_flag_raised_above_threshold() {
        let feed: Address = addresses::L2_CHAOS_PUSH_ORACLE.parse().unwrap();
        let reference: Address = addresses::L1_CHAINLINK_ETH_USD.parse().unwrap();

        let l1 = Arc::new(FakeReader::new());
        let l2 = Arc::new(FakeReader::new());
        l1.respond(reference, "latestAnswer()", price_word(300_000_000_000));
        l2.respond(feed, "latestAnswer()", price_word(330_000_000_000));

        let readers = ChainReaders::new(l1.clone(), l2.clone());
        let p = Probe::Deviation(probe(feed, reference));
        assert_eq!(p.name(), "chaos_push_oracle");
        assert_eq!(p.evaluate(Chain::Secondary, &readers).await.unwrap(), 1.0);

        // 1% apart stays quiet
        l2.respond(feed, "latestAnswer()", price_word(303_000_000_000));
        assert_eq!(p.evaluate(Chain::Secondary, &readers).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_reference_failure_surfaces() {
        let feed: Address = addresses::L2_CHAOS_PUSH_ORACLE.parse().unwrap();
        let reference: Address = addresses::L1_CHAINLINK_ETH_USD.parse().unwrap();

        let l1 = Arc::new(FakeReader::new());
        let l2 = Arc::new(FakeReader::new());
        l1.fail(reference, "latestAnswer()", "timeout");
        l2.respond(feed, "latestAnswer()", price_word(300_000_000_000));

        let readers = ChainReaders::new(l1, l2);
        assert!(probe(feed, reference).evaluate(&readers).await.is_err());
    }
}

//! JSON-RPC access to the monitored chains
//!
//! `ChainReader` is the read path used by every contract account;
//! `ChainWriter` covers the handful of calls the emergency delegate needs.
//! Both are implemented by `RpcChainClient` over an alloy HTTP provider.

use alloy::eips::BlockNumberOrTag;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{MonitorError, Result};

/// Read-only contract calls
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block, returning the raw return data
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// Write-side RPC used to build and submit a signed transaction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    async fn chain_id(&self) -> Result<u64>;

    async fn estimate_gas(&self, from: Address, to: Address, value: U256, data: Bytes) -> Result<u64>;

    async fn max_priority_fee(&self) -> Result<u128>;

    /// Base fee of the latest block
    async fn latest_base_fee(&self) -> Result<u128>;

    /// Broadcast an EIP-2718 encoded signed transaction
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256>;
}

/// Chain client over an HTTP provider
#[derive(Clone)]
pub struct RpcChainClient {
    label: String,
    provider: RootProvider,
}

impl RpcChainClient {
    /// Connect to an HTTP JSON-RPC endpoint
    pub fn connect(label: &str, rpc_url: &str) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| MonitorError::InvalidConfig(format!("invalid {label} RPC URL: {e}")))?;
        let provider = RootProvider::new_http(url);

        info!(chain = label, "RPC client created");

        Ok(Self {
            label: label.to_string(),
            provider,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn rpc_err(&self, op: &str, e: impl std::fmt::Display) -> MonitorError {
        MonitorError::Rpc(format!("{} {op} failed: {e}", self.label))
    }
}

#[async_trait]
impl ChainReader for RpcChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        debug!(chain = %self.label, contract = %to, calldata = %hex::encode(&data), "eth_call");

        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.provider
            .call(tx)
            .block(BlockNumberOrTag::Latest.into())
            .await
            .map_err(|e| self.rpc_err("eth_call", e))
    }
}

#[async_trait]
impl ChainWriter for RpcChainClient {
    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| self.rpc_err("get nonce", e))
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| self.rpc_err("chain id", e))
    }

    async fn estimate_gas(&self, from: Address, to: Address, value: U256, data: Bytes) -> Result<u64> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_input(data);
        self.provider
            .estimate_gas(tx)
            .await
            .map_err(|e| self.rpc_err("estimate gas", e))
    }

    async fn max_priority_fee(&self) -> Result<u128> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| self.rpc_err("max priority fee", e))
    }

    async fn latest_base_fee(&self) -> Result<u128> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| self.rpc_err("latest block", e))?
            .ok_or_else(|| self.rpc_err("latest block", "node returned no block"))?;

        block
            .header
            .base_fee_per_gas
            .map(u128::from)
            .ok_or_else(|| self.rpc_err("latest block", "block has no base fee"))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| self.rpc_err("send raw transaction", e))?;
        Ok(*pending.tx_hash())
    }
}

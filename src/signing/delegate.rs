//! Emergency withdrawal delegate
//!
//! Builds the approve-then-withdraw batch, wraps it in the multisig
//! module call and submits it as a signed EIP-1559 transaction.

use alloy::consensus::TxEip1559;
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::multisig;
use super::wallet::Wallet;
use crate::chain::ChainWriter;
use crate::emergency::{WithdrawalExecutor, WithdrawalIntent};
use crate::error::{MonitorError, Result};

/// Minimum gas limit for the batch, regardless of the node's estimate
pub const MIN_GAS_LIMIT: u64 = 3_000_000;

/// Addresses involved in the withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalRoute {
    /// Multisig wallet receiving the funds
    pub safe: Address,
    /// Module on the Safe that executes the batch
    pub argus: Address,
    pub gateway: Address,
    pub pool: Address,
    /// aToken approved for the gateway
    pub wrapped_token: Address,
}

pub struct Delegate {
    writer: Arc<dyn ChainWriter>,
    wallet: Wallet,
    route: WithdrawalRoute,
}

fn submission(step: &str, e: MonitorError) -> MonitorError {
    MonitorError::Submission(format!("{step}: {e}"))
}

impl Delegate {
    pub fn new(writer: Arc<dyn ChainWriter>, wallet: Wallet, route: WithdrawalRoute) -> Self {
        info!(
            operator = %wallet.address(),
            safe = %route.safe,
            argus = %route.argus,
            "withdrawal delegate ready"
        );
        Self {
            writer,
            wallet,
            route,
        }
    }

    pub fn calldata(&self, amount: U256) -> Bytes {
        multisig::withdrawal_batch(
            self.route.wrapped_token,
            self.route.gateway,
            self.route.pool,
            self.route.safe,
            amount,
        )
    }

    /// Build, sign and broadcast the withdrawal; any failing step aborts
    pub async fn withdraw_eth(&self, amount: U256) -> Result<B256> {
        let from = self.wallet.address();
        let to = self.route.argus;
        let input = self.calldata(amount);

        let nonce = self
            .writer
            .pending_nonce(from)
            .await
            .map_err(|e| submission("get nonce", e))?;
        let chain_id = self
            .writer
            .chain_id()
            .await
            .map_err(|e| submission("get chain id", e))?;
        let estimated = self
            .writer
            .estimate_gas(from, to, U256::ZERO, input.clone())
            .await
            .map_err(|e| submission("estimate gas", e))?;
        let gas_limit = estimated.max(MIN_GAS_LIMIT);
        let tip = self
            .writer
            .max_priority_fee()
            .await
            .map_err(|e| submission("get priority fee", e))?;
        let base_fee = self
            .writer
            .latest_base_fee()
            .await
            .map_err(|e| submission("get base fee", e))?;
        let max_fee = tip.saturating_add(base_fee.saturating_mul(2));

        debug!(nonce, chain_id, estimated, gas_limit, tip, base_fee, max_fee, "withdrawal transaction priced");

        let tx = TxEip1559 {
            chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: tip,
            to: TxKind::Call(to),
            value: U256::ZERO,
            input,
            access_list: Default::default(),
        };
        let envelope = self.wallet.sign_eip1559(tx).map_err(|e| submission("sign", e))?;
        let raw = Bytes::from(envelope.encoded_2718());

        let tx_hash = self
            .writer
            .send_raw_transaction(raw)
            .await
            .map_err(|e| submission("send transaction", e))?;

        info!(tx_hash = %tx_hash, amount = %amount, safe = %self.route.safe, "withdrawal transaction sent");
        Ok(tx_hash)
    }
}

#[async_trait]
impl WithdrawalExecutor for Delegate {
    async fn execute(&self, intent: &WithdrawalIntent) -> Result<B256> {
        info!(reason = %intent.reason, amount = %intent.amount, "executing emergency withdrawal");
        self.withdraw_eth(intent.amount).await
    }
}

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::str::FromStr;
use tracing::info;
use zeroize::Zeroize;

use crate::error::{MonitorError, Result};

/// Local key used to sign the emergency withdrawal
///
/// # Security
/// The hex key is zeroized as soon as it is parsed and is never stored.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a private key hex string, with or without `0x`
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let mut secure_key = private_key.trim().trim_start_matches("0x").to_string();
        let parsed = PrivateKeySigner::from_str(&secure_key);
        secure_key.zeroize();

        let signer = parsed.map_err(|e| MonitorError::Wallet(format!("Invalid private key: {}", e)))?;
        info!("Wallet initialized: {} (private key zeroized from memory)", signer.address());

        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign an EIP-1559 transaction into a broadcastable envelope
    pub fn sign_eip1559(&self, tx: TxEip1559) -> Result<TxEnvelope> {
        let hash = tx.signature_hash();
        let sig = self
            .signer
            .sign_hash_sync(&hash)
            .map_err(|e| MonitorError::Wallet(format!("Failed to sign transaction: {}", e)))?;
        Ok(TxEnvelope::Eip1559(tx.into_signed(sig)))
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address()).finish()
    }
}

//! Signing and emergency withdrawal submission

pub mod delegate;
pub mod multisig;
pub mod wallet;

pub use delegate::{Delegate, WithdrawalRoute};
pub use wallet::Wallet;

//! Monitored contract accounts
//!
//! Every monitored contract is one `Account` variant. The variant fixes which
//! functions are called and how the return data is decoded, so the decoding
//! policy never changes for the lifetime of the process.

pub mod addresses;
pub mod deviation;

use alloy::primitives::Address;
use tracing::debug;

use crate::chain::abi::{self, CallEnvelope, DecodedResult};
use crate::chain::ChainReader;
use crate::error::{DecodeError, MonitorError, Result};

pub use deviation::{DeviationProbe, Probe};

/// Decimals of the push oracle answer
pub const PRICE_FEED_DECIMALS: u8 = 8;
/// Decimals of the debt token supply
pub const TOKEN_DECIMALS: u8 = 18;

/// Contract category; selects the call and decoding policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    PauseSimple,
    GetPaused,
    PriceFeed,
    ReserveCap,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PauseSimple => "pause_simple",
            Category::GetPaused => "get_paused",
            Category::PriceFeed => "price_feed",
            Category::ReserveCap => "reserve_cap",
        }
    }

    /// Decode the primary call's return data
    pub fn decode(&self, raw: &[u8]) -> std::result::Result<DecodedResult, DecodeError> {
        match self {
            Category::PauseSimple | Category::GetPaused => abi::as_bool(raw).map(DecodedResult::Boolean),
            Category::PriceFeed => abi::as_int256(raw).map(DecodedResult::SignedInt256),
            // (borrowCap, supplyCap) tuple, split by the caller
            Category::ReserveCap => Ok(DecodedResult::RawBytes(abi::as_raw(raw))),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a monitored contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDescriptor {
    pub name: String,
    pub address: Address,
    pub category: Category,
}

impl ContractDescriptor {
    pub fn new(name: &str, address: Address, category: Category) -> Self {
        Self {
            name: name.to_string(),
            address,
            category,
        }
    }
}

/// A monitored contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// `paused()` flag
    PauseSimple(ContractDescriptor),
    /// `getPaused(asset)` on a lending data provider
    GetPaused {
        descriptor: ContractDescriptor,
        asset: Address,
    },
    /// `latestAnswer()` push oracle
    PriceFeed(ContractDescriptor),
    /// Remaining supply headroom of a reserve, read through its debt token
    ReserveCap {
        descriptor: ContractDescriptor,
        data_provider: Address,
        asset: Address,
    },
}

impl Account {
    pub fn superchain_config(address: Address) -> Self {
        Self::pause_flag("super_chain_config", address)
    }

    pub fn ink_optimism_portal(address: Address) -> Self {
        Self::pause_flag("ink_optimism_portal", address)
    }

    pub fn l1_standard_bridge(address: Address) -> Self {
        Self::pause_flag("l1_standard_bridge", address)
    }

    pub fn pause_flag(name: &str, address: Address) -> Self {
        Account::PauseSimple(ContractDescriptor::new(name, address, Category::PauseSimple))
    }

    pub fn aave_protocol_data_provider(address: Address, asset: Address) -> Self {
        Account::GetPaused {
            descriptor: ContractDescriptor::new(
                "aave_protocol_data_provider",
                address,
                Category::GetPaused,
            ),
            asset,
        }
    }

    pub fn chaos_push_oracle(address: Address) -> Self {
        Self::price_feed("chaos_push_oracle", address)
    }

    pub fn price_feed(name: &str, address: Address) -> Self {
        Account::PriceFeed(ContractDescriptor::new(name, address, Category::PriceFeed))
    }

    pub fn variable_debt_ink_wl_weth(token: Address, data_provider: Address, asset: Address) -> Self {
        Account::ReserveCap {
            descriptor: ContractDescriptor::new(
                "variable_debt_InkWlWETH",
                token,
                Category::ReserveCap,
            ),
            data_provider,
            asset,
        }
    }

    pub fn descriptor(&self) -> &ContractDescriptor {
        match self {
            Account::PauseSimple(d) | Account::PriceFeed(d) => d,
            Account::GetPaused { descriptor, .. } | Account::ReserveCap { descriptor, .. } => descriptor,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor().name
    }

    pub fn address(&self) -> Address {
        self.descriptor().address
    }

    pub fn category(&self) -> Category {
        self.descriptor().category
    }

    /// Read the contract and reduce it to one metric value
    pub async fn monitor(&self, reader: &dyn ChainReader) -> Result<f64> {
        let value = match self {
            Account::PauseSimple(d) => {
                let call = CallEnvelope::new(d.address, "paused()");
                flag_value(self.fetch(reader, &call).await?)?
            }
            Account::GetPaused { descriptor, asset } => {
                let call = CallEnvelope::new(descriptor.address, "getPaused(address)")
                    .with_address_arg(*asset);
                flag_value(self.fetch(reader, &call).await?)?
            }
            Account::PriceFeed(d) => {
                let call = CallEnvelope::new(d.address, "latestAnswer()");
                match self.fetch(reader, &call).await? {
                    DecodedResult::SignedInt256(answer) => abi::scaled_i256(answer, PRICE_FEED_DECIMALS)?,
                    other => return Err(unexpected(other)),
                }
            }
            Account::ReserveCap {
                descriptor,
                data_provider,
                asset,
            } => {
                let caps_call =
                    CallEnvelope::new(*data_provider, "getReserveCaps(address)").with_address_arg(*asset);
                let caps = match self.fetch(reader, &caps_call).await? {
                    DecodedResult::RawBytes(raw) => raw,
                    other => return Err(unexpected(other)),
                };
                // Word 0 is borrowCap; supplyCap is in whole tokens
                let supply_cap = abi::scaled_u256(abi::uint_at(&caps, 1)?, 0)?;

                let supply_call = CallEnvelope::new(descriptor.address, "totalSupply()");
                let raw = reader.call(supply_call.target, supply_call.calldata()).await?;
                let total_supply = abi::scaled_u256(abi::as_uint256(&raw)?, TOKEN_DECIMALS)?;

                supply_cap - total_supply
            }
        };

        debug!(contract = self.name(), category = %self.category(), value, "contract read");
        Ok(value)
    }

    async fn fetch(&self, reader: &dyn ChainReader, call: &CallEnvelope) -> Result<DecodedResult> {
        let raw = reader.call(call.target, call.calldata()).await?;
        Ok(self.category().decode(&raw)?)
    }
}

fn flag_value(decoded: DecodedResult) -> Result<f64> {
    match decoded {
        DecodedResult::Boolean(paused) => Ok(if paused { 1.0 } else { 0.0 }),
        other => Err(unexpected(other)),
    }
}

fn unexpected(decoded: DecodedResult) -> MonitorError {
    MonitorError::Decode(DecodeError::OutOfRange(format!(
        "unexpected result shape: {decoded:?}"
    )))
}

/// Parse a hex address, naming the setting in the error
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|e| MonitorError::AddressParsing(format!("{field} = {value:?}: {e}")))
}

pub mod abi;
pub mod client;

use serde::{Serialize, Serializer};
use std::sync::Arc;

pub use abi::{CallEnvelope, DecodedResult};
pub use client::{ChainReader, ChainWriter, RpcChainClient};

/// The two monitored chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    /// Ethereum L1
    Primary,
    /// Ink L2 rollup
    Secondary,
}

impl Chain {
    /// Label used in metric keys and log fields
    pub fn label(&self) -> &'static str {
        match self {
            Chain::Primary => "ethereum",
            Chain::Secondary => "ink",
        }
    }
}

impl Serialize for Chain {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One reader per chain
#[derive(Clone)]
pub struct ChainReaders {
    primary: Arc<dyn ChainReader>,
    secondary: Arc<dyn ChainReader>,
}

impl ChainReaders {
    pub fn new(primary: Arc<dyn ChainReader>, secondary: Arc<dyn ChainReader>) -> Self {
        Self { primary, secondary }
    }

    pub fn get(&self, chain: Chain) -> &dyn ChainReader {
        match chain {
            Chain::Primary => self.primary.as_ref(),
            Chain::Secondary => self.secondary.as_ref(),
        }
    }
}

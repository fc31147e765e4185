//! Network and flow configuration

use crate::constants::{
    POLYGON_CHAIN_ID, POLYGON_EXPLORER_URL, RECEIPT_POLLING_INTERVAL, RECEIPT_RETRY_COUNT,
    SANCTIONED_MESSAGE,
};
use crate::gas::GasPolicy;
use alloy::primitives::TxHash;
use eyre::{Context, Result};
use std::time::Duration;

/// Network configuration containing the chain and RPC endpoints (Polygon PoS mainnet)
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Chain ID (137 for Polygon PoS)
    pub chain_id: u64,
    /// RPC endpoint URL used for estimation and receipt polling
    pub rpc_url: String,
    /// Block explorer base URL
    pub explorer_url: String,
}

impl NetworkConfig {
    /// Create Polygon PoS mainnet configuration with the given RPC URL
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id: POLYGON_CHAIN_ID,
            rpc_url: rpc_url.into(),
            explorer_url: POLYGON_EXPLORER_URL.to_string(),
        }
    }

    /// Create Polygon PoS configuration from the `POLYGON_RPC_URL` environment variable
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("POLYGON_RPC_URL")
            .context("POLYGON_RPC_URL environment variable must be set")?;
        Ok(Self::new(rpc_url))
    }

    /// Set the chain ID
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the RPC URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Set the block explorer base URL
    pub fn with_explorer_url(mut self, explorer_url: impl Into<String>) -> Self {
        self.explorer_url = explorer_url.into();
        self
    }

    /// Block explorer link for a transaction
    pub fn explorer_tx_url(&self, hash: TxHash) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

/// Receipt polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    /// Delay between polls
    pub interval: Duration,
    /// Maximum number of polls
    pub retry_count: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval: RECEIPT_POLLING_INTERVAL,
            retry_count: RECEIPT_RETRY_COUNT,
        }
    }
}

/// Settings for a single flow instance
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Chain the action's requests were prepared for
    pub required_chain_id: u64,
    /// Receipt polling cadence
    pub receipt_polling: ReceiptPolling,
    /// Gas buffer and fallback
    pub gas: GasPolicy,
    /// Error text shown to sanctioned accounts
    pub sanctioned_message: String,
}

impl FlowConfig {
    /// Create a flow configuration for the given chain
    pub fn new(required_chain_id: u64) -> Self {
        Self {
            required_chain_id,
            receipt_polling: ReceiptPolling::default(),
            gas: GasPolicy::default(),
            sanctioned_message: SANCTIONED_MESSAGE.to_string(),
        }
    }

    /// Set receipt polling cadence
    pub fn with_receipt_polling(mut self, interval: Duration, retry_count: u32) -> Self {
        self.receipt_polling = ReceiptPolling {
            interval,
            retry_count,
        };
        self
    }

    /// Set the gas policy
    pub fn with_gas_policy(mut self, gas: GasPolicy) -> Self {
        self.gas = gas;
        self
    }

    /// Set the sanctioned-account message
    pub fn with_sanctioned_message(mut self, message: impl Into<String>) -> Self {
        self.sanctioned_message = message.into();
        self
    }
}

impl From<&NetworkConfig> for FlowConfig {
    fn from(network: &NetworkConfig) -> Self {
        Self::new(network.chain_id)
    }
}

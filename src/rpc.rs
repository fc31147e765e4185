//! Read-only RPC client used for gas estimation and receipt polling

use crate::client::{ChainClient, ReceiptStatus};
use crate::config::NetworkConfig;
use crate::request::TxRequest;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use std::sync::Arc;

/// Type alias for read-only provider
pub type ReadProvider = Arc<RootProvider<Ethereum>>;

/// Caller-controlled read client
///
/// Cheap to clone; one instance is reused for every step of a flow.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: ReadProvider,
}

impl RpcChainClient {
    /// Connect to `rpc_url`
    pub fn new(rpc_url: impl AsRef<str>) -> Result<Self> {
        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;
        // Read-only provider without fillers (estimation and receipts only)
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .network::<Ethereum>()
            .connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    /// Connect to the network's RPC endpoint
    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        Self::new(&config.rpc_url)
    }

    /// Underlying provider, for sharing with other read-only consumers
    pub fn provider(&self) -> ReadProvider {
        self.provider.clone()
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("Failed to get chain id")
    }
}

/// Build the RPC request for an unsigned transaction sent from `from`
pub(crate) fn to_rpc_request(
    tx: &TxRequest,
    from: Option<Address>,
) -> alloy::rpc::types::TransactionRequest {
    let mut request = alloy::rpc::types::TransactionRequest::default()
        .with_to(tx.to)
        .with_value(tx.value)
        .with_input(tx.data.clone());

    if let Some(from) = from {
        request = request.with_from(from);
    }
    if let Some(gas_limit) = tx.gas_limit {
        request = request.with_gas_limit(gas_limit);
    }
    request
}

impl ChainClient for RpcChainClient {
    async fn estimate_gas(&self, tx: &TxRequest, from: Address) -> Result<u64> {
        let unlimited = TxRequest {
            gas_limit: None,
            ..tx.clone()
        };
        let request = to_rpc_request(&unlimited, Some(from));
        self.provider
            .estimate_gas(request)
            .await
            .context("Failed to estimate gas")
    }

    async fn receipt_status(&self, hash: TxHash) -> Result<Option<ReceiptStatus>> {
        let receipt: Option<TransactionReceipt> = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .context("Failed to get transaction receipt")?;

        Ok(receipt.map(|receipt| ReceiptStatus::from(receipt.status())))
    }
}

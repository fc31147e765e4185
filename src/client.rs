//! Capabilities the flow drives but does not implement
//!
//! The wallet is used behind `Arc<dyn Wallet>` because signature requests
//! receive it by value. The read client and sanctions screen are generic
//! parameters of the flow.

use crate::config::ReceiptPolling;
use crate::request::TxRequest;
use alloy::primitives::{Address, Signature, TxHash, B256};
use eyre::Result;
use futures::future::BoxFuture;
use std::future::Future;

/// A connected wallet
pub trait Wallet: Send + Sync {
    /// Connected account
    fn address(&self) -> Address;

    /// Connector identifier used in telemetry (e.g. "metaMask", "walletConnect")
    fn connector(&self) -> &str;

    /// Chain the wallet is currently on
    fn chain_id(&self) -> BoxFuture<'_, Result<u64>>;

    /// Ask the wallet to switch chains, returning the chain it ended up on
    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<u64>>;

    /// Sign a 32-byte hash (EIP-712 signing hashes, permits)
    fn sign_hash(&self, hash: B256) -> BoxFuture<'_, Result<Signature>>;

    /// Sign and submit a transaction, returning its hash
    fn send_transaction(&self, tx: TxRequest) -> BoxFuture<'_, Result<TxHash>>;
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

impl From<bool> for ReceiptStatus {
    fn from(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Reverted
        }
    }
}

/// Read-only chain access used for estimation and receipt polling.
///
/// Deliberately separate from the wallet's own provider.
pub trait ChainClient: Send + Sync {
    /// Raw gas estimate for `tx` sent from `from`
    fn estimate_gas(
        &self,
        tx: &TxRequest,
        from: Address,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Receipt status, or `None` if the transaction is not mined yet
    fn receipt_status(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<Option<ReceiptStatus>>> + Send;
}

/// Sanctions screening for the connected account
pub trait SanctionsCheck: Send + Sync {
    fn is_sanctioned(&self, address: Address) -> impl Future<Output = Result<bool>> + Send;
}

/// UI prompts for wallet connection and chain switching
pub trait Prompts: Send + Sync {
    fn request_connect(&self);

    fn request_chain_switch(&self, chain_id: u64);
}

/// Cached query data that must be refreshed after each confirmed transaction
pub trait QueryCache: Send + Sync {
    fn invalidate_all(&self);

    fn refetch_all(&self);
}

/// No cache to refresh
impl QueryCache for () {
    fn invalidate_all(&self) {}

    fn refetch_all(&self) {}
}

/// Poll for a receipt every `polling.interval`, at most `polling.retry_count` times
///
/// Always polls at least once, even with a retry count of zero.
pub async fn wait_for_receipt<C>(
    client: &C,
    hash: TxHash,
    polling: ReceiptPolling,
) -> Result<ReceiptStatus>
where
    C: ChainClient + ?Sized,
{
    let attempts = polling.retry_count.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match client.receipt_status(hash).await {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!("Receipt poll {} for {} failed: {:#}", attempt + 1, hash, err);
                last_error = Some(err);
            }
        }

        if attempt + 1 < attempts {
            tokio::time::sleep(polling.interval).await;
        }
    }

    match last_error {
        Some(err) => Err(err.wrap_err(format!(
            "Transaction receipt not found after timeout: {}",
            hash
        ))),
        None => eyre::bail!("Transaction receipt not found after timeout: {}", hash),
    }
}

//! Local private key wallet
//!
//! Signs locally and submits through an RPC endpoint. Useful for scripted
//! flows and keeper bots that run the same bundles as the web app.

use crate::client::Wallet;
use crate::request::TxRequest;
use crate::rpc::to_rpc_request;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, Signature, TxHash, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::transports::http::reqwest::Url;
use eyre::{Context, Result};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Connector name reported in telemetry
pub const LOCAL_CONNECTOR: &str = "local";

/// Wallet backed by a raw EVM private key
pub struct LocalWallet {
    /// Provider with wallet filler - handles nonce, fees, chain_id, and signing
    provider: Arc<dyn Provider<Ethereum>>,
    signer: PrivateKeySigner,
}

impl LocalWallet {
    /// Create a new LocalWallet from a private key hex string
    ///
    /// # Arguments
    ///
    /// * `private_key` - Hex-encoded private key (with or without 0x prefix)
    /// * `rpc_url` - RPC endpoint URL used for submission
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let wallet = LocalWallet::from_private_key(
    ///     "0x...",
    ///     "https://polygon-rpc.com"
    /// )?;
    /// ```
    pub fn from_private_key(
        private_key: impl AsRef<str>,
        rpc_url: impl AsRef<str>,
    ) -> Result<Self> {
        let key = private_key.as_ref();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner = key.parse().context("Failed to parse private key")?;
        let wallet = EthereumWallet::from(signer.clone());

        let url: Url = rpc_url.as_ref().parse().context("Invalid RPC URL")?;

        // Gas limit comes from the flow; the filler only fills what is missing
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        Ok(Self {
            provider: Arc::new(provider),
            signer,
        })
    }
}

impl Wallet for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn connector(&self) -> &str {
        LOCAL_CONNECTOR
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            self.provider
                .get_chain_id()
                .await
                .context("Failed to get chain id")
        })
    }

    /// A local key is bound to its RPC endpoint, so switching only reports the
    /// endpoint's chain
    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let current = self
                .provider
                .get_chain_id()
                .await
                .context("Failed to get chain id")?;
            if current != chain_id {
                tracing::warn!(
                    "Local wallet RPC is on chain {}, cannot switch to {}",
                    current,
                    chain_id
                );
            }
            Ok(current)
        })
    }

    fn sign_hash(&self, hash: B256) -> BoxFuture<'_, Result<Signature>> {
        Box::pin(async move {
            self.signer
                .sign_hash(&hash)
                .await
                .context("Failed to sign hash")
        })
    }

    fn send_transaction(&self, tx: TxRequest) -> BoxFuture<'_, Result<TxHash>> {
        Box::pin(async move {
            let request = to_rpc_request(&tx, Some(self.signer.address()));

            // Provider fills nonce, fees and chain_id, then signs
            let pending_tx = self
                .provider
                .send_transaction(request)
                .await
                .context("Failed to send transaction")?;

            Ok(*pending_tx.tx_hash())
        })
    }
}

//! Signature and transaction requests that make up an action bundle
//!
//! Requests are built by whatever prepares the action (supply, borrow, migrate,
//! ...) and consumed in order by [`ActionFlow`](crate::ActionFlow). Transaction
//! payloads are produced lazily so they can read values, such as signatures,
//! produced by earlier steps.

use crate::client::Wallet;
use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use eyre::{eyre, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Unsigned transaction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Target contract address
    pub to: Address,
    /// Transaction value in wei
    pub value: U256,
    /// Encoded calldata
    pub data: Bytes,
    /// Gas limit, set by the flow after estimation
    pub gas_limit: Option<u64>,
}

impl TxRequest {
    /// Create a new transaction request
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            value: U256::ZERO,
            data: data.into(),
            gas_limit: None,
        }
    }

    /// Set transaction value
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set gas limit
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Write-once holder for a signature produced by a [`SignatureRequest`]
///
/// Cloned into the transaction closures that need the signature.
#[derive(Debug, Clone, Default)]
pub struct SignatureSlot(Arc<OnceLock<Signature>>);

impl SignatureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored signature, if the signing step has completed
    pub fn get(&self) -> Option<Signature> {
        self.0.get().copied()
    }

    /// The stored signature, or an error naming the missing step
    pub fn require(&self, step: &str) -> Result<Signature> {
        self.get()
            .ok_or_else(|| eyre!("Signature for '{}' is not available", step))
    }

    /// Store a signature. A second signature for the same slot is ignored.
    pub fn set(&self, signature: Signature) {
        let _ = self.0.set(signature);
    }
}

type SignFn = dyn Fn(Arc<dyn Wallet>) -> BoxFuture<'static, Result<()>> + Send + Sync;
type TxFn = dyn Fn() -> Result<TxRequest> + Send + Sync;

/// An off-chain message the wallet must sign
#[derive(Clone)]
pub struct SignatureRequest {
    name: String,
    sign: Arc<SignFn>,
}

impl SignatureRequest {
    /// Create a request from an arbitrary signing operation
    pub fn new<F>(name: impl Into<String>, sign: F) -> Self
    where
        F: Fn(Arc<dyn Wallet>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            sign: Arc::new(sign),
        }
    }

    /// Create a request that signs a precomputed hash (e.g. an EIP-712 signing
    /// hash) and stores the result in `slot`
    pub fn hash(name: impl Into<String>, hash: B256, slot: SignatureSlot) -> Self {
        Self::new(name, move |wallet: Arc<dyn Wallet>| {
            let slot = slot.clone();
            Box::pin(async move {
                let signature = wallet.sign_hash(hash).await?;
                slot.set(signature);
                Ok(())
            }) as BoxFuture<'static, Result<()>>
        })
    }

    /// Step label, e.g. "Sign USDC permit"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the wallet to sign
    pub async fn sign(&self, wallet: Arc<dyn Wallet>) -> Result<()> {
        (self.sign)(wallet).await
    }
}

impl fmt::Debug for SignatureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureRequest")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An on-chain call the wallet must submit
#[derive(Clone)]
pub struct TransactionRequest {
    name: String,
    learn_more: Option<String>,
    tx: Arc<TxFn>,
}

impl TransactionRequest {
    /// Create a request whose payload is built when the step runs
    pub fn new<F>(name: impl Into<String>, tx: F) -> Self
    where
        F: Fn() -> Result<TxRequest> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            learn_more: None,
            tx: Arc::new(tx),
        }
    }

    /// Create a request with a fixed payload
    pub fn fixed(name: impl Into<String>, tx: TxRequest) -> Self {
        Self::new(name, move || Ok(tx.clone()))
    }

    /// Attach a "learn more" link
    pub fn with_learn_more(mut self, url: impl Into<String>) -> Self {
        self.learn_more = Some(url.into());
        self
    }

    /// Step label, e.g. "Confirm Borrow"
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn learn_more(&self) -> Option<&str> {
        self.learn_more.as_deref()
    }

    /// Build the unsigned transaction
    pub fn tx(&self) -> Result<TxRequest> {
        (self.tx)()
    }
}

impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("name", &self.name)
            .field("learn_more", &self.learn_more)
            .finish_non_exhaustive()
    }
}

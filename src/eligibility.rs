//! Pre-flight checks run on every `start()`
//!
//! Connection and chain checks happen before any state changes. The sanctions
//! screen runs after the run is marked active and is never cached, so every
//! attempt reflects the account's current status.

use crate::client::{Prompts, SanctionsCheck, Wallet};
use alloy::primitives::Address;
use eyre::{Context, Result};
use std::sync::Arc;

/// Result of the connection and chain checks
#[derive(Clone)]
pub enum Gate {
    /// Wallet connected on the required chain
    Ready(Arc<dyn Wallet>),
    /// No wallet or read client; the connect prompt was shown
    ConnectRequested,
    /// Wrong chain and the automatic switch did not land on the required one;
    /// the manual switch prompt was shown
    ChainSwitchRequested,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(wallet) => f.debug_tuple("Ready").field(&wallet.address()).finish(),
            Self::ConnectRequested => f.write_str("ConnectRequested"),
            Self::ChainSwitchRequested => f.write_str("ChainSwitchRequested"),
        }
    }
}

/// Check that a wallet and read client are present and the wallet is on
/// `required_chain_id`, attempting one automatic switch if it is not.
pub async fn check_connection(
    wallet: Option<Arc<dyn Wallet>>,
    has_chain_client: bool,
    required_chain_id: u64,
    prompts: &dyn Prompts,
) -> Gate {
    let wallet = match wallet {
        Some(wallet) if has_chain_client => wallet,
        _ => {
            tracing::info!("No wallet connected, requesting connection");
            prompts.request_connect();
            return Gate::ConnectRequested;
        }
    };

    let current = match wallet.chain_id().await {
        Ok(chain_id) => Some(chain_id),
        Err(err) => {
            tracing::warn!("Failed to read wallet chain: {:#}", err);
            None
        }
    };
    if current == Some(required_chain_id) {
        return Gate::Ready(wallet);
    }

    tracing::info!(
        "Wallet on chain {:?}, switching to {}",
        current,
        required_chain_id
    );
    match wallet.switch_chain(required_chain_id).await {
        Ok(chain_id) if chain_id == required_chain_id => Gate::Ready(wallet),
        Ok(chain_id) => {
            tracing::warn!(
                "Chain switch landed on {} instead of {}",
                chain_id,
                required_chain_id
            );
            prompts.request_chain_switch(required_chain_id);
            Gate::ChainSwitchRequested
        }
        Err(err) => {
            tracing::warn!("Chain switch failed: {:#}", err);
            prompts.request_chain_switch(required_chain_id);
            Gate::ChainSwitchRequested
        }
    }
}

/// Screen `address` against the sanctions list
pub async fn screen_account<S>(sanctions: &S, address: Address) -> Result<bool>
where
    S: SanctionsCheck + ?Sized,
{
    let sanctioned = sanctions
        .is_sanctioned(address)
        .await
        .context("Failed to screen account")?;
    if sanctioned {
        tracing::warn!("Account {} failed sanctions screening", address);
    }
    Ok(sanctioned)
}

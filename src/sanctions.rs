//! Sanctions screening backends

use crate::client::SanctionsCheck;
use crate::constants::SANCTIONS_ORACLE;
use crate::contracts::ISanctionsList;
use crate::rpc::ReadProvider;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::sol_types::SolCall;
use eyre::{Context, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;

const CHAINALYSIS_API_BASE: &str = "https://public.chainalysis.com/api/v1";

/// Screens accounts against the Chainalysis on-chain oracle
#[derive(Clone)]
pub struct SanctionsOracle {
    provider: ReadProvider,
    oracle: Address,
}

impl SanctionsOracle {
    /// Use the oracle at its canonical address
    pub fn new(provider: ReadProvider) -> Self {
        Self {
            provider,
            oracle: SANCTIONS_ORACLE,
        }
    }

    /// Use an oracle deployed elsewhere
    pub fn with_oracle(mut self, oracle: Address) -> Self {
        self.oracle = oracle;
        self
    }
}

impl SanctionsCheck for SanctionsOracle {
    async fn is_sanctioned(&self, address: Address) -> Result<bool> {
        let call = ISanctionsList::isSanctionedCall { addr: address };
        let data = call.abi_encode();

        let result: Bytes = self
            .provider
            .call(
                alloy::rpc::types::TransactionRequest::default()
                    .with_to(self.oracle)
                    .with_input(data),
            )
            .await
            .context("Failed to call isSanctioned")?;

        let sanctioned = ISanctionsList::isSanctionedCall::abi_decode_returns(&result)
            .context("Failed to decode isSanctioned")?;

        Ok(sanctioned)
    }
}

/// Response from the Chainalysis sanctions API
#[derive(Debug, Deserialize)]
struct ScreeningResponse {
    #[serde(default)]
    identifications: Vec<IgnoredAny>,
}

/// Screens accounts through the Chainalysis sanctions API
#[derive(Debug, Clone)]
pub struct SanctionsApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SanctionsApi {
    /// Create a client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("CompoundBlueActionFlow/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: CHAINALYSIS_API_BASE.to_string(),
        })
    }

    /// Create a client from the `SANCTIONS_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SANCTIONS_API_KEY")
            .context("SANCTIONS_API_KEY environment variable must be set")?;
        Self::new(api_key)
    }

    /// Point at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl SanctionsCheck for SanctionsApi {
    async fn is_sanctioned(&self, address: Address) -> Result<bool> {
        let url = format!("{}/address/{}", self.base_url.trim_end_matches('/'), address);

        let resp = self
            .client
            .get(&url)
            .header("X-API-Key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to query sanctions API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            eyre::bail!("Sanctions API error: {} - {}", status, body);
        }

        let text = resp.text().await.context("Failed to read response body")?;
        parse_screening(&text)
    }
}

fn parse_screening(body: &str) -> Result<bool> {
    let response: ScreeningResponse = serde_json::from_str(body).with_context(|| {
        let preview: String = body.chars().take(200).collect();
        format!("Failed to parse sanctions response: {}", preview)
    })?;
    Ok(!response.identifications.is_empty())
}

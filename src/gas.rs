//! Gas limit estimation with buffer and fallback

use crate::client::ChainClient;
use crate::constants::{
    buffered_gas, FALLBACK_GAS_LIMIT, GAS_BUFFER_DENOMINATOR, GAS_BUFFER_NUMERATOR,
};
use crate::events::{EventSink, FlowEvent};
use crate::request::TxRequest;
use alloy::primitives::Address;

/// Buffer and fallback applied to gas estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub buffer_numerator: u64,
    pub buffer_denominator: u64,
    /// Gas limit submitted when estimation fails
    pub fallback_gas_limit: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            buffer_numerator: GAS_BUFFER_NUMERATOR,
            buffer_denominator: GAS_BUFFER_DENOMINATOR,
            fallback_gas_limit: FALLBACK_GAS_LIMIT,
        }
    }
}

impl GasPolicy {
    /// Buffered limit for a raw estimate
    pub fn apply_buffer(&self, estimate: u64) -> u64 {
        buffered_gas(estimate, self.buffer_numerator, self.buffer_denominator)
    }
}

/// Who is submitting, for fallback telemetry
#[derive(Debug, Clone, Copy)]
pub struct GasContext<'a> {
    pub account: Address,
    pub connector: &'a str,
    pub step: &'a str,
}

/// Estimate the gas limit for `tx` through the read client.
///
/// Never fails: an estimation error yields `policy.fallback_gas_limit` and a
/// [`FlowEvent::GasEstimateFallback`] event.
pub async fn estimate_gas_limit<C, E>(
    client: &C,
    tx: &TxRequest,
    policy: &GasPolicy,
    sink: &E,
    ctx: GasContext<'_>,
) -> u64
where
    C: ChainClient,
    E: EventSink + ?Sized,
{
    match client.estimate_gas(tx, ctx.account).await {
        Ok(estimate) => {
            let limit = policy.apply_buffer(estimate);
            tracing::debug!("Gas estimate for '{}': {} (limit {})", ctx.step, estimate, limit);
            limit
        }
        Err(err) => {
            tracing::warn!(
                "Gas estimation failed for '{}', using fallback {}: {:#}",
                ctx.step,
                policy.fallback_gas_limit,
                err
            );
            sink.emit(FlowEvent::GasEstimateFallback {
                account: ctx.account,
                connector: ctx.connector.to_string(),
                step: ctx.step.to_string(),
                error: format!("{err:#}"),
            });
            policy.fallback_gas_limit
        }
    }
}

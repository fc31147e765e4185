//! Constants for transaction flows on Compound Blue

use alloy::primitives::{address, Address};
use std::time::Duration;

/// Gas buffer numerator (estimate * 1300 / 1000 = +30%)
pub const GAS_BUFFER_NUMERATOR: u64 = 1300;

/// Gas buffer denominator
pub const GAS_BUFFER_DENOMINATOR: u64 = 1000;

/// Gas limit used when estimation fails.
///
/// Covers the most expensive supported bundle (leveraged multiply through the
/// bundler) while staying a negligible cost in POL.
pub const FALLBACK_GAS_LIMIT: u64 = 1_200_000;

/// Interval between receipt polls
pub const RECEIPT_POLLING_INTERVAL: Duration = Duration::from_secs(4);

/// Number of receipt polls before giving up (20 * 4s = 80s)
pub const RECEIPT_RETRY_COUNT: u32 = 20;

/// Polygon PoS mainnet
pub const POLYGON_CHAIN_ID: u64 = 137;

/// Default block explorer for Polygon PoS
pub const POLYGON_EXPLORER_URL: &str = "https://polygonscan.com";

/// Chainalysis sanctions oracle, deployed at the same address on every EVM chain
pub const SANCTIONS_ORACLE: Address = address!("40C57923924B5c5c5455c48D93317139ADDaC8fb");

/// Message shown when the connected account fails sanctions screening
pub const SANCTIONED_MESSAGE: &str =
    "This address is not eligible to use Compound Blue. Please contact support if you believe this is an error.";

/// Apply the gas buffer to a raw estimate using integer-only arithmetic.
///
/// The product is computed in 256 bits and saturates to `u64::MAX`.
pub fn buffered_gas(estimate: u64, numerator: u64, denominator: u64) -> u64 {
    use alloy::primitives::U256;

    if denominator == 0 {
        return estimate;
    }
    let scaled = U256::from(estimate) * U256::from(numerator) / U256::from(denominator);
    scaled.saturating_to::<u64>()
}

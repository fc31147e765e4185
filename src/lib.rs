//! Action flow engine for Compound Blue
//!
//! Drives a wallet through the signature and transaction requests of a
//! prepared lending action (supply, borrow, repay, withdraw, multiply, Aave
//! migration) on Polygon PoS.
//!
//! # Features
//!
//! - Ordered execution: signatures first, then transactions
//! - Gas estimation through a dedicated read client, with buffer and fallback
//! - Chain check with automatic switch, sanctions screening
//! - Resumable after wallet errors, terminal on reverted transactions
//! - Observable status for presentation and fire-and-forget telemetry
//!
//! # Example
//!
//! ```rust,ignore
//! use action_flow::{ActionFlow, FlowConfig, LocalWallet, NetworkConfig, RpcChainClient, SanctionsOracle};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let network = NetworkConfig::from_env()?;
//!     let chain = RpcChainClient::from_config(&network)?;
//!     let wallet = LocalWallet::from_private_key("0x...", &network.rpc_url)?;
//!
//!     let prepared = prepare_supply(/* ... */).await;
//!     let (mut flow, _preview) = ActionFlow::from_prepared(
//!         prepared,
//!         FlowConfig::from(&network),
//!         SanctionsOracle::new(chain.provider()),
//!         prompts,
//!     )
//!     .map_err(eyre::Report::msg)?;
//!
//!     let wallet: Arc<dyn Wallet> = Arc::new(wallet);
//!     let status = flow.start(Some(wallet), Some(&chain)).await;
//!     println!("{:?}", status.flow_state);
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod binding;
pub mod client;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod flow;
pub mod gas;
pub mod request;
pub mod rpc;
pub mod sanctions;
pub mod wallet;

// Re-export main types for convenience
pub use action::{PrepareActionResult, PrepareStatus, PreparedAction};
pub use binding::{CloseDecision, FlowBinding, FlowSnapshot, StepInfo, StepKind, StepView};
pub use client::{ChainClient, Prompts, QueryCache, ReceiptStatus, SanctionsCheck, Wallet};
pub use config::{FlowConfig, NetworkConfig, ReceiptPolling};
pub use error::{eyre, Context, Report, Result, TransitionError};
pub use events::{ChannelSink, EventSink, FlowEvent, TracingSink};
pub use flow::{ActionFlow, ActionState, FlowState, FlowStatus, StepStatus, Transition};
pub use gas::GasPolicy;
pub use request::{SignatureRequest, SignatureSlot, TransactionRequest, TxRequest};
pub use rpc::RpcChainClient;
pub use sanctions::{SanctionsApi, SanctionsOracle};
pub use wallet::LocalWallet;

//! Run a two-step USDC approval flow against Polygon
//!
//! Run with: cargo run --example run_flow
//!
//! Requires PRIVATE_KEY and POLYGON_RPC_URL environment variables

use std::sync::Arc;

use action_flow::{
    ActionFlow, FlowConfig, FlowState, LocalWallet, NetworkConfig, PrepareActionResult, Prompts,
    RpcChainClient, SanctionsOracle, TransactionRequest, TxRequest, Wallet,
};
use alloy::primitives::{address, Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

const USDC: Address = address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359");

/// Prompts for a terminal session
struct TerminalPrompts;

impl Prompts for TerminalPrompts {
    fn request_connect(&self) {
        println!("Connect a wallet: set PRIVATE_KEY and POLYGON_RPC_URL");
    }

    fn request_chain_switch(&self, chain_id: u64) {
        println!("Switch your RPC endpoint to chain {}", chain_id);
    }
}

fn approve(name: &str, spender: Address, amount: U256) -> TransactionRequest {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    TransactionRequest::fixed(name, TxRequest::new(USDC, data))
        .with_learn_more("https://docs.compound.blue")
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let private_key = std::env::var("PRIVATE_KEY").expect("PRIVATE_KEY must be set");
    let network = NetworkConfig::from_env()?;

    let chain = RpcChainClient::from_config(&network)?;
    let wallet = LocalWallet::from_private_key(&private_key, &network.rpc_url)?;

    // Set then reset an allowance so the demo leaves no approval behind
    let spender = Address::repeat_byte(0x01);
    let prepared = PrepareActionResult::success(
        Vec::new(),
        vec![
            approve("Approve USDC", spender, U256::from(1)),
            approve("Reset USDC approval", spender, U256::ZERO),
        ],
        "approve 0.000001 USDC",
    );

    let (flow, preview) = ActionFlow::from_prepared(
        prepared,
        FlowConfig::from(&network),
        SanctionsOracle::new(chain.provider()),
        Arc::new(TerminalPrompts),
    )
    .map_err(eyre::Report::msg)?;
    let mut flow = flow.on_success(|| println!("All steps confirmed"));

    println!("\n========================================");
    println!("  Action: {}", preview);
    println!("========================================");

    let mut binding = flow.subscribe().with_network(network.clone());
    let watcher = tokio::spawn(async move {
        while let Ok(snapshot) = binding.changed().await {
            for (i, step) in snapshot.steps.iter().enumerate() {
                println!("  {}. {:<24} {:?}", i + 1, step.info.name, step.status);
            }
            if let Some(url) = snapshot.explorer_url {
                println!("  Last transaction: {}", url);
            }
        }
    });

    let wallet: Arc<dyn Wallet> = Arc::new(wallet);
    let status = flow.start(Some(wallet), Some(&chain)).await;
    match status.flow_state {
        FlowState::Success => println!("Done"),
        FlowState::Failed => println!("Something went wrong, a transaction reverted"),
        _ => {
            if let Some(error) = status.error {
                println!("Flow stopped: {}", error);
            }
        }
    }

    drop(flow);
    watcher.await?;
    Ok(())
}

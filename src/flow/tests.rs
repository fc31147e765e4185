//! Fake capabilities and end-to-end flow scenarios

use super::{ActionFlow, ActionState, FlowState, FlowStatus};
use crate::action::PrepareActionResult;
use crate::client::{ChainClient, Prompts, QueryCache, ReceiptStatus, SanctionsCheck, Wallet};
use crate::config::FlowConfig;
use crate::constants::SANCTIONED_MESSAGE;
use crate::events::{ChannelSink, EventSink, FlowEvent};
use crate::request::{SignatureRequest, SignatureSlot, TransactionRequest, TxRequest};
use alloy::primitives::{Address, Signature, TxHash, B256, U256};
use eyre::{eyre, Result};
use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CHAIN: u64 = 137;

// ========== Fakes ==========

/// Ordered record of calls made during a flow
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct WalletState {
    chain_id: u64,
    switch_result: Option<Result<u64, String>>,
    switch_attempts: usize,
    sign_results: VecDeque<Result<(), String>>,
    send_results: VecDeque<Result<(), String>>,
    sent: Vec<TxRequest>,
}

#[derive(Clone)]
pub(crate) struct FakeWallet {
    address: Address,
    state: Arc<Mutex<WalletState>>,
    log: CallLog,
}

impl FakeWallet {
    pub(crate) fn new(chain_id: u64) -> Self {
        Self {
            address: Address::repeat_byte(0xaa),
            state: Arc::new(Mutex::new(WalletState {
                chain_id,
                ..Default::default()
            })),
            log: CallLog::default(),
        }
    }

    /// Result of the next `switch_chain`; by default the switch succeeds
    pub(crate) fn with_switch_result(self, result: Result<u64, &str>) -> Self {
        self.state.lock().unwrap().switch_result = Some(result.map_err(str::to_string));
        self
    }

    /// Results of successive `sign_hash` calls; succeeds once exhausted
    pub(crate) fn with_sign_results(self, results: Vec<Result<(), &str>>) -> Self {
        self.state.lock().unwrap().sign_results = results
            .into_iter()
            .map(|r| r.map_err(str::to_string))
            .collect();
        self
    }

    /// Results of successive `send_transaction` calls; succeeds once exhausted
    pub(crate) fn with_send_results(self, results: Vec<Result<(), &str>>) -> Self {
        self.state.lock().unwrap().send_results = results
            .into_iter()
            .map(|r| r.map_err(str::to_string))
            .collect();
        self
    }

    pub(crate) fn as_dyn(&self) -> Arc<dyn Wallet> {
        Arc::new(self.clone())
    }

    pub(crate) fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub(crate) fn switch_attempts(&self) -> usize {
        self.state.lock().unwrap().switch_attempts
    }

    pub(crate) fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl Wallet for FakeWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn connector(&self) -> &str {
        "metaMask"
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move { Ok(self.state.lock().unwrap().chain_id) })
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.switch_attempts += 1;
            let landed = state
                .switch_result
                .clone()
                .unwrap_or(Ok(chain_id))
                .map_err(|e| eyre!(e))?;
            state.chain_id = landed;
            Ok(landed)
        })
    }

    fn sign_hash(&self, _hash: B256) -> BoxFuture<'_, Result<Signature>> {
        Box::pin(async move {
            let result = self.state.lock().unwrap().sign_results.pop_front();
            match result {
                Some(Err(err)) => Err(eyre!(err)),
                _ => Ok(Signature::new(U256::from(1), U256::from(2), false)),
            }
        })
    }

    fn send_transaction(&self, tx: TxRequest) -> BoxFuture<'_, Result<TxHash>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            if let Some(Err(err)) = state.send_results.pop_front() {
                return Err(eyre!(err));
            }
            self.log
                .push(format!("send:{}", String::from_utf8_lossy(&tx.data)));
            state.sent.push(tx);
            Ok(TxHash::with_last_byte(state.sent.len() as u8))
        })
    }
}

#[derive(Default)]
struct ChainState {
    gas_estimate: Option<Result<u64, String>>,
    receipts: Option<VecDeque<Result<Option<ReceiptStatus>, String>>>,
    receipt_polls: usize,
}

#[derive(Clone)]
pub(crate) struct FakeChain {
    chain_id: u64,
    state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
    /// Estimates 100_000 gas and confirms every transaction on the first poll
    pub(crate) fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Arc::new(Mutex::new(ChainState::default())),
        }
    }

    pub(crate) fn with_gas_estimate(self, result: Result<u64, String>) -> Self {
        self.state.lock().unwrap().gas_estimate = Some(result);
        self
    }

    /// Results of successive receipt polls; pending once exhausted
    pub(crate) fn with_receipts(
        self,
        receipts: Vec<Result<Option<ReceiptStatus>, String>>,
    ) -> Self {
        self.state.lock().unwrap().receipts = Some(receipts.into());
        self
    }

    pub(crate) fn receipt_polls(&self) -> usize {
        self.state.lock().unwrap().receipt_polls
    }
}

impl ChainClient for FakeChain {
    async fn estimate_gas(&self, _tx: &TxRequest, _from: Address) -> Result<u64> {
        let state = self.state.lock().unwrap();
        match &state.gas_estimate {
            Some(Ok(gas)) => Ok(*gas),
            Some(Err(err)) => Err(eyre!("{} (chain {})", err, self.chain_id)),
            None => Ok(100_000),
        }
    }

    async fn receipt_status(&self, _hash: TxHash) -> Result<Option<ReceiptStatus>> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        match state.receipts.as_mut() {
            None => Ok(Some(ReceiptStatus::Success)),
            Some(queue) => match queue.pop_front() {
                Some(result) => result.map_err(|e| eyre!(e)),
                None => Ok(None),
            },
        }
    }
}

pub(crate) struct FakeSanctions {
    flagged: Option<Address>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeSanctions {
    pub(crate) fn clear() -> Self {
        Self {
            flagged: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn flagging(address: Address) -> Self {
        Self {
            flagged: Some(address),
            ..Self::clear()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::clear()
        }
    }
}

impl SanctionsCheck for FakeSanctions {
    async fn is_sanctioned(&self, address: Address) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            eyre::bail!("screening service unavailable");
        }
        Ok(self.flagged == Some(address))
    }
}

#[derive(Default)]
pub(crate) struct RecordingPrompts {
    connects: AtomicUsize,
    chain_switches: Mutex<Vec<u64>>,
}

impl RecordingPrompts {
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn chain_switches(&self) -> Vec<u64> {
        self.chain_switches.lock().unwrap().clone()
    }
}

impl Prompts for RecordingPrompts {
    fn request_connect(&self) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }

    fn request_chain_switch(&self, chain_id: u64) {
        self.chain_switches.lock().unwrap().push(chain_id);
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink(Mutex<Vec<FlowEvent>>);

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<FlowEvent> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(FlowEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: FlowEvent) {
        self.0.lock().unwrap().push(event);
    }
}

#[derive(Default)]
struct RecordingCache {
    invalidations: AtomicUsize,
    refetches: AtomicUsize,
}

impl QueryCache for RecordingCache {
    fn invalidate_all(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn refetch_all(&self) {
        self.refetches.fetch_add(1, Ordering::SeqCst);
    }
}

// ========== Harness ==========

fn signature(name: &str, log: &CallLog) -> SignatureRequest {
    let log = log.clone();
    let label = name.to_string();
    SignatureRequest::new(name, move |wallet: Arc<dyn Wallet>| {
        let log = log.clone();
        let label = label.clone();
        Box::pin(async move {
            wallet.sign_hash(B256::ZERO).await?;
            log.push(format!("sign:{label}"));
            Ok(())
        }) as BoxFuture<'static, Result<()>>
    })
}

fn transaction(name: &str, log: &CallLog) -> TransactionRequest {
    let log = log.clone();
    let label = name.to_string();
    TransactionRequest::new(name, move || {
        log.push(format!("tx:{label}"));
        Ok(TxRequest::new(Address::repeat_byte(0xbb), label.as_bytes().to_vec()))
    })
}

struct Harness {
    wallet: FakeWallet,
    chain: FakeChain,
    prompts: Arc<RecordingPrompts>,
    sink: Arc<RecordingSink>,
    cache: Arc<RecordingCache>,
    completions: Arc<AtomicUsize>,
    flow: ActionFlow<FakeSanctions>,
}

impl Harness {
    fn new(signatures: &[&str], transactions: &[&str]) -> Self {
        Self::build(
            FakeWallet::new(CHAIN),
            FakeChain::new(CHAIN),
            FakeSanctions::clear(),
            signatures,
            transactions,
        )
    }

    fn build(
        wallet: FakeWallet,
        chain: FakeChain,
        sanctions: FakeSanctions,
        signatures: &[&str],
        transactions: &[&str],
    ) -> Self {
        let log = wallet.log();
        let prompts = Arc::new(RecordingPrompts::default());
        let sink = Arc::new(RecordingSink::default());
        let cache = Arc::new(RecordingCache::default());
        let completions = Arc::new(AtomicUsize::new(0));

        let counter = completions.clone();
        let config = FlowConfig::new(CHAIN).with_receipt_polling(Duration::from_millis(1), 3);
        let flow = ActionFlow::new(
            signatures.iter().map(|name| signature(name, &log)).collect(),
            transactions.iter().map(|name| transaction(name, &log)).collect(),
            config,
            sanctions,
            prompts.clone(),
        )
        .with_event_sink(sink.clone())
        .with_cache(cache.clone())
        .on_success(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        Self {
            wallet,
            chain,
            prompts,
            sink,
            cache,
            completions,
            flow,
        }
    }

    async fn start(&mut self) -> FlowStatus {
        let wallet = self.wallet.as_dyn();
        self.flow.start(Some(wallet), Some(&self.chain)).await
    }

    fn log(&self) -> Vec<String> {
        self.wallet.log().entries()
    }

    fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

// ========== Scenarios ==========

#[tokio::test]
async fn test_happy_path() {
    let mut h = Harness::new(&["Sign permit"], &["Approve USDC", "Confirm Supply"]);

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(status.active_step, 3);
    assert_eq!(status.error, None);
    assert_eq!(status.last_transaction_hash, Some(TxHash::with_last_byte(2)));
    assert_eq!(h.completions(), 1);
    assert_eq!(
        h.sink.names(),
        vec![
            "transaction_pending",
            "transaction_success",
            "transaction_pending",
            "transaction_success"
        ]
    );
    assert_eq!(h.cache.invalidations.load(Ordering::SeqCst), 2);
    assert_eq!(h.cache.refetches.load(Ordering::SeqCst), 2);
    assert!(h.sent_gas_limits().iter().all(|gas| *gas == Some(130_000)));
}

#[tokio::test]
async fn test_signatures_complete_before_transactions_are_built() {
    let mut h = Harness::new(
        &["Sign permit", "Sign authorization"],
        &["Confirm Borrow", "Confirm Repay"],
    );

    h.start().await;

    assert_eq!(
        h.log(),
        vec![
            "sign:Sign permit",
            "sign:Sign authorization",
            "tx:Confirm Borrow",
            "send:Confirm Borrow",
            "tx:Confirm Repay",
            "send:Confirm Repay",
        ]
    );
}

#[tokio::test]
async fn test_wallet_rejection_resumes_at_failed_step() {
    let wallet = FakeWallet::new(CHAIN)
        .with_send_results(vec![Ok(()), Err("User rejected the request.")]);
    let mut h = Harness::build(
        wallet,
        FakeChain::new(CHAIN),
        FakeSanctions::clear(),
        &[],
        &["Approve USDC", "Confirm Borrow"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(status.active_step, 1);
    assert_eq!(status.error.as_deref(), Some("User rejected the request."));
    assert_eq!(status.last_transaction_hash, Some(TxHash::with_last_byte(1)));
    assert_eq!(h.completions(), 0);
    match h.sink.events().last() {
        Some(FlowEvent::FlowError {
            connector, step, error, ..
        }) => {
            assert_eq!(connector, "metaMask");
            assert_eq!(step.as_deref(), Some("Confirm Borrow"));
            assert_eq!(error, "User rejected the request.");
        }
        other => panic!("unexpected event {other:?}"),
    }

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(status.active_step, 2);
    assert_eq!(status.error, None);
    assert_eq!(h.completions(), 1);
    assert_eq!(
        h.log(),
        vec![
            "tx:Approve USDC",
            "send:Approve USDC",
            "tx:Confirm Borrow",
            "tx:Confirm Borrow",
            "send:Confirm Borrow",
        ]
    );
}

#[tokio::test]
async fn test_signature_rejection_does_not_resign_completed_steps() {
    let wallet = FakeWallet::new(CHAIN)
        .with_sign_results(vec![Ok(()), Err("User denied message signature")]);
    let mut h = Harness::build(
        wallet,
        FakeChain::new(CHAIN),
        FakeSanctions::clear(),
        &["Sign permit", "Sign authorization"],
        &["Confirm Migration"],
    );

    let status = h.start().await;
    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(status.active_step, 1);
    assert_eq!(status.action_state, ActionState::PendingWallet);

    let status = h.start().await;
    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(
        h.log(),
        vec![
            "sign:Sign permit",
            "sign:Sign authorization",
            "tx:Confirm Migration",
            "send:Confirm Migration",
        ]
    );
}

#[tokio::test]
async fn test_reverted_transaction_fails_flow() {
    let chain = FakeChain::new(CHAIN).with_receipts(vec![Ok(Some(ReceiptStatus::Reverted))]);
    let mut h = Harness::build(
        FakeWallet::new(CHAIN),
        chain,
        FakeSanctions::clear(),
        &[],
        &["Confirm Multiply"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Failed);
    assert_eq!(status.active_step, 0);
    assert_eq!(status.last_transaction_hash, Some(TxHash::with_last_byte(1)));
    assert_eq!(h.completions(), 0);
    assert_eq!(h.sink.names(), vec!["transaction_pending", "transaction_failed"]);
    assert_eq!(h.cache.invalidations.load(Ordering::SeqCst), 0);

    // Terminal: nothing else runs
    let status = h.start().await;
    assert_eq!(status.flow_state, FlowState::Failed);
    assert_eq!(h.log(), vec!["tx:Confirm Multiply", "send:Confirm Multiply"]);
}

#[tokio::test]
async fn test_reverted_transaction_stops_remaining_steps() {
    let chain = FakeChain::new(CHAIN).with_receipts(vec![
        Ok(Some(ReceiptStatus::Success)),
        Ok(Some(ReceiptStatus::Reverted)),
    ]);
    let mut h = Harness::build(
        FakeWallet::new(CHAIN),
        chain,
        FakeSanctions::clear(),
        &[],
        &["Approve WETH", "Confirm Supply", "Confirm Borrow"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Failed);
    assert_eq!(status.active_step, 1);
    assert_eq!(status.last_transaction_hash, Some(TxHash::with_last_byte(2)));
    assert_eq!(h.wallet.sent().len(), 2);
}

#[tokio::test]
async fn test_sanctioned_account_runs_nothing() {
    let wallet = FakeWallet::new(CHAIN);
    let sanctions = FakeSanctions::flagging(wallet.address());
    let mut h = Harness::build(
        wallet,
        FakeChain::new(CHAIN),
        sanctions,
        &["Sign permit"],
        &["Confirm Supply"],
    );

    for _ in 0..2 {
        let status = h.start().await;
        assert_eq!(status.flow_state, FlowState::Review);
        assert_eq!(status.error.as_deref(), Some(SANCTIONED_MESSAGE));
        assert_eq!(status.active_step, 0);
    }

    assert!(h.log().is_empty());
    assert!(h.wallet.sent().is_empty());
    assert_eq!(h.flow_sanctions_calls(), 2);
}

#[tokio::test]
async fn test_sanctions_check_error_is_recoverable() {
    let mut h = Harness::build(
        FakeWallet::new(CHAIN),
        FakeChain::new(CHAIN),
        FakeSanctions::failing(),
        &[],
        &["Confirm Supply"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Review);
    let error = status.error.unwrap();
    assert!(error.contains("Failed to screen account"));
    assert!(error.contains("screening service unavailable"));
    assert!(h.log().is_empty());
    assert_eq!(h.sink.names(), vec!["flow_error"]);
}

#[tokio::test]
async fn test_chain_mismatch_with_successful_switch() {
    let mut h = Harness::build(
        FakeWallet::new(1),
        FakeChain::new(CHAIN),
        FakeSanctions::clear(),
        &[],
        &["Confirm Withdraw"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(h.wallet.switch_attempts(), 1);
    assert!(h.prompts.chain_switches().is_empty());
}

#[tokio::test]
async fn test_chain_switch_failure_prompts_manual_switch() {
    let wallet = FakeWallet::new(1).with_switch_result(Err("Unrecognized chain ID"));
    let mut h = Harness::build(
        wallet,
        FakeChain::new(CHAIN),
        FakeSanctions::clear(),
        &[],
        &["Confirm Withdraw"],
    );
    let before = h.flow.status().clone();

    let status = h.start().await;

    assert_eq!(status, before);
    assert_eq!(h.prompts.chain_switches(), vec![CHAIN]);
    assert!(h.log().is_empty());
    assert_eq!(h.flow_sanctions_calls(), 0);
}

#[tokio::test]
async fn test_missing_wallet_requests_connect() {
    let mut h = Harness::new(&[], &["Confirm Supply"]);

    let status = h.flow.start(None, Some(&h.chain)).await;

    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(h.prompts.connects(), 1);
    assert!(h.log().is_empty());

    let wallet = h.wallet.as_dyn();
    let status = h.flow.start::<FakeChain>(Some(wallet), None).await;
    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(h.prompts.connects(), 2);
}

#[tokio::test]
async fn test_gas_estimation_failure_uses_fallback() {
    let chain = FakeChain::new(CHAIN).with_gas_estimate(Err("missing trie node".to_string()));
    let mut h = Harness::build(
        FakeWallet::new(CHAIN),
        chain,
        FakeSanctions::clear(),
        &[],
        &["Confirm Migration"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(h.sent_gas_limits(), vec![Some(1_200_000)]);
    assert_eq!(
        h.sink.names(),
        vec!["gas_estimate_fallback", "transaction_pending", "transaction_success"]
    );
}

#[tokio::test]
async fn test_tx_builder_error_is_recoverable() {
    let slot = SignatureSlot::new();
    let needs_signature = slot.clone();
    let wallet = FakeWallet::new(CHAIN);
    let prompts = Arc::new(RecordingPrompts::default());
    let mut flow = ActionFlow::new(
        Vec::new(),
        vec![TransactionRequest::new("Confirm Supply", move || {
            let signature = needs_signature.require("Sign permit")?;
            Ok(TxRequest::new(Address::ZERO, signature.as_bytes().to_vec()))
        })],
        FlowConfig::new(CHAIN),
        FakeSanctions::clear(),
        prompts,
    );

    let chain = FakeChain::new(CHAIN);
    let status = flow.start(Some(wallet.as_dyn()), Some(&chain)).await;

    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(
        status.error.as_deref(),
        Some("Signature for 'Sign permit' is not available")
    );
    assert!(wallet.sent().is_empty());

    slot.set(Signature::new(U256::from(5), U256::from(6), true));
    let status = flow.start(Some(wallet.as_dyn()), Some(&chain)).await;
    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(wallet.sent().len(), 1);
}

#[tokio::test]
async fn test_receipt_timeout_is_recoverable() {
    let chain = FakeChain::new(CHAIN).with_receipts(Vec::new());
    let mut h = Harness::build(
        FakeWallet::new(CHAIN),
        chain,
        FakeSanctions::clear(),
        &[],
        &["Confirm Borrow"],
    );

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Review);
    assert_eq!(status.active_step, 0);
    assert!(status.error.unwrap().contains("not found after timeout"));
    assert_eq!(h.chain.receipt_polls(), 3);
}

#[tokio::test]
async fn test_closed_event_sink_does_not_change_outcome() {
    let (sink, rx) = ChannelSink::new();
    drop(rx);
    let mut h = Harness::new(&["Sign permit"], &["Confirm Supply"]);
    h.flow = ActionFlow::new(
        vec![signature("Sign permit", &h.wallet.log())],
        vec![transaction("Confirm Supply", &h.wallet.log())],
        FlowConfig::new(CHAIN),
        FakeSanctions::clear(),
        h.prompts.clone(),
    )
    .with_event_sink(Arc::new(sink));

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(status.active_step, 2);
}

#[tokio::test]
async fn test_start_after_success_is_noop() {
    let mut h = Harness::new(&["Sign permit"], &["Confirm Supply"]);
    h.start().await;
    let calls = h.log().len();

    let status = h.start().await;

    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(h.log().len(), calls);
    assert_eq!(h.completions(), 1);

    // Settled flows skip the connection check entirely
    let status = h.flow.start(None, Some(&h.chain)).await;
    assert_eq!(status.flow_state, FlowState::Success);
    assert_eq!(h.prompts.connects(), 0);
    assert_eq!(h.wallet.switch_attempts(), 0);
}

#[tokio::test]
async fn test_binding_observes_run() {
    let mut h = Harness::new(&[], &["Confirm Supply"]);
    let binding = h.flow.subscribe();
    assert_eq!(binding.snapshot().status.flow_state, FlowState::Review);

    h.start().await;

    let snapshot = binding.snapshot();
    assert_eq!(snapshot.status.flow_state, FlowState::Success);
    assert_eq!(snapshot.steps.len(), 1);
    assert_eq!(snapshot.steps[0].info.name, "Confirm Supply");
}

#[tokio::test]
async fn test_from_prepared() {
    let log = CallLog::default();
    let prepared = PrepareActionResult::success(
        vec![signature("Sign permit", &log)],
        vec![transaction("Confirm Supply", &log)],
        "supply 100 USDC",
    );

    let (flow, preview) = tokio_test::assert_ok!(ActionFlow::from_prepared(
        prepared,
        FlowConfig::new(CHAIN),
        FakeSanctions::clear(),
        Arc::new(RecordingPrompts::default()),
    ));

    assert_eq!(preview, "supply 100 USDC");
    assert_eq!(flow.status().total_steps, 2);
    assert_eq!(flow.signature_requests().len(), 1);
    assert_eq!(flow.transaction_requests().len(), 1);
}

#[tokio::test]
async fn test_from_prepared_error_builds_no_flow() {
    let prepared: PrepareActionResult<&str> =
        PrepareActionResult::error("Insufficient liquidity for borrow");

    let result = ActionFlow::from_prepared(
        prepared,
        FlowConfig::new(CHAIN),
        FakeSanctions::clear(),
        Arc::new(RecordingPrompts::default()),
    );

    let message = tokio_test::assert_err!(result.map(|_| ()));
    assert_eq!(message, "Insufficient liquidity for borrow");
}

impl Harness {
    fn sent_gas_limits(&self) -> Vec<Option<u64>> {
        self.wallet.sent().iter().map(|tx| tx.gas_limit).collect()
    }

    fn flow_sanctions_calls(&self) -> usize {
        self.flow.sanctions().calls.load(Ordering::SeqCst)
    }
}

//! Drives a wallet through a bundle of signature and transaction requests

use super::state::{FlowState, FlowStatus, Transition};
use crate::action::{PrepareActionResult, PreparedAction};
use crate::binding::FlowBinding;
use crate::client::{
    wait_for_receipt, ChainClient, Prompts, QueryCache, ReceiptStatus, SanctionsCheck, Wallet,
};
use crate::config::FlowConfig;
use crate::eligibility::{check_connection, screen_account, Gate};
use crate::error::TransitionError;
use crate::events::{EventSink, FlowEvent, TracingSink};
use crate::gas::{estimate_gas_limit, GasContext};
use crate::request::{SignatureRequest, TransactionRequest};
use eyre::Report;
use std::sync::Arc;
use tokio::sync::watch;

type CompletionFn = Box<dyn FnOnce() + Send>;

/// How a run that was not interrupted by an error ended
enum RunOutcome {
    Completed,
    Reverted,
}

/// One flow instance for a prepared action
///
/// Owned by whatever surface presents the flow and dropped with it. Signature
/// requests run first, then transaction requests, strictly in order.
/// [`start`](Self::start) is the only way to mutate the flow; observers use
/// [`subscribe`](Self::subscribe).
pub struct ActionFlow<S: SanctionsCheck> {
    signature_requests: Vec<SignatureRequest>,
    transaction_requests: Vec<TransactionRequest>,
    config: FlowConfig,
    sanctions: S,
    prompts: Arc<dyn Prompts>,
    cache: Arc<dyn QueryCache>,
    events: Arc<dyn EventSink>,
    on_success: Option<CompletionFn>,
    status: FlowStatus,
    updates: watch::Sender<FlowStatus>,
}

impl<S: SanctionsCheck> ActionFlow<S> {
    /// Create a flow in the `review` state
    pub fn new(
        signature_requests: Vec<SignatureRequest>,
        transaction_requests: Vec<TransactionRequest>,
        config: FlowConfig,
        sanctions: S,
        prompts: Arc<dyn Prompts>,
    ) -> Self {
        let status = FlowStatus::new(signature_requests.len() + transaction_requests.len());
        let (updates, _) = watch::channel(status.clone());

        Self {
            signature_requests,
            transaction_requests,
            config,
            sanctions,
            prompts,
            cache: Arc::new(()),
            events: Arc::new(TracingSink),
            on_success: None,
            status,
            updates,
        }
    }

    /// Create a flow from the result of action preparation
    ///
    /// Returns the flow with the action's preview on success. A failed
    /// preparation builds no flow and hands back its message for display.
    pub fn from_prepared<P>(
        result: PrepareActionResult<P>,
        config: FlowConfig,
        sanctions: S,
        prompts: Arc<dyn Prompts>,
    ) -> Result<(Self, P), String> {
        let PreparedAction {
            signature_requests,
            transaction_requests,
            preview,
        } = match result {
            PrepareActionResult::Success(prepared) => prepared,
            PrepareActionResult::Error { message } => {
                tracing::debug!("Action preparation failed: {}", message);
                return Err(message);
            }
        };

        let flow = Self::new(
            signature_requests,
            transaction_requests,
            config,
            sanctions,
            prompts,
        );
        Ok((flow, preview))
    }

    /// Refresh cached queries after each confirmed transaction
    pub fn with_cache(mut self, cache: Arc<dyn QueryCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Send telemetry to `events` instead of `tracing`
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Run `f` once when every request has completed
    pub fn on_success(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn status(&self) -> &FlowStatus {
        &self.status
    }

    pub fn signature_requests(&self) -> &[SignatureRequest] {
        &self.signature_requests
    }

    pub fn transaction_requests(&self) -> &[TransactionRequest] {
        &self.transaction_requests
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn sanctions(&self) -> &S {
        &self.sanctions
    }

    /// Observe status changes
    pub fn subscribe(&self) -> FlowBinding {
        FlowBinding::new(
            self.updates.subscribe(),
            &self.signature_requests,
            &self.transaction_requests,
        )
    }

    /// Start or resume the flow.
    ///
    /// Does nothing unless the flow is in `review`: the state check comes
    /// before the connection and chain checks, so a flow that already settled
    /// in `success` or `failed` never prompts. From `review`, a missing wallet
    /// or read client shows the connect prompt, and a chain mismatch that one
    /// automatic switch cannot fix shows the manual switch prompt; neither
    /// changes state.
    /// Otherwise the run continues from `active_step` and settles in `success`,
    /// `failed`, or `review` with an error. Always returns the resulting status.
    pub async fn start<C: ChainClient>(
        &mut self,
        wallet: Option<Arc<dyn Wallet>>,
        chain: Option<&C>,
    ) -> FlowStatus {
        if self.status.flow_state != FlowState::Review {
            tracing::debug!("Ignoring start while flow is {}", self.status.flow_state);
            return self.status.clone();
        }

        let gate = check_connection(
            wallet,
            chain.is_some(),
            self.config.required_chain_id,
            self.prompts.as_ref(),
        )
        .await;
        let (wallet, chain) = match (gate, chain) {
            (Gate::Ready(wallet), Some(chain)) => (wallet, chain),
            _ => return self.status.clone(),
        };

        if let Err(err) = self.transition(Transition::Start) {
            tracing::error!("Failed to start flow: {}", err);
            return self.status.clone();
        }
        tracing::info!(
            "Starting flow for {} at step {}/{}",
            wallet.address(),
            self.status.active_step,
            self.status.total_steps
        );

        match screen_account(&self.sanctions, wallet.address()).await {
            Ok(false) => {}
            Ok(true) => {
                let message = self.config.sanctioned_message.clone();
                if let Err(err) = self.transition(Transition::Rejected(message)) {
                    tracing::error!("Failed to reject flow: {}", err);
                }
                return self.status.clone();
            }
            Err(err) => {
                self.fail_recoverably(err, wallet.as_ref());
                return self.status.clone();
            }
        }

        match self.run(wallet.clone(), chain).await {
            Ok(RunOutcome::Completed) => match self.transition(Transition::Succeeded) {
                Ok(()) => {
                    tracing::info!("Flow completed after {} steps", self.status.total_steps);
                    if let Some(on_success) = self.on_success.take() {
                        on_success();
                    }
                }
                Err(err) => self.fail_recoverably(err.into(), wallet.as_ref()),
            },
            Ok(RunOutcome::Reverted) => {}
            Err(err) => self.fail_recoverably(err, wallet.as_ref()),
        }

        self.status.clone()
    }

    /// Execute the remaining requests. Completed steps are skipped, so a
    /// retry after an error picks up at the step that failed.
    async fn run<C: ChainClient>(
        &mut self,
        wallet: Arc<dyn Wallet>,
        chain: &C,
    ) -> Result<RunOutcome, Report> {
        let signature_count = self.signature_requests.len();
        let total = self.status.total_steps;

        while self.status.active_step < total {
            let index = self.status.active_step;
            self.transition(Transition::AwaitWallet)?;

            if index < signature_count {
                let request = self.signature_requests[index].clone();
                tracing::info!("Step {}/{}: signing '{}'", index + 1, total, request.name());
                request.sign(wallet.clone()).await?;
                self.transition(Transition::StepCompleted)?;
                continue;
            }

            let request = self.transaction_requests[index - signature_count].clone();
            tracing::info!("Step {}/{}: submitting '{}'", index + 1, total, request.name());
            let outcome = self
                .execute_transaction(&request, wallet.as_ref(), chain)
                .await?;
            if let RunOutcome::Reverted = outcome {
                return Ok(RunOutcome::Reverted);
            }
        }

        Ok(RunOutcome::Completed)
    }

    async fn execute_transaction<C: ChainClient>(
        &mut self,
        request: &TransactionRequest,
        wallet: &dyn Wallet,
        chain: &C,
    ) -> Result<RunOutcome, Report> {
        let account = wallet.address();
        let connector = wallet.connector().to_string();
        let step = request.name().to_string();

        let mut tx = request.tx()?;
        let gas_limit = estimate_gas_limit(
            chain,
            &tx,
            &self.config.gas,
            self.events.as_ref(),
            GasContext {
                account,
                connector: &connector,
                step: &step,
            },
        )
        .await;
        tx.gas_limit = Some(gas_limit);

        let hash = wallet.send_transaction(tx).await?;
        self.transition(Transition::Submitted(hash))?;
        tracing::info!("Submitted '{}': {}", step, hash);
        self.events.emit(FlowEvent::TransactionPending {
            account,
            connector: connector.clone(),
            step: step.clone(),
            hash,
        });

        match wait_for_receipt(chain, hash, self.config.receipt_polling).await? {
            ReceiptStatus::Success => {
                self.events.emit(FlowEvent::TransactionSuccess {
                    account,
                    connector,
                    step,
                    hash,
                });
                self.transition(Transition::StepCompleted)?;
                self.cache.invalidate_all();
                self.cache.refetch_all();
                Ok(RunOutcome::Completed)
            }
            ReceiptStatus::Reverted => {
                tracing::warn!("Transaction {} for '{}' reverted", hash, step);
                self.events.emit(FlowEvent::TransactionFailed {
                    account,
                    connector,
                    step,
                    hash,
                });
                self.transition(Transition::Reverted)?;
                Ok(RunOutcome::Reverted)
            }
        }
    }

    /// Return to `review` with the error message so the user can retry
    fn fail_recoverably(&mut self, err: Report, wallet: &dyn Wallet) {
        let message = format!("{err:#}");
        let step = self.step_name(self.status.active_step).map(str::to_string);
        tracing::warn!(
            "Flow error at step {} ({}): {}",
            self.status.active_step,
            step.as_deref().unwrap_or("eligibility"),
            message
        );

        self.events.emit(FlowEvent::FlowError {
            account: wallet.address(),
            connector: wallet.connector().to_string(),
            step,
            error: message.clone(),
        });

        if let Err(err) = self.transition(Transition::Errored(message)) {
            tracing::error!("Failed to record flow error: {}", err);
        }
    }

    fn step_name(&self, index: usize) -> Option<&str> {
        let signature_count = self.signature_requests.len();
        if index < signature_count {
            Some(self.signature_requests[index].name())
        } else {
            self.transaction_requests
                .get(index - signature_count)
                .map(TransactionRequest::name)
        }
    }

    fn transition(&mut self, transition: Transition) -> Result<(), TransitionError> {
        let next = self.status.apply(transition)?;
        self.updates.send_replace(next.clone());
        self.status = next;
        Ok(())
    }
}

//! Read-only view of a flow for presentation
//!
//! A [`FlowBinding`] follows status changes over a `watch` channel and turns
//! them into [`FlowSnapshot`]s with per-step progress. Mutation stays with
//! [`ActionFlow::start`](crate::ActionFlow::start).

use crate::config::NetworkConfig;
use crate::flow::{FlowState, FlowStatus, StepStatus};
use crate::request::{SignatureRequest, TransactionRequest};
use eyre::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Kind of request behind a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Signature,
    Transaction,
}

/// Static description of a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub name: String,
    pub kind: StepKind,
    pub learn_more: Option<String>,
}

/// A step with its current progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    #[serde(flatten)]
    pub info: StepInfo,
    pub status: StepStatus,
}

/// Everything a flow dialog renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    #[serde(flatten)]
    pub status: FlowStatus,
    pub steps: Vec<StepView>,
    /// Explorer link for the last submitted transaction
    pub explorer_url: Option<String>,
}

/// What closing the flow surface should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Nothing in flight, close immediately
    Close,
    /// A step is in flight and cannot be rolled back; ask before closing
    ConfirmRequired,
}

/// Subscription to a flow's status
#[derive(Debug, Clone)]
pub struct FlowBinding {
    rx: watch::Receiver<FlowStatus>,
    steps: Arc<[StepInfo]>,
    network: Option<NetworkConfig>,
}

impl FlowBinding {
    pub(crate) fn new(
        rx: watch::Receiver<FlowStatus>,
        signature_requests: &[SignatureRequest],
        transaction_requests: &[TransactionRequest],
    ) -> Self {
        let steps = signature_requests
            .iter()
            .map(|request| StepInfo {
                name: request.name().to_string(),
                kind: StepKind::Signature,
                learn_more: None,
            })
            .chain(transaction_requests.iter().map(|request| StepInfo {
                name: request.name().to_string(),
                kind: StepKind::Transaction,
                learn_more: request.learn_more().map(str::to_string),
            }))
            .collect();

        Self {
            rx,
            steps,
            network: None,
        }
    }

    /// Render explorer links using `network`
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    pub fn steps(&self) -> &[StepInfo] {
        &self.steps
    }

    /// Current view of the flow
    pub fn snapshot(&self) -> FlowSnapshot {
        let status = self.rx.borrow().clone();
        self.render(status)
    }

    /// Wait for the next status change
    pub async fn changed(&mut self) -> Result<FlowSnapshot> {
        self.rx.changed().await.context("Flow was dropped")?;
        let status = self.rx.borrow_and_update().clone();
        Ok(self.render(status))
    }

    /// Whether closing now needs confirmation
    pub fn request_close(&self) -> CloseDecision {
        if self.rx.borrow().flow_state == FlowState::Active {
            CloseDecision::ConfirmRequired
        } else {
            CloseDecision::Close
        }
    }

    fn render(&self, status: FlowStatus) -> FlowSnapshot {
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, info)| StepView {
                info: info.clone(),
                status: status.step_status(index),
            })
            .collect();
        let explorer_url = match (&self.network, status.last_transaction_hash) {
            (Some(network), Some(hash)) => Some(network.explorer_tx_url(hash)),
            _ => None,
        };

        FlowSnapshot {
            status,
            steps,
            explorer_url,
        }
    }
}

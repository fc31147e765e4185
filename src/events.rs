//! Flow telemetry
//!
//! Events are fire-and-forget: sinks must not block and a failing sink never
//! changes how a flow settles.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Operationally relevant flow milestones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    /// Gas estimation failed and the fallback limit was used
    GasEstimateFallback {
        account: Address,
        connector: String,
        step: String,
        error: String,
    },
    /// Transaction submitted and awaiting confirmation
    TransactionPending {
        account: Address,
        connector: String,
        step: String,
        hash: TxHash,
    },
    /// Transaction mined successfully
    TransactionSuccess {
        account: Address,
        connector: String,
        step: String,
        hash: TxHash,
    },
    /// Transaction mined but reverted
    TransactionFailed {
        account: Address,
        connector: String,
        step: String,
        hash: TxHash,
    },
    /// A recoverable error stopped the run
    FlowError {
        account: Address,
        connector: String,
        step: Option<String>,
        error: String,
    },
}

impl FlowEvent {
    /// Event name as reported to the telemetry backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::GasEstimateFallback { .. } => "gas_estimate_fallback",
            Self::TransactionPending { .. } => "transaction_pending",
            Self::TransactionSuccess { .. } => "transaction_success",
            Self::TransactionFailed { .. } => "transaction_failed",
            Self::FlowError { .. } => "flow_error",
        }
    }
}

/// One-way telemetry sink
pub trait EventSink: Send + Sync {
    fn emit(&self, event: FlowEvent);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: FlowEvent) {
        (**self).emit(event)
    }
}

/// Writes events as structured `tracing` records
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: FlowEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        match event {
            FlowEvent::TransactionFailed { .. } | FlowEvent::FlowError { .. } => {
                tracing::warn!(target: "action_flow::events", event = event.name(), %payload);
            }
            _ => {
                tracing::info!(target: "action_flow::events", event = event.name(), %payload);
            }
        }
    }
}

/// Queues events for a background consumer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its queue
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FlowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a sink whose events are handed to `handler` on a spawned task.
    ///
    /// Handler errors are logged and dropped. The task ends once every clone
    /// of the sink is dropped.
    pub fn spawn<F, Fut>(handler: F) -> (Self, JoinHandle<()>)
    where
        F: Fn(FlowEvent) -> Fut + Send + 'static,
        Fut: Future<Output = eyre::Result<()>> + Send + 'static,
    {
        let (sink, mut rx) = Self::new();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let name = event.name();
                if let Err(err) = handler(event).await {
                    tracing::warn!("Failed to deliver {} event: {:#}", name, err);
                }
            }
        });
        (sink, task)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: FlowEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event queue closed, dropping event");
        }
    }
}

//! Flow state graph
//!
//! All status changes go through [`FlowStatus::apply`], which rejects
//! transitions the graph does not allow (e.g. resuming after `failed`).
//!
//! ```text
//! review --Start--> active --Succeeded--> success
//!    ^                 |  \
//!    +--Errored/Rejected    +--Reverted--> failed
//! ```

use crate::error::TransitionError;
use alloy::primitives::TxHash;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a flow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    /// Waiting for the user to start (or retry)
    Review,
    /// Executing requests
    Active,
    /// Every request completed
    Success,
    /// A transaction reverted on-chain
    Failed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Review => "review",
            Self::Active => "active",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What the active step is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionState {
    /// Waiting for the user to approve in the wallet
    PendingWallet,
    /// Submitted, waiting for confirmation
    PendingTransaction,
}

/// Inputs to the state graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Eligibility passed, begin executing
    Start,
    /// Next request is waiting on the wallet
    AwaitWallet,
    /// Transaction accepted by the network
    Submitted(TxHash),
    /// Current request finished
    StepCompleted,
    /// All requests finished
    Succeeded,
    /// Transaction mined but reverted
    Reverted,
    /// Recoverable error, back to review
    Errored(String),
    /// Account failed sanctions screening
    Rejected(String),
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AwaitWallet => "await-wallet",
            Self::Submitted(_) => "submitted",
            Self::StepCompleted => "step-completed",
            Self::Succeeded => "succeeded",
            Self::Reverted => "reverted",
            Self::Errored(_) => "errored",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Progress marker for a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Complete,
    Current,
    /// The step whose transaction reverted
    Failed,
    Upcoming,
}

/// Observable state of a flow instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    pub flow_state: FlowState,
    /// Index into signature requests followed by transaction requests
    pub active_step: usize,
    pub total_steps: usize,
    pub action_state: ActionState,
    pub last_transaction_hash: Option<TxHash>,
    pub error: Option<String>,
}

impl FlowStatus {
    /// Fresh status for a bundle of `total_steps` requests
    pub fn new(total_steps: usize) -> Self {
        Self {
            flow_state: FlowState::Review,
            active_step: 0,
            total_steps,
            action_state: ActionState::PendingWallet,
            last_transaction_hash: None,
            error: None,
        }
    }

    /// Apply a transition, returning the next status
    pub fn apply(&self, transition: Transition) -> Result<Self, TransitionError> {
        let mut next = self.clone();

        match (self.flow_state, transition) {
            (FlowState::Review, Transition::Start) => {
                // active_step is kept so a retry resumes where the last run stopped
                next.flow_state = FlowState::Active;
                next.action_state = ActionState::PendingWallet;
                next.last_transaction_hash = None;
                next.error = None;
            }
            (FlowState::Active, Transition::AwaitWallet) => {
                next.action_state = ActionState::PendingWallet;
            }
            (FlowState::Active, Transition::Submitted(hash)) => {
                next.action_state = ActionState::PendingTransaction;
                next.last_transaction_hash = Some(hash);
            }
            (FlowState::Active, Transition::StepCompleted) => {
                if self.active_step >= self.total_steps {
                    return Err(TransitionError::StepOutOfRange {
                        active_step: self.active_step,
                        total_steps: self.total_steps,
                    });
                }
                next.active_step += 1;
                next.action_state = ActionState::PendingWallet;
            }
            (FlowState::Active, Transition::Succeeded) => {
                if self.active_step < self.total_steps {
                    return Err(TransitionError::StepsRemaining {
                        remaining: self.total_steps - self.active_step,
                    });
                }
                next.flow_state = FlowState::Success;
            }
            (FlowState::Active, Transition::Reverted) => {
                next.flow_state = FlowState::Failed;
            }
            (FlowState::Active, Transition::Errored(message))
            | (FlowState::Active, Transition::Rejected(message)) => {
                next.flow_state = FlowState::Review;
                next.action_state = ActionState::PendingWallet;
                next.error = Some(message);
            }
            (state, transition) => return Err(TransitionError::illegal(state, &transition)),
        }

        Ok(next)
    }

    /// Number of requests not yet completed
    pub fn remaining_steps(&self) -> usize {
        self.total_steps.saturating_sub(self.active_step)
    }

    /// Progress marker for step `index`
    pub fn step_status(&self, index: usize) -> StepStatus {
        if index < self.active_step || self.flow_state == FlowState::Success {
            StepStatus::Complete
        } else if index == self.active_step && self.flow_state == FlowState::Active {
            StepStatus::Current
        } else if index == self.active_step && self.flow_state == FlowState::Failed {
            StepStatus::Failed
        } else {
            StepStatus::Upcoming
        }
    }
}

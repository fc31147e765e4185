//! Error types for the action flow
//!
//! Uses `eyre` for ergonomic error handling with context. Reducer failures get
//! a typed error so callers can match on them.

pub use eyre::{eyre, Context, Report, Result};

use crate::flow::{FlowState, Transition};

/// A transition the flow state graph does not allow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The transition is not defined for the current flow state
    #[error("cannot apply {transition} while flow is {state}")]
    Illegal {
        state: FlowState,
        transition: &'static str,
    },
    /// Completing a step would move past the last request
    #[error("step {active_step} is past the last of {total_steps} steps")]
    StepOutOfRange {
        active_step: usize,
        total_steps: usize,
    },
    /// Success was reported while steps remain
    #[error("flow cannot succeed with {remaining} steps remaining")]
    StepsRemaining { remaining: usize },
}

impl TransitionError {
    pub(crate) fn illegal(state: FlowState, transition: &Transition) -> Self {
        Self::Illegal {
            state,
            transition: transition.name(),
        }
    }
}

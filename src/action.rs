//! Prepared actions handed to the flow
//!
//! Action preparation (bundle construction, swap quotes, calldata encoding)
//! happens elsewhere. The flow only branches on whether preparation succeeded.

use crate::request::{SignatureRequest, TransactionRequest};
use serde::Serialize;

/// Output of an action preparation step
///
/// `P` is the action-specific preview (position changes, quotes, ...) shown on
/// the review screen. The flow never inspects it.
#[derive(Debug, Clone)]
pub enum PrepareActionResult<P> {
    Success(PreparedAction<P>),
    Error { message: String },
}

/// A successfully prepared bundle
#[derive(Debug, Clone)]
pub struct PreparedAction<P> {
    pub signature_requests: Vec<SignatureRequest>,
    pub transaction_requests: Vec<TransactionRequest>,
    pub preview: P,
}

/// Discriminant of a [`PrepareActionResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrepareStatus {
    Success,
    Error,
}

impl<P> PrepareActionResult<P> {
    /// Successful preparation with the given requests
    pub fn success(
        signature_requests: Vec<SignatureRequest>,
        transaction_requests: Vec<TransactionRequest>,
        preview: P,
    ) -> Self {
        Self::Success(PreparedAction {
            signature_requests,
            transaction_requests,
            preview,
        })
    }

    /// Failed preparation
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn status(&self) -> PrepareStatus {
        match self {
            Self::Success(_) => PrepareStatus::Success,
            Self::Error { .. } => PrepareStatus::Error,
        }
    }

    /// Convert into a `Result`, keeping the preparation error message
    pub fn into_result(self) -> Result<PreparedAction<P>, String> {
        match self {
            Self::Success(prepared) => Ok(prepared),
            Self::Error { message } => Err(message),
        }
    }
}

impl<P> PreparedAction<P> {
    /// Total number of steps in the bundle
    pub fn step_count(&self) -> usize {
        self.signature_requests.len() + self.transaction_requests.len()
    }
}

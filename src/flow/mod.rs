//! Action flow state machine

mod machine;
mod state;

#[cfg(test)]
pub(crate) mod tests;

pub use machine::ActionFlow;
pub use state::{ActionState, FlowState, FlowStatus, StepStatus, Transition};

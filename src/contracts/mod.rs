//! Contract bindings used by the flow

pub mod sanctions;

pub use sanctions::*;

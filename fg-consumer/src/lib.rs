//! Consumer Controller (C5): a thin CosmWasm client translating typed
//! operations into `MsgExecuteContract` payloads and typed queries into
//! `QuerySmartContractStateRequest` (spec.md §4.3).

pub mod client;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod msgs;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::{CosmWasmController, TxSigner};
pub use controller::ConsumerController;
pub use error::ConsumerError;
pub use metrics::GasMetrics;

//! JSON-RPC front-end (C9): fronts the upstream L2 node with a single
//! intercepted method, `eth_getBlockByNumber("finalized", ...)`, answered
//! from the finalization resolver (C8); everything else passes through.

pub mod api;
pub mod error;
pub mod server;

pub use api::EthApiServer;
pub use error::RpcError;
pub use server::{serve, FgRpcServer};

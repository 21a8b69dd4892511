//! Chain Poller (C4): a single-producer source of `BlockInfo`, strictly
//! monotone in height, fed by an unauthenticated L2 JSON-RPC client.

pub mod error;
pub mod poller;
pub mod rpc;

pub use error::PollerError;
pub use poller::{ChainPoller, PollerConfig};
pub use rpc::L2RpcClient;

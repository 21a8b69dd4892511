use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::RpcResult;
use jsonrpsee::server::{Server, ServerHandle};

use fg_poller::L2RpcClient;
use fg_resolver::FinalizationResolver;

use crate::api::EthApiServer;
use crate::error::RpcError;

/// JSON-RPC front-end (C9): a single `eth_getBlockByNumber` passthrough that
/// intercepts the `"finalized"` tag and answers it from the resolver (C8)
/// instead of the upstream node's own notion of finality.
pub struct FgRpcServer {
    l2: Arc<L2RpcClient>,
    resolver: Arc<FinalizationResolver>,
}

impl FgRpcServer {
    pub fn new(l2: Arc<L2RpcClient>, resolver: Arc<FinalizationResolver>) -> Self {
        Self { l2, resolver }
    }
}

#[jsonrpsee::core::async_trait]
impl EthApiServer for FgRpcServer {
    async fn get_block_by_number(&self, number: String, full_tx: bool) -> RpcResult<serde_json::Value> {
        if number != "finalized" {
            return self
                .l2
                .raw_get_block_by_number(&number, full_tx)
                .await
                .map_err(|e| RpcError::from(e).into());
        }

        let height = self
            .resolver
            .finalized_tip()
            .await
            .map_err(RpcError::from)?;

        self.l2
            .raw_get_block_by_number(&format!("0x{height:x}"), full_tx)
            .await
            .map_err(|e| RpcError::from(e).into())
    }
}

/// Binds and starts the RPC server on `addr`, returning a handle the caller
/// keeps alive (and can call `.stop()` on) for as long as the server should run.
pub async fn serve(
    addr: SocketAddr,
    l2: Arc<L2RpcClient>,
    resolver: Arc<FinalizationResolver>,
) -> std::io::Result<ServerHandle> {
    let server = Server::builder().build(addr).await?;
    let module = FgRpcServer::new(l2, resolver).into_rpc();
    Ok(server.start(module))
}

use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

/// The single exposed method, on the `eth` namespace, per spec.md §4.5.
/// Every other namespace and method is left to the upstream node, which
/// callers reach directly; this server only fronts the one method whose
/// semantics the finality gadget changes.
#[rpc(server, namespace = "eth")]
pub trait EthApi {
    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(&self, number: String, full_tx: bool) -> RpcResult<serde_json::Value>;
}

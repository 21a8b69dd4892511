use jsonrpsee::types::ErrorObjectOwned;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Resolver(#[from] fg_resolver::ResolverError),

    #[error(transparent)]
    Poller(#[from] fg_poller::PollerError),
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        ErrorObjectOwned::owned(-32000, err.to_string(), None::<()>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poller_error_carries_its_message_into_the_json_rpc_error() {
        let err: RpcError = fg_poller::PollerError::Decode("bad hex".to_string()).into();
        let obj: ErrorObjectOwned = err.into();
        assert!(obj.message().contains("bad hex"));
    }
}

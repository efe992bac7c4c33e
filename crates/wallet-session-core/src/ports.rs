use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContractKind, NetworkInfo, WalletEvent};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Read surface shared by the injected wallet and the fallback client.
#[async_trait]
pub trait ClientPort: Send + Sync {
    async fn network(&self) -> Result<NetworkInfo, PortError>;
    async fn accounts(&self) -> Result<Vec<Address>, PortError>;
    async fn lookup_address(&self, address: Address) -> Result<String, PortError>;
    async fn resolve_name(&self, name: &str) -> Result<Address, PortError>;
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError>;
}

/// The injected wallet bridge: read surface plus the connection flow, the
/// normalized event queue, and the signing/submission path.
#[async_trait]
pub trait WalletProviderPort: ClientPort {
    async fn request_connection(&self) -> Result<(), PortError>;
    async fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError>;
    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, PortError>;
    async fn wait_for_confirmation(&self, tx_hash: B256, confirmations: u64)
        -> Result<(), PortError>;
}

/// Read-only client bound to a fixed public endpoint; accounts are always
/// empty.
#[async_trait]
pub trait FallbackClientPort: ClientPort {
    async fn connect(&self, endpoint: &str) -> Result<(), PortError>;
}

/// Maps a contract kind to its interface for typed call encoding and for the
/// manual coding of the batched balance query.
pub trait AbiRegistryPort: Send + Sync {
    fn encode_call(
        &self,
        kind: ContractKind,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Bytes, PortError>;

    fn decode_output(
        &self,
        kind: ContractKind,
        method: &str,
        data: &[u8],
    ) -> Result<Vec<DynSolValue>, PortError>;
}

/// External pool-data collaborator loaded alongside balances and proxies.
#[async_trait]
pub trait PoolDataPort: Send + Sync {
    async fn load_pool_positions(&self, account: Address) -> Result<(), PortError>;
    async fn load_pool_shares(&self, account: Address) -> Result<(), PortError>;
}

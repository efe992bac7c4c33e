use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use wallet_session_core::{ClientPort, FallbackClientPort, NetworkInfo, PortError};

use crate::config::SessionAdapterConfig;
use crate::ens;
use crate::rpc::{value_to_u64, JsonRpcClient};

/// Read-only public RPC client used when the wallet's chain is unsupported.
/// Accounts are always empty: nothing reachable through this client can sign.
#[derive(Debug, Clone)]
pub struct FallbackRpcAdapter {
    mode: FallbackMode,
    timeout_ms: u64,
    url_override: Option<String>,
    state: Arc<Mutex<FallbackState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackMode {
    Deterministic,
    Http,
}

#[derive(Debug, Default)]
struct FallbackState {
    endpoint: Option<String>,
    connect_count: u64,
    rpc: Option<JsonRpcClient>,
    chain_id: u64,
    names: BTreeMap<Address, String>,
    call_results: BTreeMap<Vec<u8>, Bytes>,
    fail_connect: bool,
}

impl Default for FallbackRpcAdapter {
    fn default() -> Self {
        Self::deterministic(1)
    }
}

impl FallbackRpcAdapter {
    /// In-memory client for tests; reports `chain_id` and serves canned
    /// responses.
    pub fn deterministic(chain_id: u64) -> Self {
        Self {
            mode: FallbackMode::Deterministic,
            timeout_ms: SessionAdapterConfig::default().request_timeout_ms,
            url_override: None,
            state: Arc::new(Mutex::new(FallbackState {
                chain_id,
                ..FallbackState::default()
            })),
        }
    }

    pub fn http(config: &SessionAdapterConfig) -> Self {
        Self {
            mode: FallbackMode::Http,
            timeout_ms: config.request_timeout_ms,
            url_override: config.rpc_url_override.clone(),
            state: Arc::new(Mutex::new(FallbackState::default())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, FallbackState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("fallback lock poisoned: {e}")))
    }

    fn rpc(&self) -> Result<JsonRpcClient, PortError> {
        self.lock()?
            .rpc
            .clone()
            .ok_or_else(|| PortError::Validation("fallback client not connected".to_owned()))
    }

    pub fn last_endpoint(&self) -> Result<Option<String>, PortError> {
        Ok(self.lock()?.endpoint.clone())
    }

    pub fn connect_count(&self) -> Result<u64, PortError> {
        Ok(self.lock()?.connect_count)
    }

    pub fn debug_register_name(&self, address: Address, name: &str) -> Result<(), PortError> {
        self.lock()?.names.insert(address, name.to_owned());
        Ok(())
    }

    pub fn debug_set_call_result(&self, data: Bytes, result: Bytes) -> Result<(), PortError> {
        self.lock()?.call_results.insert(data.to_vec(), result);
        Ok(())
    }

    pub fn debug_set_connect_failure(&self, fail: bool) -> Result<(), PortError> {
        self.lock()?.fail_connect = fail;
        Ok(())
    }
}

#[async_trait]
impl ClientPort for FallbackRpcAdapter {
    async fn network(&self) -> Result<NetworkInfo, PortError> {
        match self.mode {
            FallbackMode::Http => {
                let rpc = self.rpc()?;
                let result = rpc.request("eth_chainId", serde_json::json!([])).await?;
                Ok(NetworkInfo::for_chain(value_to_u64(&result)?))
            }
            FallbackMode::Deterministic => Ok(NetworkInfo::for_chain(self.lock()?.chain_id)),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, PortError> {
        Ok(Vec::new())
    }

    async fn lookup_address(&self, address: Address) -> Result<String, PortError> {
        match self.mode {
            FallbackMode::Http => ens::lookup_address(&self.rpc()?, address).await,
            FallbackMode::Deterministic => self
                .lock()?
                .names
                .get(&address)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("no reverse record for {address}"))),
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<Address, PortError> {
        match self.mode {
            FallbackMode::Http => ens::resolve_name(&self.rpc()?, name).await,
            FallbackMode::Deterministic => {
                let g = self.lock()?;
                g.names
                    .iter()
                    .find(|(_, n)| n.as_str() == name)
                    .map(|(a, _)| *a)
                    .ok_or_else(|| PortError::NotFound(format!("name does not resolve: {name}")))
            }
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        match self.mode {
            FallbackMode::Http => self.rpc()?.eth_call(to, &data).await,
            FallbackMode::Deterministic => self
                .lock()?
                .call_results
                .get(data.as_ref())
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("no canned result for call to {to}"))),
        }
    }
}

#[async_trait]
impl FallbackClientPort for FallbackRpcAdapter {
    async fn connect(&self, endpoint: &str) -> Result<(), PortError> {
        let endpoint = self.url_override.as_deref().unwrap_or(endpoint);
        let rpc = match self.mode {
            FallbackMode::Http => Some(JsonRpcClient::new(endpoint, self.timeout_ms)?),
            FallbackMode::Deterministic => None,
        };
        let mut g = self.lock()?;
        if g.fail_connect {
            return Err(PortError::Transport(format!(
                "endpoint unreachable: {endpoint}"
            )));
        }
        g.endpoint = Some(endpoint.to_owned());
        g.connect_count += 1;
        if let Some(rpc) = rpc {
            tracing::debug!(url = rpc.url(), "fallback endpoint configured");
            g.rpc = Some(rpc);
        }
        Ok(())
    }
}

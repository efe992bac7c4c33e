use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256};
use async_trait::async_trait;

use wallet_session_core::{
    ClientPort, NetworkInfo, PortError, WalletEvent, WalletProviderPort,
};

use crate::config::SessionAdapterConfig;
use crate::ens;
use crate::rpc::{value_to_address, value_to_u64, JsonRpcClient};

/// Wallet-side provider. Runs against a JSON-RPC wallet bridge when one is
/// configured, and falls back to a deterministic in-memory wallet otherwise.
/// The deterministic mode backs the test suites: state is injected through
/// the `debug_*` hooks and events queue until the manager drains them.
#[derive(Debug, Clone)]
pub struct InjectedWalletAdapter {
    mode: WalletMode,
    poll_interval_ms: u64,
    max_polls: u64,
    state: Arc<Mutex<WalletState>>,
}

#[derive(Debug, Clone)]
enum WalletMode {
    Deterministic,
    Bridge(JsonRpcClient),
}

#[derive(Debug)]
struct WalletState {
    connected: bool,
    chain_id: u64,
    accounts: Vec<Address>,
    names: BTreeMap<Address, String>,
    events: Vec<WalletEvent>,
    call_results: BTreeMap<Vec<u8>, Bytes>,
    fail_network: bool,
    fail_send: bool,
    fail_confirmation: bool,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            connected: false,
            chain_id: 1,
            accounts: vec!["0x1000000000000000000000000000000000000001"
                .parse()
                .expect("valid built-in deterministic account")],
            names: BTreeMap::new(),
            events: Vec::new(),
            call_results: BTreeMap::new(),
            fail_network: false,
            fail_send: false,
            fail_confirmation: false,
        }
    }
}

impl Default for InjectedWalletAdapter {
    fn default() -> Self {
        Self::with_config(&SessionAdapterConfig::default())
    }
}

impl InjectedWalletAdapter {
    pub fn with_config(config: &SessionAdapterConfig) -> Self {
        let mode = match config.bridge_url.as_deref() {
            Some(url) => match JsonRpcClient::new(url, config.request_timeout_ms) {
                Ok(client) => WalletMode::Bridge(client),
                Err(e) => {
                    tracing::warn!(error = %e, "wallet bridge client init failed, running deterministically");
                    WalletMode::Deterministic
                }
            },
            None => WalletMode::Deterministic,
        };
        Self {
            mode,
            poll_interval_ms: config.confirmation_poll_interval_ms,
            max_polls: config.max_confirmation_polls,
            state: Arc::new(Mutex::new(WalletState::default())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, WalletState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("wallet lock poisoned: {e}")))
    }

    pub fn debug_set_chain_id(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock()?.chain_id = chain_id;
        Ok(())
    }

    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_register_name(&self, address: Address, name: &str) -> Result<(), PortError> {
        self.lock()?.names.insert(address, name.to_owned());
        Ok(())
    }

    /// Canned `eth_call` result keyed by exact calldata.
    pub fn debug_set_call_result(&self, data: Bytes, result: Bytes) -> Result<(), PortError> {
        self.lock()?.call_results.insert(data.to_vec(), result);
        Ok(())
    }

    pub fn debug_set_network_failure(&self, fail: bool) -> Result<(), PortError> {
        self.lock()?.fail_network = fail;
        Ok(())
    }

    pub fn debug_set_send_failure(&self, fail: bool) -> Result<(), PortError> {
        self.lock()?.fail_send = fail;
        Ok(())
    }

    pub fn debug_set_confirmation_failure(&self, fail: bool) -> Result<(), PortError> {
        self.lock()?.fail_confirmation = fail;
        Ok(())
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.accounts = accounts.clone();
        g.events.push(WalletEvent::AccountsChanged(accounts));
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.chain_id = chain_id;
        g.events.push(WalletEvent::ChainChanged);
        Ok(())
    }

    pub fn debug_inject_network_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.chain_id = chain_id;
        g.events.push(WalletEvent::NetworkChanged);
        Ok(())
    }

    pub fn debug_inject_close(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.connected = false;
        g.events.push(WalletEvent::Close);
        Ok(())
    }

    async fn bridge_receipt_block(
        &self,
        bridge: &JsonRpcClient,
        tx_hash: B256,
    ) -> Result<Option<u64>, PortError> {
        let receipt = bridge
            .request(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.to_string()]),
            )
            .await?;
        if receipt.is_null() {
            return Ok(None);
        }
        let block = receipt
            .get("blockNumber")
            .ok_or_else(|| PortError::Transport("receipt missing blockNumber".to_owned()))?;
        value_to_u64(block).map(Some)
    }
}

#[async_trait]
impl ClientPort for InjectedWalletAdapter {
    async fn network(&self) -> Result<NetworkInfo, PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => {
                let result = bridge.request("eth_chainId", serde_json::json!([])).await?;
                Ok(NetworkInfo::for_chain(value_to_u64(&result)?))
            }
            WalletMode::Deterministic => {
                let g = self.lock()?;
                if g.fail_network {
                    return Err(PortError::Transport(
                        "injected provider unreachable".to_owned(),
                    ));
                }
                Ok(NetworkInfo::for_chain(g.chain_id))
            }
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => {
                let result = bridge.request("eth_accounts", serde_json::json!([])).await?;
                let arr = result
                    .as_array()
                    .ok_or_else(|| PortError::Transport("eth_accounts: array expected".to_owned()))?;
                arr.iter().map(value_to_address).collect()
            }
            WalletMode::Deterministic => Ok(self.lock()?.accounts.clone()),
        }
    }

    async fn lookup_address(&self, address: Address) -> Result<String, PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => ens::lookup_address(bridge, address).await,
            WalletMode::Deterministic => self
                .lock()?
                .names
                .get(&address)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("no reverse record for {address}"))),
        }
    }

    async fn resolve_name(&self, name: &str) -> Result<Address, PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => ens::resolve_name(bridge, name).await,
            WalletMode::Deterministic => {
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
        match &self.mode {
            WalletMode::Bridge(bridge) => bridge.eth_call(to, &data).await,
            WalletMode::Deterministic => self
                .lock()?
                .call_results
                .get(data.as_ref())
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("no canned result for call to {to}"))),
        }
    }
}

#[async_trait]
impl WalletProviderPort for InjectedWalletAdapter {
    async fn request_connection(&self) -> Result<(), PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => {
                let result = bridge
                    .request("eth_requestAccounts", serde_json::json!([]))
                    .await?;
                let arr = result.as_array().ok_or_else(|| {
                    PortError::Transport("eth_requestAccounts: array expected".to_owned())
                })?;
                let accounts = arr
                    .iter()
                    .map(value_to_address)
                    .collect::<Result<Vec<_>, _>>()?;
                let mut g = self.lock()?;
                g.accounts = accounts;
                g.connected = true;
                Ok(())
            }
            WalletMode::Deterministic => {
                self.lock()?.connected = true;
                Ok(())
            }
        }
    }

    async fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError> {
        let mut g = self.lock()?;
        Ok(std::mem::take(&mut g.events))
    }

    async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<B256, PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => {
                let result = bridge
                    .request(
                        "eth_sendTransaction",
                        serde_json::json!([{
                            "from": from.to_string(),
                            "to": to.to_string(),
                            "data": format!("0x{}", alloy::hex::encode(&data)),
                        }]),
                    )
                    .await?;
                let raw = result.as_str().ok_or_else(|| {
                    PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
                })?;
                raw.parse()
                    .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
            }
            WalletMode::Deterministic => {
                let g = self.lock()?;
                if g.fail_send {
                    return Err(PortError::Transport("wallet rejected transaction".to_owned()));
                }
                let canonical = serde_json::json!({
                    "from": from.to_string(),
                    "to": to.to_string(),
                    "data": format!("0x{}", alloy::hex::encode(&data)),
                });
                Ok(keccak256(canonical.to_string().as_bytes()))
            }
        }
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: B256,
        confirmations: u64,
    ) -> Result<(), PortError> {
        match &self.mode {
            WalletMode::Bridge(bridge) => {
                for _ in 0..self.max_polls {
                    if let Some(included_at) = self.bridge_receipt_block(bridge, tx_hash).await? {
                        let head = bridge
                            .request("eth_blockNumber", serde_json::json!([]))
                            .await
                            .and_then(|v| value_to_u64(&v))?;
                        if head + 1 >= included_at + confirmations {
                            return Ok(());
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(self.poll_interval_ms)).await;
                }
                Err(PortError::Transport(format!(
                    "confirmation timed out for {tx_hash}"
                )))
            }
            WalletMode::Deterministic => {
                if self.lock()?.fail_confirmation {
                    return Err(PortError::Transport(format!(
                        "confirmation timed out for {tx_hash}"
                    )));
                }
                Ok(())
            }
        }
    }
}

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::state_machine::ConnectionPhase;

/// Map key under which the native-currency balance is stored.
pub const NATIVE_BALANCE_KEY: &str = "ether";

/// Which side currently backs the active read client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    Injected,
    Fallback,
}

/// Identifier resolved through the ABI registry when building contract calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Token,
    Multicall,
    ProxyRegistry,
    Pool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: String,
}

impl NetworkInfo {
    pub fn for_chain(chain_id: u64) -> Self {
        let name = match chain_id {
            1 => "mainnet",
            42 => "kovan",
            _ => "unknown",
        };
        Self {
            chain_id,
            name: name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub symbol: String,
    pub address: Address,
}

/// Static session configuration: the single supported chain, the fixed
/// fallback endpoints, and the contract addresses the manager talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub supported_chain_id: u64,
    pub fallback_urls: BTreeMap<u64, String>,
    pub tokens: Vec<TokenEntry>,
    pub multicall: Address,
    pub proxy_registry: Address,
    pub confirmations: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut fallback_urls = BTreeMap::new();
        fallback_urls.insert(1, "https://cloudflare-eth.com".to_owned());
        fallback_urls.insert(42, "https://kovan.poa.network".to_owned());
        Self {
            supported_chain_id: 1,
            fallback_urls,
            tokens: Vec::new(),
            multicall: Address::ZERO,
            proxy_registry: Address::ZERO,
            confirmations: 1,
        }
    }
}

impl SessionConfig {
    /// Fallback endpoint keyed by the single supported chain id.
    pub fn fallback_endpoint(&self) -> Option<&str> {
        self.fallback_urls
            .get(&self.supported_chain_id)
            .map(String::as_str)
    }
}

/// The shared connection record. Created empty at session start and mutated
/// only through the manager's transition operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub wallet_connected: bool,
    pub wallet_chain_id: Option<u64>,
    pub account: Option<Address>,
    pub display_name: Option<String>,
    pub active: bool,
    pub active_provider: Option<ProviderKind>,
    /// Checksummed token address (or [`NATIVE_BALANCE_KEY`]) to 18-decimal amount.
    pub token_balances: BTreeMap<String, f64>,
    pub proxy_address: Option<Address>,
}

impl ConnectionState {
    /// Reset the connection fields to their empty/inactive defaults. Balances
    /// and the proxy address are kept, matching the failure mutations of the
    /// session store this record models.
    pub fn clear_connection(&mut self) {
        self.wallet_connected = false;
        self.wallet_chain_id = None;
        self.account = None;
        self.display_name = None;
        self.active = false;
        self.active_provider = None;
    }
}

/// Operations that report request/success/failure outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    LoadWeb3,
    LoadProvider,
    LoadFallbackProvider,
    LookupAddress,
    ResolveName,
    SendTransaction,
    GetBalances,
    GetProxies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEventKind {
    ChainChanged,
    AccountsChanged,
    Close,
    NetworkChanged,
}

/// Wallet bridge events normalized into typed messages, dispatched to the
/// manager's single event handler instead of ad-hoc listener callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    ChainChanged,
    AccountsChanged(Vec<Address>),
    Close,
    NetworkChanged,
}

impl WalletEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            Self::ChainChanged => WalletEventKind::ChainChanged,
            Self::AccountsChanged(_) => WalletEventKind::AccountsChanged,
            Self::Close => WalletEventKind::Close,
            Self::NetworkChanged => WalletEventKind::NetworkChanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    Request(Op),
    Success(Op),
    Failure(Op, String),
    WalletEvent(WalletEventKind),
}

/// Ordered record of every operation outcome and wallet event observed over
/// the session, for observability and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn record(&mut self, notification: Notification) {
        tracing::debug!(?notification, "session notification");
        self.entries.push(notification);
    }

    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    pub fn requests(&self, op: Op) -> usize {
        self.count(|n| matches!(n, Notification::Request(o) if *o == op))
    }

    pub fn successes(&self, op: Op) -> usize {
        self.count(|n| matches!(n, Notification::Success(o) if *o == op))
    }

    pub fn failures(&self, op: Op) -> usize {
        self.count(|n| matches!(n, Notification::Failure(o, _) if *o == op))
    }

    fn count(&self, predicate: impl Fn(&Notification) -> bool) -> usize {
        self.entries.iter().filter(|n| predicate(n)).count()
    }
}

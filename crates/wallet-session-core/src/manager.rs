use std::collections::BTreeMap;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{utils::format_ether, Address, U256};

use crate::domain::{
    ConnectionState, ContractKind, Notification, NotificationLog, Op, ProviderKind, SessionConfig,
    WalletEvent, NATIVE_BALANCE_KEY,
};
use crate::error::SessionError;
use crate::ports::{
    AbiRegistryPort, ClientPort, FallbackClientPort, PoolDataPort, WalletProviderPort,
};
use crate::state_machine::{connection_transition, ConnectionAction};

/// Owns the connection record and drives every state transition. All ports
/// are injected; the manager itself performs no I/O beyond them. Operations
/// take `&mut self`, so overlapping triggers serialize instead of observing
/// each other's partial writes.
pub struct ConnectionManager<W, F, A, P>
where
    W: WalletProviderPort,
    F: FallbackClientPort,
    A: AbiRegistryPort,
    P: PoolDataPort,
{
    pub wallet: W,
    pub fallback: F,
    pub abi: A,
    pub pools: P,
    config: SessionConfig,
    state: ConnectionState,
    log: NotificationLog,
}

impl<W, F, A, P> ConnectionManager<W, F, A, P>
where
    W: WalletProviderPort,
    F: FallbackClientPort,
    A: AbiRegistryPort,
    P: PoolDataPort,
{
    pub fn new(wallet: W, fallback: F, abi: A, pools: P, config: SessionConfig) -> Self {
        Self {
            wallet,
            fallback,
            abi,
            pools,
            config,
            state: ConnectionState::default(),
            log: NotificationLog::default(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }

    /// Trigger the wallet bridge's connection flow (may prompt wallet UI),
    /// then run the full load sequence. A failed flow propagates with no
    /// state change.
    pub async fn login(&mut self) -> Result<(), SessionError> {
        self.wallet
            .request_connection()
            .await
            .map_err(|e| SessionError::Connection(format!("wallet connection flow failed: {e}")))?;
        self.load_web3().await
    }

    /// Full load sequence: provider, then account data, then the fallback
    /// hand-off when the injected chain is not the supported one. Any step
    /// failing aborts the sequence.
    pub async fn load_web3(&mut self) -> Result<(), SessionError> {
        self.notify(Notification::Request(Op::LoadWeb3));
        match self.load_web3_inner().await {
            Ok(()) => {
                self.notify(Notification::Success(Op::LoadWeb3));
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::Failure(Op::LoadWeb3, e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_web3_inner(&mut self) -> Result<(), SessionError> {
        self.load_provider().await?;
        self.load_account_data().await?;
        if self.state.wallet_chain_id != Some(self.config.supported_chain_id) {
            self.load_fallback_provider().await?;
        } else {
            tracing::info!(
                chain_id = self.config.supported_chain_id,
                "injected provider active"
            );
        }
        Ok(())
    }

    /// Read network and accounts from the injected wallet and activate it.
    /// Failure clears the connection fields and leaves the session inactive.
    pub async fn load_provider(&mut self) -> Result<(), SessionError> {
        self.notify(Notification::Request(Op::LoadProvider));
        self.advance(ConnectionAction::BeginWalletConnect)?;
        match self.load_provider_inner().await {
            Ok(()) => {
                self.advance(ConnectionAction::WalletConnectSucceeded)?;
                self.notify(Notification::Success(Op::LoadProvider));
                Ok(())
            }
            Err(e) => {
                self.state.clear_connection();
                self.advance(ConnectionAction::ConnectFailed)?;
                self.notify(Notification::Failure(Op::LoadProvider, e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_provider_inner(&mut self) -> Result<(), SessionError> {
        let network = self.wallet.network().await.map_err(|e| {
            SessionError::Connection(format!("injected network read failed: {e}"))
        })?;
        let accounts = self.wallet.accounts().await.map_err(|e| {
            SessionError::Connection(format!("injected account list failed: {e}"))
        })?;
        let account = accounts.first().copied();
        let display_name = match account {
            Some(address) => self.lookup_wallet_name(address).await,
            None => None,
        };

        self.state.wallet_connected = true;
        self.state.wallet_chain_id = Some(network.chain_id);
        self.state.account = account;
        self.state.display_name = display_name;
        self.state.active = true;
        self.state.active_provider = Some(ProviderKind::Injected);
        Ok(())
    }

    /// Connect the read-only client to the fixed endpoint for the supported
    /// chain. On success the fallback becomes the active client with no
    /// account; on failure every connection field is cleared.
    pub async fn load_fallback_provider(&mut self) -> Result<(), SessionError> {
        self.notify(Notification::Request(Op::LoadFallbackProvider));
        self.advance(ConnectionAction::BeginFallback)?;
        match self.load_fallback_inner().await {
            Ok(()) => {
                self.advance(ConnectionAction::FallbackSucceeded)?;
                self.notify(Notification::Success(Op::LoadFallbackProvider));
                Ok(())
            }
            Err(e) => {
                self.state.clear_connection();
                self.advance(ConnectionAction::ConnectFailed)?;
                self.notify(Notification::Failure(Op::LoadFallbackProvider, e.to_string()));
                Err(e)
            }
        }
    }

    async fn load_fallback_inner(&mut self) -> Result<(), SessionError> {
        let endpoint = self.config.fallback_endpoint().ok_or_else(|| {
            SessionError::Connection(format!(
                "no fallback endpoint configured for chain {}",
                self.config.supported_chain_id
            ))
        })?;
        self.fallback
            .connect(endpoint)
            .await
            .map_err(|e| SessionError::Connection(format!("fallback connect failed: {e}")))?;
        let network = self
            .fallback
            .network()
            .await
            .map_err(|e| SessionError::Connection(format!("fallback network read failed: {e}")))?;
        tracing::info!(chain_id = network.chain_id, "fallback provider connected");

        self.state.account = None;
        self.state.display_name = None;
        self.state.active = true;
        self.state.active_provider = Some(ProviderKind::Fallback);
        Ok(())
    }

    /// Dispatch one normalized wallet event. A non-empty account change only
    /// refreshes the account and its data; everything else (including an
    /// empty account list) re-runs the full load sequence when the session
    /// is active.
    pub async fn handle_wallet_event(&mut self, event: WalletEvent) -> Result<(), SessionError> {
        self.notify(Notification::WalletEvent(event.kind()));
        match event {
            WalletEvent::AccountsChanged(accounts) if !accounts.is_empty() => {
                self.state.account = accounts.first().copied();
                self.load_account_data().await
            }
            _ => {
                if self.state.active {
                    self.load_web3().await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Drain queued wallet events and dispatch them in order. Events arriving
    /// while an operation is in flight queue behind it; they are never
    /// handled re-entrantly.
    pub async fn pump_events(&mut self) -> Result<(), SessionError> {
        let events = self
            .wallet
            .drain_events()
            .await
            .map_err(|e| SessionError::Connection(format!("event drain failed: {e}")))?;
        for event in events {
            self.handle_wallet_event(event).await?;
        }
        Ok(())
    }

    /// Reverse name lookup on the active client. The sole operation that
    /// swallows its failure: errors are logged and `None` is returned.
    pub async fn lookup_address(&mut self, address: Address) -> Option<String> {
        self.notify(Notification::Request(Op::LookupAddress));
        let result = match self.active_client() {
            Ok(client) => client
                .lookup_address(address)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(name) => {
                self.notify(Notification::Success(Op::LookupAddress));
                Some(name)
            }
            Err(message) => {
                tracing::warn!(%address, error = %message, "reverse name lookup failed");
                self.notify(Notification::Failure(Op::LookupAddress, message));
                None
            }
        }
    }

    /// Forward name resolution on the active client; failures are logged and
    /// propagated.
    pub async fn resolve_name(&mut self, name: &str) -> Result<Address, SessionError> {
        self.notify(Notification::Request(Op::ResolveName));
        let result = match self.active_client() {
            Ok(client) => client.resolve_name(name).await.map_err(|e| {
                SessionError::NameResolution(format!("resolving '{name}' failed: {e}"))
            }),
            Err(e) => Err(e),
        };
        match result {
            Ok(address) => {
                self.notify(Notification::Success(Op::ResolveName));
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "name resolution failed");
                self.notify(Notification::Failure(Op::ResolveName, e.to_string()));
                Err(e)
            }
        }
    }

    /// Encode `method(params)` for the contract kind, submit it through the
    /// wallet signer, and report success only once the transaction is
    /// confirmed on chain.
    pub async fn send_transaction(
        &mut self,
        kind: ContractKind,
        contract_address: Address,
        method: &str,
        params: &[DynSolValue],
    ) -> Result<(), SessionError> {
        self.notify(Notification::Request(Op::SendTransaction));
        match self
            .send_transaction_inner(kind, contract_address, method, params)
            .await
        {
            Ok(()) => {
                self.notify(Notification::Success(Op::SendTransaction));
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::Failure(Op::SendTransaction, e.to_string()));
                Err(e)
            }
        }
    }

    async fn send_transaction_inner(
        &mut self,
        kind: ContractKind,
        contract_address: Address,
        method: &str,
        params: &[DynSolValue],
    ) -> Result<(), SessionError> {
        if self.state.active_provider != Some(ProviderKind::Injected) {
            return Err(SessionError::Transaction(
                "no signer: injected provider is not active".to_owned(),
            ));
        }
        let from = self
            .state
            .account
            .ok_or_else(|| SessionError::Transaction("no signer account available".to_owned()))?;
        let data = self
            .abi
            .encode_call(kind, method, params)
            .map_err(|e| SessionError::Transaction(format!("calldata encoding failed: {e}")))?;
        let tx_hash = self
            .wallet
            .send_transaction(from, contract_address, data)
            .await
            .map_err(|e| SessionError::Transaction(format!("submission failed: {e}")))?;
        self.wallet
            .wait_for_confirmation(tx_hash, self.config.confirmations)
            .await
            .map_err(|e| {
                SessionError::Transaction(format!("confirmation wait failed for {tx_hash}: {e}"))
            })?;
        tracing::info!(%tx_hash, ?kind, method, "transaction confirmed");
        Ok(())
    }

    /// Load balances, pool positions, pool shares, and the proxy address for
    /// the current account as one joined wait. Results are committed to the
    /// state only after every fetch succeeds, so a single failure fails the
    /// whole operation without partial writes.
    pub async fn load_account_data(&mut self) -> Result<(), SessionError> {
        let account = self
            .state
            .account
            .ok_or_else(|| SessionError::AccountData("no account to load data for".to_owned()))?;
        self.notify(Notification::Request(Op::GetBalances));
        self.notify(Notification::Request(Op::GetProxies));

        let joined = match self.active_client() {
            Ok(client) => {
                tokio::try_join!(
                    fetch_balances(&self.abi, client, &self.config, account),
                    fetch_proxy(&self.abi, client, &self.config, account),
                    async {
                        self.pools.load_pool_positions(account).await.map_err(|e| {
                            SessionError::AccountData(format!("pool positions failed: {e}"))
                        })
                    },
                    async {
                        self.pools.load_pool_shares(account).await.map_err(|e| {
                            SessionError::AccountData(format!("pool shares failed: {e}"))
                        })
                    },
                )
            }
            Err(e) => Err(e),
        };

        match joined {
            Ok((balances, proxy, (), ())) => {
                self.state.token_balances = balances;
                self.state.proxy_address = Some(proxy);
                self.notify(Notification::Success(Op::GetBalances));
                self.notify(Notification::Success(Op::GetProxies));
                Ok(())
            }
            Err(e) => {
                match &e {
                    SessionError::BalanceQuery(_) => {
                        self.notify(Notification::Failure(Op::GetBalances, e.to_string()));
                    }
                    SessionError::ProxyQuery(_) => {
                        self.notify(Notification::Failure(Op::GetProxies, e.to_string()));
                    }
                    _ => {}
                }
                Err(e)
            }
        }
    }

    /// Batched balance refresh on its own, outside the joined account load.
    pub async fn get_balances(&mut self) -> Result<(), SessionError> {
        let account = self
            .state
            .account
            .ok_or_else(|| SessionError::BalanceQuery("no account for balance query".to_owned()))?;
        self.notify(Notification::Request(Op::GetBalances));
        let result = match self.active_client() {
            Ok(client) => fetch_balances(&self.abi, client, &self.config, account).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(balances) => {
                self.state.token_balances = balances;
                self.notify(Notification::Success(Op::GetBalances));
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::Failure(Op::GetBalances, e.to_string()));
                Err(e)
            }
        }
    }

    /// Query the proxy registry for the proxy contract owned by the current
    /// account.
    pub async fn get_proxies(&mut self) -> Result<(), SessionError> {
        let account = self
            .state
            .account
            .ok_or_else(|| SessionError::ProxyQuery("no account for proxy query".to_owned()))?;
        self.notify(Notification::Request(Op::GetProxies));
        let result = match self.active_client() {
            Ok(client) => fetch_proxy(&self.abi, client, &self.config, account).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(proxy) => {
                self.state.proxy_address = Some(proxy);
                self.notify(Notification::Success(Op::GetProxies));
                Ok(())
            }
            Err(e) => {
                self.notify(Notification::Failure(Op::GetProxies, e.to_string()));
                Err(e)
            }
        }
    }

    fn active_client(&self) -> Result<&dyn ClientPort, SessionError> {
        if !self.state.active {
            return Err(SessionError::Connection(
                "no active provider client".to_owned(),
            ));
        }
        match self.state.active_provider {
            Some(ProviderKind::Injected) => Ok(&self.wallet),
            Some(ProviderKind::Fallback) => Ok(&self.fallback),
            None => Err(SessionError::Connection(
                "no active provider client".to_owned(),
            )),
        }
    }

    /// Reverse lookup during provider load, against the wallet client
    /// directly since nothing is active yet. Failures are swallowed.
    async fn lookup_wallet_name(&mut self, address: Address) -> Option<String> {
        self.notify(Notification::Request(Op::LookupAddress));
        match self.wallet.lookup_address(address).await {
            Ok(name) => {
                self.notify(Notification::Success(Op::LookupAddress));
                Some(name)
            }
            Err(e) => {
                tracing::warn!(%address, error = %e, "reverse name lookup failed");
                self.notify(Notification::Failure(Op::LookupAddress, e.to_string()));
                None
            }
        }
    }

    fn advance(&mut self, action: ConnectionAction) -> Result<(), SessionError> {
        let (next, transition) = connection_transition(self.state.phase, action)?;
        tracing::debug!(from = ?transition.from, to = ?transition.to, "connection phase transition");
        self.state.phase = next;
        Ok(())
    }

    fn notify(&mut self, notification: Notification) {
        self.log.record(notification);
    }
}

/// One batched multicall across every configured token plus the native
/// balance. Returns checksummed-address keys and 18-decimal amounts.
async fn fetch_balances<A: AbiRegistryPort>(
    abi: &A,
    client: &dyn ClientPort,
    config: &SessionConfig,
    account: Address,
) -> Result<BTreeMap<String, f64>, SessionError> {
    let mut calls = Vec::with_capacity(config.tokens.len());
    for token in &config.tokens {
        let data = abi
            .encode_call(
                ContractKind::Token,
                "balanceOf",
                &[DynSolValue::Address(account)],
            )
            .map_err(|e| SessionError::BalanceQuery(format!("balanceOf encoding failed: {e}")))?;
        calls.push(DynSolValue::Tuple(vec![
            DynSolValue::Address(token.address),
            DynSolValue::Bytes(data.to_vec()),
        ]));
    }
    let aggregate_data = abi
        .encode_call(
            ContractKind::Multicall,
            "aggregate",
            &[DynSolValue::Array(calls)],
        )
        .map_err(|e| SessionError::BalanceQuery(format!("aggregate encoding failed: {e}")))?;
    let native_data = abi
        .encode_call(
            ContractKind::Multicall,
            "getEthBalance",
            &[DynSolValue::Address(account)],
        )
        .map_err(|e| SessionError::BalanceQuery(format!("getEthBalance encoding failed: {e}")))?;

    let (aggregate_raw, native_raw) = tokio::try_join!(
        client.call(config.multicall, aggregate_data),
        client.call(config.multicall, native_data),
    )
    .map_err(|e| SessionError::BalanceQuery(format!("batched call failed: {e}")))?;

    let mut balances = BTreeMap::new();
    let native = decode_uint(abi, ContractKind::Multicall, "getEthBalance", &native_raw)?;
    balances.insert(NATIVE_BALANCE_KEY.to_owned(), to_decimal(native)?);

    let decoded = abi
        .decode_output(ContractKind::Multicall, "aggregate", &aggregate_raw)
        .map_err(|e| SessionError::BalanceQuery(format!("aggregate decode failed: {e}")))?;
    let returns = decoded
        .get(1)
        .and_then(DynSolValue::as_array)
        .ok_or_else(|| SessionError::BalanceQuery("aggregate returned no data array".to_owned()))?;
    if returns.len() != config.tokens.len() {
        return Err(SessionError::BalanceQuery(format!(
            "aggregate return count mismatch: expected {}, got {}",
            config.tokens.len(),
            returns.len()
        )));
    }
    for (token, blob) in config.tokens.iter().zip(returns) {
        let raw = blob.as_bytes().ok_or_else(|| {
            SessionError::BalanceQuery("aggregate return entry is not bytes".to_owned())
        })?;
        let amount = decode_uint(abi, ContractKind::Token, "balanceOf", raw)?;
        balances.insert(token.address.to_checksum(None), to_decimal(amount)?);
    }
    Ok(balances)
}

async fn fetch_proxy<A: AbiRegistryPort>(
    abi: &A,
    client: &dyn ClientPort,
    config: &SessionConfig,
    account: Address,
) -> Result<Address, SessionError> {
    let data = abi
        .encode_call(
            ContractKind::ProxyRegistry,
            "proxies",
            &[DynSolValue::Address(account)],
        )
        .map_err(|e| SessionError::ProxyQuery(format!("proxies encoding failed: {e}")))?;
    let raw = client
        .call(config.proxy_registry, data)
        .await
        .map_err(|e| SessionError::ProxyQuery(format!("registry call failed: {e}")))?;
    let decoded = abi
        .decode_output(ContractKind::ProxyRegistry, "proxies", &raw)
        .map_err(|e| SessionError::ProxyQuery(format!("proxies decode failed: {e}")))?;
    decoded
        .first()
        .and_then(DynSolValue::as_address)
        .ok_or_else(|| SessionError::ProxyQuery("registry returned no address".to_owned()))
}

fn decode_uint<A: AbiRegistryPort>(
    abi: &A,
    kind: ContractKind,
    method: &str,
    data: &[u8],
) -> Result<U256, SessionError> {
    let decoded = abi
        .decode_output(kind, method, data)
        .map_err(|e| SessionError::BalanceQuery(format!("{method} decode failed: {e}")))?;
    decoded
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| SessionError::BalanceQuery(format!("{method} returned no uint")))
}

/// Base units to decimal via the uniform 18-decimal convention.
fn to_decimal(amount: U256) -> Result<f64, SessionError> {
    format_ether(amount)
        .parse::<f64>()
        .map_err(|e| SessionError::BalanceQuery(format!("non-numeric balance: {e}")))
}

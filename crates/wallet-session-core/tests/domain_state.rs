use alloy::primitives::{address, Address};
use wallet_session_core::{
    ConnectionState, NetworkInfo, Notification, NotificationLog, Op, ProviderKind, SessionConfig,
    WalletEvent, WalletEventKind,
};

#[test]
fn state_starts_empty_and_inactive() {
    let state = ConnectionState::default();
    assert!(!state.wallet_connected);
    assert!(!state.active);
    assert_eq!(state.account, None);
    assert_eq!(state.active_provider, None);
    assert!(state.token_balances.is_empty());
    assert_eq!(state.proxy_address, None);
}

#[test]
fn clear_connection_keeps_cached_account_data() {
    let mut state = ConnectionState {
        wallet_connected: true,
        wallet_chain_id: Some(1),
        account: Some(address!("1000000000000000000000000000000000000001")),
        display_name: Some("tester.eth".to_owned()),
        active: true,
        active_provider: Some(ProviderKind::Injected),
        proxy_address: Some(address!("2000000000000000000000000000000000000002")),
        ..ConnectionState::default()
    };
    state.token_balances.insert("ether".to_owned(), 1.5);

    state.clear_connection();

    assert!(!state.wallet_connected);
    assert_eq!(state.wallet_chain_id, None);
    assert_eq!(state.account, None);
    assert_eq!(state.display_name, None);
    assert!(!state.active);
    assert_eq!(state.active_provider, None);
    assert_eq!(state.token_balances.get("ether"), Some(&1.5));
    assert!(state.proxy_address.is_some());
}

#[test]
fn default_config_targets_mainnet_with_fixed_fallbacks() {
    let config = SessionConfig::default();
    assert_eq!(config.supported_chain_id, 1);
    assert_eq!(config.confirmations, 1);
    assert_eq!(
        config.fallback_endpoint(),
        Some("https://cloudflare-eth.com")
    );
    assert_eq!(
        config.fallback_urls.get(&42).map(String::as_str),
        Some("https://kovan.poa.network")
    );
}

#[test]
fn fallback_endpoint_missing_for_unconfigured_chain() {
    let config = SessionConfig {
        supported_chain_id: 5,
        ..SessionConfig::default()
    };
    assert_eq!(config.fallback_endpoint(), None);
}

#[test]
fn network_names_for_known_chains() {
    assert_eq!(NetworkInfo::for_chain(1).name, "mainnet");
    assert_eq!(NetworkInfo::for_chain(42).name, "kovan");
    assert_eq!(NetworkInfo::for_chain(1337).name, "unknown");
}

#[test]
fn wallet_event_kinds() {
    assert_eq!(WalletEvent::ChainChanged.kind(), WalletEventKind::ChainChanged);
    assert_eq!(
        WalletEvent::AccountsChanged(vec![Address::ZERO]).kind(),
        WalletEventKind::AccountsChanged
    );
    assert_eq!(WalletEvent::Close.kind(), WalletEventKind::Close);
    assert_eq!(
        WalletEvent::NetworkChanged.kind(),
        WalletEventKind::NetworkChanged
    );
}

#[test]
fn notification_log_counts_by_op() {
    let mut log = NotificationLog::default();
    log.record(Notification::Request(Op::GetBalances));
    log.record(Notification::Success(Op::GetBalances));
    log.record(Notification::Request(Op::GetProxies));
    log.record(Notification::Failure(Op::GetProxies, "boom".to_owned()));
    log.record(Notification::WalletEvent(WalletEventKind::Close));

    assert_eq!(log.entries().len(), 5);
    assert_eq!(log.requests(Op::GetBalances), 1);
    assert_eq!(log.successes(Op::GetBalances), 1);
    assert_eq!(log.failures(Op::GetBalances), 0);
    assert_eq!(log.requests(Op::GetProxies), 1);
    assert_eq!(log.successes(Op::GetProxies), 0);
    assert_eq!(log.failures(Op::GetProxies), 1);
}

#[test]
fn state_round_trips_through_serde() {
    let mut state = ConnectionState::default();
    state.wallet_connected = true;
    state.wallet_chain_id = Some(42);
    state.active = true;
    state.active_provider = Some(ProviderKind::Fallback);
    state
        .token_balances
        .insert("ether".to_owned(), 0.25);

    let json = serde_json::to_string(&state).unwrap();
    let back: ConnectionState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

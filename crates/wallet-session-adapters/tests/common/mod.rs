#![allow(dead_code)]

use std::collections::BTreeMap;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{address, Address, Bytes, U256};

use wallet_session_adapters::{
    AbiRegistryAdapter, FallbackRpcAdapter, InjectedWalletAdapter, PoolDataAdapter,
};
use wallet_session_core::{
    AbiRegistryPort, ConnectionManager, ContractKind, SessionConfig, TokenEntry,
};

pub type TestManager =
    ConnectionManager<InjectedWalletAdapter, FallbackRpcAdapter, AbiRegistryAdapter, PoolDataAdapter>;

pub const ACCOUNT: Address = address!("1000000000000000000000000000000000000001");
pub const OTHER_ACCOUNT: Address = address!("1000000000000000000000000000000000000002");
pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
pub const MKR: Address = address!("9f8f72aa9304c8b593d555f12ef6589cc3a579a2");
pub const MULTICALL: Address = address!("eefba1e63905ef1d7acba5a8513c70307c1ce441");
pub const PROXY_REGISTRY: Address = address!("4678f0a6958e4d2bc4f1baf7bc52e8f3564f3fe4");
pub const PROXY: Address = address!("5000000000000000000000000000000000000005");

pub const ONE_AND_A_HALF_ETHER: u64 = 1_500_000_000_000_000_000;
pub const QUARTER_ETHER: u64 = 250_000_000_000_000_000;
pub const HALF_ETHER: u64 = 500_000_000_000_000_000;

pub fn test_config() -> SessionConfig {
    SessionConfig {
        tokens: vec![
            TokenEntry {
                symbol: "DAI".to_owned(),
                address: DAI,
            },
            TokenEntry {
                symbol: "MKR".to_owned(),
                address: MKR,
            },
        ],
        multicall: MULTICALL,
        proxy_registry: PROXY_REGISTRY,
        ..SessionConfig::default()
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn manager() -> TestManager {
    init_tracing();
    ConnectionManager::new(
        InjectedWalletAdapter::default(),
        FallbackRpcAdapter::deterministic(1),
        AbiRegistryAdapter::default(),
        PoolDataAdapter::default(),
        test_config(),
    )
}

pub fn uint_word(value: U256) -> Bytes {
    Bytes::from(DynSolValue::Uint(value, 256).abi_encode())
}

pub fn address_word(address: Address) -> Bytes {
    Bytes::from(DynSolValue::Address(address).abi_encode())
}

/// Calldata/result pairs covering one full account-data refresh.
pub struct CannedAccountData {
    pub calls: BTreeMap<Vec<u8>, Bytes>,
}

pub fn account_data_responses(
    abi: &AbiRegistryAdapter,
    config: &SessionConfig,
    account: Address,
    native_wei: U256,
    token_wei: &[U256],
    proxy: Address,
) -> CannedAccountData {
    let mut aggregate_calls = Vec::with_capacity(config.tokens.len());
    for token in &config.tokens {
        let data = abi
            .encode_call(
                ContractKind::Token,
                "balanceOf",
                &[DynSolValue::Address(account)],
            )
            .unwrap();
        aggregate_calls.push(DynSolValue::Tuple(vec![
            DynSolValue::Address(token.address),
            DynSolValue::Bytes(data.to_vec()),
        ]));
    }
    let aggregate_data = abi
        .encode_call(
            ContractKind::Multicall,
            "aggregate",
            &[DynSolValue::Array(aggregate_calls)],
        )
        .unwrap();
    let return_data = token_wei
        .iter()
        .map(|wei| DynSolValue::Bytes(uint_word(*wei).to_vec()))
        .collect::<Vec<_>>();
    let aggregate_result = Bytes::from(
        DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(19_000_000u64), 256),
            DynSolValue::Array(return_data),
        ])
        .abi_encode_params(),
    );

    let native_data = abi
        .encode_call(
            ContractKind::Multicall,
            "getEthBalance",
            &[DynSolValue::Address(account)],
        )
        .unwrap();
    let proxy_data = abi
        .encode_call(
            ContractKind::ProxyRegistry,
            "proxies",
            &[DynSolValue::Address(account)],
        )
        .unwrap();

    let mut calls = BTreeMap::new();
    calls.insert(aggregate_data.to_vec(), aggregate_result);
    calls.insert(native_data.to_vec(), uint_word(native_wei));
    calls.insert(proxy_data.to_vec(), address_word(proxy));
    CannedAccountData { calls }
}

pub fn prime_wallet(manager: &TestManager, canned: &CannedAccountData) {
    for (data, result) in &canned.calls {
        manager
            .wallet
            .debug_set_call_result(Bytes::from(data.clone()), result.clone())
            .unwrap();
    }
}

pub fn prime_fallback(manager: &TestManager, canned: &CannedAccountData) {
    for (data, result) in &canned.calls {
        manager
            .fallback
            .debug_set_call_result(Bytes::from(data.clone()), result.clone())
            .unwrap();
    }
}

/// Single-threaded JSON-RPC stub. Answers every request with
/// `handler(method, params)` until the test process exits.
pub fn spawn_rpc_server<H>(handler: H) -> String
where
    H: Fn(&str, &serde_json::Value) -> serde_json::Value + Send + 'static,
{
    use std::io::Read;

    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    std::thread::spawn(move || {
        for mut request in server.incoming_requests() {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let payload: serde_json::Value =
                serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
            let method = payload["method"].as_str().unwrap_or_default();
            let result = handler(method, &payload["params"]);
            let response = serde_json::json!({
                "jsonrpc": "2.0",
                "id": payload["id"],
                "result": result,
            });
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .unwrap();
            let _ = request.respond(
                tiny_http::Response::from_string(response.to_string()).with_header(header),
            );
        }
    });
    url
}

pub fn hex_bytes(data: &[u8]) -> String {
    format!("0x{}", alloy::hex::encode(data))
}

/// Wallet on the supported chain with the default account and canned
/// account-data responses installed.
pub fn primed_manager() -> TestManager {
    let m = manager();
    let canned = account_data_responses(
        &m.abi,
        m.config(),
        ACCOUNT,
        U256::from(ONE_AND_A_HALF_ETHER),
        &[U256::from(QUARTER_ETHER), U256::from(HALF_ETHER)],
        PROXY,
    );
    prime_wallet(&m, &canned);
    m
}
